//! Keyword + threshold screening over OCR'd lab report text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Cholesterol,
    Glucose,
    Hba1c,
    Sodium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub marker: Marker,
    pub value: f64,
    pub threshold: f64,
    pub unit: String,
    pub exceeded: bool,
    pub label: String,
}

struct Rule {
    marker: Marker,
    pattern: &'static Regex,
    threshold: f64,
    inclusive: bool,
    unit: &'static str,
    label: &'static str,
    /// Matches whose preceding line text matches this are ignored.
    skip_prefix: Option<&'static Regex>,
}

pub const HIGH_CHOLESTEROL: &str = "High cholesterol";
pub const HIGH_BLOOD_SUGAR: &str = "Elevated blood sugar";
pub const HIGH_SODIUM: &str = "High sodium";

lazy_static! {
    static ref CHOLESTEROL_RE: Regex =
        Regex::new(r"(?i)\b(?:total\s+)?cholesterol\b[^0-9\n]*(\d+(?:[.,]\d+)?)").unwrap();
    static ref LIPOPROTEIN_PREFIX_RE: Regex =
        Regex::new(r"(?i)\b(?:non[\s-]*)?(?:hdl|ldl|vldl)[\s-]*$").unwrap();
    static ref GLUCOSE_RE: Regex =
        Regex::new(r"(?i)\bglucose\b[^0-9\n]*(\d+(?:[.,]\d+)?)").unwrap();
    static ref HBA1C_RE: Regex =
        Regex::new(r"(?i)\bhb\s*a1c\b[^0-9\n]*(\d+(?:[.,]\d+)?)").unwrap();
    static ref SODIUM_RE: Regex =
        Regex::new(r"\b(?:(?i:sodium)\b|Na\b\+?)[^0-9\n]*(\d+(?:[.,]\d+)?)").unwrap();
    static ref RULES: Vec<Rule> = vec![
        Rule {
            marker: Marker::Cholesterol,
            pattern: &CHOLESTEROL_RE,
            threshold: 200.0,
            inclusive: false,
            unit: "mg/dL",
            label: HIGH_CHOLESTEROL,
            skip_prefix: Some(&*LIPOPROTEIN_PREFIX_RE),
        },
        Rule {
            marker: Marker::Glucose,
            pattern: &GLUCOSE_RE,
            threshold: 125.0,
            inclusive: false,
            unit: "mg/dL",
            label: HIGH_BLOOD_SUGAR,
            skip_prefix: None,
        },
        Rule {
            marker: Marker::Hba1c,
            pattern: &HBA1C_RE,
            threshold: 6.5,
            inclusive: true,
            unit: "%",
            label: HIGH_BLOOD_SUGAR,
            skip_prefix: None,
        },
        Rule {
            marker: Marker::Sodium,
            pattern: &SODIUM_RE,
            threshold: 145.0,
            inclusive: false,
            unit: "mmol/L",
            label: HIGH_SODIUM,
            skip_prefix: None,
        },
    ];
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

/// First reading of `rule`'s marker, scanning line by line and match by match.
fn first_reading(rule: &Rule, text: &str) -> Option<f64> {
    text.lines().find_map(|line| {
        rule.pattern.captures_iter(line).find_map(|c| {
            let keyword = c.get(0)?;
            if rule
                .skip_prefix
                .is_some_and(|re| re.is_match(&line[..keyword.start()]))
            {
                return None;
            }
            c.get(1).and_then(|m| parse_number(m.as_str()))
        })
    })
}

/// One finding per marker present in the text.
pub fn evaluate(text: &str) -> Vec<Finding> {
    RULES
        .iter()
        .filter_map(|rule| {
            let value = first_reading(rule, text)?;
            let exceeded = if rule.inclusive {
                value >= rule.threshold
            } else {
                value > rule.threshold
            };
            Some(Finding {
                marker: rule.marker,
                value,
                threshold: rule.threshold,
                unit: rule.unit.to_string(),
                exceeded,
                label: rule.label.to_string(),
            })
        })
        .collect()
}

/// Distinct labels of exceeded findings, in rule order.
pub fn diagnoses(findings: &[Finding]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for f in findings.iter().filter(|f| f.exceeded) {
        if !out.contains(&f.label) {
            out.push(f.label.clone());
        }
    }
    out
}
