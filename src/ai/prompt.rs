use std::fmt::Write;

use crate::profile::model::{ProfileSummary, Severity, Sex};

const GUARDRAILS: &str = "\
You are a nutrition assistant helping a shopper decide what suits their health profile.
Never name a specific disease or diagnosis in your answer; speak about nutrients and general health only.
Reply with a single JSON object and nothing else: no prose, no markdown.";

fn sex_label(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "male",
        Sex::Female => "female",
        Sex::Other => "other",
    }
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::Mild => "mild",
        Severity::Moderate => "moderate",
        Severity::Severe => "severe",
    }
}

/// One line per known fact; unknown facts are left out.
pub fn describe_profile(p: &ProfileSummary) -> String {
    let mut out = String::from("User profile:\n");
    if let Some(age) = p.age {
        let _ = writeln!(out, "- age: {age}");
    }
    if let Some(sex) = p.sex {
        let _ = writeln!(out, "- sex: {}", sex_label(sex));
    }
    if let Some(bmi) = p.bmi {
        let _ = writeln!(out, "- BMI: {bmi:.1}");
    }
    if !p.allergies.is_empty() {
        let _ = writeln!(out, "- allergies: {}", p.allergies.join(", "));
    }
    if !p.illnesses.is_empty() {
        let list: Vec<String> = p
            .illnesses
            .iter()
            .map(|i| format!("{} ({})", i.name, severity_label(i.severity)))
            .collect();
        let _ = writeln!(out, "- health conditions: {}", list.join(", "));
    }
    if let Some(other) = p.other.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "- notes: {}", other.trim());
    }
    out
}

pub fn single_product(profile: &ProfileSummary, product: &str) -> String {
    format!(
        "{GUARDRAILS}\n\n{}\nProduct: {product}\n\n\
         Answer with: {{\"allowed\": \"YES\" | \"NO\" | \"CAUTION\", \
         \"recommendation\": string, \"reason\": string, \"alternatives\": [string]}}",
        describe_profile(profile)
    )
}

pub fn shopping_cart(profile: &ProfileSummary, products: &[String]) -> String {
    let mut list = String::new();
    for name in products {
        let _ = writeln!(list, "- {name}");
    }
    format!(
        "{GUARDRAILS}\n\n{}\nShopping cart:\n{list}\n\
         Rate how well the whole shopping cart fits this profile from 0 to 100 and judge each item. \
         Answer with: {{\"score\": number, \"items\": [{{\"name\": string, \
         \"allowed\": \"YES\" | \"NO\" | \"CAUTION\", \"reason\": string}}]}}",
        describe_profile(profile)
    )
}
