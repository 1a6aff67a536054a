use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref BARCODE_RE: Regex = Regex::new(r"\b\d{12,14}\b").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptScan {
    pub barcodes: Vec<String>,
    pub raw_text_length: usize,
}

/// Runs of 12 to 14 digits (UPC-A, EAN-13, GTIN-14), first-seen order, no duplicates.
pub fn extract_barcodes(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in BARCODE_RE.find_iter(text) {
        let code = m.as_str();
        if !seen.iter().any(|s: &String| s == code) {
            seen.push(code.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_12_to_14_digit_runs() {
        let text = "036000291452 x1\n4006381333931 2\n10012345678902\n12345";
        assert_eq!(
            extract_barcodes(text),
            vec!["036000291452", "4006381333931", "10012345678902"]
        );
    }

    #[test]
    fn ignores_longer_runs_and_dedupes() {
        let text = "123456789012345\n4006381333931\n4006381333931";
        assert_eq!(extract_barcodes(text), vec!["4006381333931"]);
    }

    #[test]
    fn empty_text_gives_no_codes() {
        assert!(extract_barcodes("").is_empty());
    }
}
