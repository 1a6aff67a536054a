//! Body metrics derived from stored measurements.

use serde::{Deserialize, Serialize};
use time::Date;

/// Body Mass Index, kg / m². `None` for non-positive inputs.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let m = height_cm / 100.0;
    Some(weight_kg / (m * m))
}

/// Waist-to-height ratio, both in centimetres.
pub fn whtr(waist_cm: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 || waist_cm <= 0.0 {
        return None;
    }
    Some(waist_cm / height_cm)
}

/// Completed years between `birth` and `today`; zero for future dates.
pub fn age_on(birth: Date, today: Date) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month() as u8, today.day()) < (birth.month() as u8, birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        match bmi {
            b if b < 18.5 => BmiCategory::Underweight,
            b if b < 25.0 => BmiCategory::Normal,
            b if b < 30.0 => BmiCategory::Overweight,
            _ => BmiCategory::Obese,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn bmi_reference_value() {
        let v = bmi(170.0, 70.0).unwrap();
        assert_eq!(round_to(v, 1), 24.2);
        assert_eq!(BmiCategory::from_bmi(v), BmiCategory::Normal);
    }

    #[test]
    fn bmi_rejects_zero_height() {
        assert_eq!(bmi(0.0, 70.0), None);
        assert_eq!(bmi(170.0, -1.0), None);
    }

    #[test]
    fn whtr_reference_value() {
        assert_eq!(round_to(whtr(85.0, 170.0).unwrap(), 2), 0.5);
        assert_eq!(whtr(85.0, 0.0), None);
    }

    #[test]
    fn bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn age_counts_completed_years() {
        let birth = date!(1990 - 06 - 15);
        assert_eq!(age_on(birth, date!(2020 - 06 - 14)), 29);
        assert_eq!(age_on(birth, date!(2020 - 06 - 15)), 30);
        assert_eq!(age_on(birth, date!(1980 - 01 - 01)), 0);
    }
}
