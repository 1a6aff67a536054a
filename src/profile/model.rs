use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::metrics::{age_on, bmi, round_to, whtr, BmiCategory};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist_cm: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Illness {
    pub name: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalData {
    #[serde(default)]
    pub illnesses: Vec<Illness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloodTestStatus {
    Pending,
    Analyzed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodTestMeta {
    pub filename: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub status: BloodTestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
    /// Keys of the parts after the first in a multi-file upload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_file_keys: Vec<String>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
}

impl BloodTestMeta {
    pub fn stored_keys(&self) -> impl Iterator<Item = &str> {
        self.file_key
            .iter()
            .chain(self.extra_file_keys.iter())
            .map(String::as_str)
    }
}

/// Consolidated profile document, one per username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub personal: PersonalDetails,
    #[serde(default)]
    pub body: BodyMeasurements,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical: MedicalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_test: Option<BloodTestMeta>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Values computed from the stored fields at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whtr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi_category: Option<BmiCategory>,
}

/// What the AI consultation is told about the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub illnesses: Vec<Illness>,
    #[serde(default)]
    pub other: Option<String>,
}

impl UserProfile {
    pub fn new(username: &str, now: OffsetDateTime) -> Self {
        Self {
            username: username.to_string(),
            personal: PersonalDetails::default(),
            body: BodyMeasurements::default(),
            allergies: Vec::new(),
            medical: MedicalData::default(),
            blood_test: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derived(&self, today: Date) -> DerivedMetrics {
        let bmi_raw = match (self.body.height_cm, self.body.weight_kg) {
            (Some(h), Some(w)) => bmi(h, w),
            _ => None,
        };
        let whtr_raw = match (self.body.waist_cm, self.body.height_cm) {
            (Some(waist), Some(h)) => whtr(waist, h),
            _ => None,
        };
        DerivedMetrics {
            age: self.personal.birth_date.map(|b| age_on(b, today)),
            bmi: bmi_raw.map(|v| round_to(v, 1)),
            whtr: whtr_raw.map(|v| round_to(v, 2)),
            bmi_category: bmi_raw.map(BmiCategory::from_bmi),
        }
    }

    pub fn summary(&self, today: Date) -> ProfileSummary {
        let derived = self.derived(today);
        ProfileSummary {
            age: derived.age,
            sex: self.personal.sex,
            bmi: derived.bmi,
            allergies: self.allergies.clone(),
            illnesses: self.medical.illnesses.clone(),
            other: self.medical.other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn sample() -> UserProfile {
        let mut p = UserProfile::new("alice", datetime!(2024-01-01 0:00 UTC));
        p.personal.birth_date = Some(date!(1990 - 03 - 10));
        p.personal.sex = Some(Sex::Female);
        p.body = BodyMeasurements {
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            waist_cm: Some(80.0),
        };
        p.medical.illnesses.push(Illness {
            name: "Hypertension".into(),
            severity: Severity::Moderate,
        });
        p
    }

    #[test]
    fn derived_metrics_from_measurements() {
        let d = sample().derived(date!(2024 - 03 - 09));
        assert_eq!(d.age, Some(33));
        assert_eq!(d.bmi, Some(24.2));
        assert_eq!(d.whtr, Some(0.47));
        assert_eq!(d.bmi_category, Some(BmiCategory::Normal));
    }

    #[test]
    fn derived_metrics_missing_inputs() {
        let p = UserProfile::new("bob", datetime!(2024-01-01 0:00 UTC));
        let d = p.derived(date!(2024 - 01 - 01));
        assert_eq!(d, DerivedMetrics { age: None, bmi: None, whtr: None, bmi_category: None });
    }

    #[test]
    fn birth_date_serializes_as_plain_date() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["personal"]["birth_date"], "1990-03-10");
        assert_eq!(json["medical"]["illnesses"][0]["severity"], "moderate");
        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn summary_carries_illnesses_and_age() {
        let s = sample().summary(date!(2024 - 06 - 01));
        assert_eq!(s.age, Some(34));
        assert_eq!(s.illnesses.len(), 1);
        assert_eq!(s.sex, Some(Sex::Female));
    }

    #[test]
    fn stored_keys_lists_every_part() {
        let meta = BloodTestMeta {
            filename: "page1.png".into(),
            uploaded_at: datetime!(2024-01-01 0:00 UTC),
            status: BloodTestStatus::Analyzed,
            file_key: Some("blood-tests/alice/a.png".into()),
            extra_file_keys: vec!["blood-tests/alice/b.png".into()],
            diagnoses: Vec::new(),
        };
        let keys: Vec<&str> = meta.stored_keys().collect();
        assert_eq!(keys, vec!["blood-tests/alice/a.png", "blood-tests/alice/b.png"]);

        let legacy: BloodTestMeta = serde_json::from_value(serde_json::json!({
            "filename": "r.pdf",
            "uploaded_at": "2024-01-01T00:00:00Z",
            "status": "failed"
        }))
        .unwrap();
        assert_eq!(legacy.stored_keys().count(), 0);
    }
}
