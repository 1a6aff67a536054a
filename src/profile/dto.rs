use serde::{Deserialize, Serialize};

use super::model::{
    BloodTestMeta, BodyMeasurements, DerivedMetrics, Illness, PersonalDetails, UserProfile,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illnesses: Option<Vec<Illness>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// Partial profile: absent keys leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyMeasurements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical: Option<MedicalPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_test: Option<BloodTestMeta>,
}

impl ProfilePatch {
    /// Fields a brand-new profile must carry.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let personal = self.personal.as_ref();
        let mut missing = Vec::new();
        if personal.and_then(|p| p.first_name.as_deref()).map_or(true, |s| s.trim().is_empty()) {
            missing.push("personal.first_name");
        }
        if personal.and_then(|p| p.birth_date).is_none() {
            missing.push("personal.birth_date");
        }
        if personal.and_then(|p| p.sex).is_none() {
            missing.push("personal.sex");
        }
        missing
    }

    /// Overwrites only the keys present in the patch, nested objects key by key.
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(p) = self.personal {
            let dst = &mut profile.personal;
            if p.first_name.is_some() {
                dst.first_name = p.first_name;
            }
            if p.last_name.is_some() {
                dst.last_name = p.last_name;
            }
            if p.birth_date.is_some() {
                dst.birth_date = p.birth_date;
            }
            if p.sex.is_some() {
                dst.sex = p.sex;
            }
        }
        if let Some(b) = self.body {
            let dst = &mut profile.body;
            if b.height_cm.is_some() {
                dst.height_cm = b.height_cm;
            }
            if b.weight_kg.is_some() {
                dst.weight_kg = b.weight_kg;
            }
            if b.waist_cm.is_some() {
                dst.waist_cm = b.waist_cm;
            }
        }
        if let Some(allergies) = self.allergies {
            profile.allergies = allergies;
        }
        if let Some(m) = self.medical {
            if let Some(illnesses) = m.illnesses {
                profile.medical.illnesses = illnesses;
            }
            if m.other.is_some() {
                profile.medical.other = m.other;
            }
        }
        if self.blood_test.is_some() {
            profile.blood_test = self.blood_test;
        }
    }
}

/// Stored profile plus the derived metrics.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub metrics: DerivedMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::model::{Severity, Sex};
    use time::macros::{date, datetime};

    #[test]
    fn missing_required_lists_absent_personal_fields() {
        let patch = ProfilePatch::default();
        assert_eq!(
            patch.missing_required(),
            vec!["personal.first_name", "personal.birth_date", "personal.sex"]
        );

        let patch = ProfilePatch {
            personal: Some(PersonalDetails {
                first_name: Some("Ana".into()),
                last_name: None,
                birth_date: Some(date!(1995 - 01 - 02)),
                sex: Some(Sex::Female),
            }),
            ..Default::default()
        };
        assert!(patch.missing_required().is_empty());
    }

    #[test]
    fn apply_overwrites_only_present_keys() {
        let mut profile = UserProfile::new("ana", datetime!(2024-01-01 0:00 UTC));
        profile.personal.first_name = Some("Ana".into());
        profile.personal.last_name = Some("Lima".into());
        profile.body.height_cm = Some(165.0);
        profile.body.weight_kg = Some(60.0);
        profile.allergies = vec!["peanut".into()];
        profile.medical.other = Some("seasonal rhinitis".into());

        let patch: ProfilePatch = serde_json::from_value(serde_json::json!({
            "personal": { "last_name": "Souza" },
            "body": { "weight_kg": 62.5 },
            "medical": { "illnesses": [{ "name": "Asthma", "severity": "mild" }] }
        }))
        .unwrap();
        patch.apply_to(&mut profile);

        assert_eq!(profile.personal.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.personal.last_name.as_deref(), Some("Souza"));
        assert_eq!(profile.body.height_cm, Some(165.0));
        assert_eq!(profile.body.weight_kg, Some(62.5));
        assert_eq!(profile.allergies, vec!["peanut".to_string()]);
        assert_eq!(profile.medical.illnesses[0].severity, Severity::Mild);
        assert_eq!(profile.medical.other.as_deref(), Some("seasonal rhinitis"));
    }
}
