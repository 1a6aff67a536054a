//! Local state of the profile collection flow:
//! login → personal details → body measurements → allergies → medical.

use std::ops::RangeInclusive;

use time::Date;

use crate::profile::{
    dto::{MedicalPatch, ProfilePatch},
    model::{BloodTestMeta, BodyMeasurements, Illness, PersonalDetails},
};

pub const HEIGHT_CM: RangeInclusive<f64> = 50.0..=250.0;
pub const WEIGHT_KG: RangeInclusive<f64> = 20.0..=300.0;
pub const WAIST_CM: RangeInclusive<f64> = 40.0..=200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Login,
    Personal,
    Body,
    Allergies,
    Medical,
    Done,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("birth date cannot be in the future")]
    FutureBirthDate,
    #[error("complete the {0:?} step first")]
    StepLocked(WizardStep),
}

fn check_range(
    field: &'static str,
    value: Option<f64>,
    range: &RangeInclusive<f64>,
) -> Result<(), WizardError> {
    match value {
        Some(v) if !range.contains(&v) => Err(WizardError::OutOfRange {
            field,
            min: *range.start(),
            max: *range.end(),
            value: v,
        }),
        _ => Ok(()),
    }
}

/// Accumulates each screen's fields; resubmitting a step overwrites it.
#[derive(Debug, Clone, Default)]
pub struct ProfileWizard {
    username: Option<String>,
    personal: Option<PersonalDetails>,
    body: Option<BodyMeasurements>,
    allergies: Option<Vec<String>>,
    medical: Option<MedicalPatch>,
    blood_test: Option<BloodTestMeta>,
}

impl ProfileWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// First step not yet completed.
    pub fn step(&self) -> WizardStep {
        if self.username.is_none() {
            WizardStep::Login
        } else if self.personal.is_none() {
            WizardStep::Personal
        } else if self.body.is_none() {
            WizardStep::Body
        } else if self.allergies.is_none() {
            WizardStep::Allergies
        } else if self.medical.is_none() {
            WizardStep::Medical
        } else {
            WizardStep::Done
        }
    }

    fn unlock(&self, step: WizardStep) -> Result<(), WizardError> {
        let current = self.step();
        if step > current {
            Err(WizardError::StepLocked(current))
        } else {
            Ok(())
        }
    }

    pub fn logged_in(&mut self, username: &str) -> Result<(), WizardError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(WizardError::Missing("username"));
        }
        self.username = Some(username.to_string());
        Ok(())
    }

    pub fn personal(&mut self, details: PersonalDetails, today: Date) -> Result<(), WizardError> {
        self.unlock(WizardStep::Personal)?;
        if details.first_name.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(WizardError::Missing("first name"));
        }
        let birth = details.birth_date.ok_or(WizardError::Missing("birth date"))?;
        if birth > today {
            return Err(WizardError::FutureBirthDate);
        }
        if details.sex.is_none() {
            return Err(WizardError::Missing("sex"));
        }
        self.personal = Some(details);
        Ok(())
    }

    pub fn body(&mut self, body: BodyMeasurements) -> Result<(), WizardError> {
        self.unlock(WizardStep::Body)?;
        if body.height_cm.is_none() {
            return Err(WizardError::Missing("height"));
        }
        if body.weight_kg.is_none() {
            return Err(WizardError::Missing("weight"));
        }
        check_range("height", body.height_cm, &HEIGHT_CM)?;
        check_range("weight", body.weight_kg, &WEIGHT_KG)?;
        check_range("waist", body.waist_cm, &WAIST_CM)?;
        self.body = Some(body);
        Ok(())
    }

    pub fn allergies(&mut self, allergies: Vec<String>) -> Result<(), WizardError> {
        self.unlock(WizardStep::Allergies)?;
        let mut clean: Vec<String> = Vec::new();
        for a in allergies {
            let a = a.trim().to_string();
            if !a.is_empty() && !clean.contains(&a) {
                clean.push(a);
            }
        }
        self.allergies = Some(clean);
        Ok(())
    }

    /// Final screen: illness selection and, optionally, an analyzed blood test.
    pub fn medical(
        &mut self,
        illnesses: Vec<Illness>,
        other: Option<String>,
        blood_test: Option<BloodTestMeta>,
    ) -> Result<(), WizardError> {
        self.unlock(WizardStep::Medical)?;
        self.medical = Some(MedicalPatch {
            illnesses: Some(illnesses),
            other: other.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        });
        if blood_test.is_some() {
            self.blood_test = blood_test;
        }
        Ok(())
    }

    /// The single upsert payload sent when the flow completes.
    pub fn finish(&self) -> Result<ProfilePatch, WizardError> {
        let step = self.step();
        if step != WizardStep::Done {
            return Err(WizardError::StepLocked(step));
        }
        Ok(ProfilePatch {
            username: self.username.clone(),
            personal: self.personal.clone(),
            body: self.body.clone(),
            allergies: self.allergies.clone(),
            medical: self.medical.clone(),
            blood_test: self.blood_test.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::model::{Severity, Sex};
    use time::macros::date;

    const TODAY: Date = date!(2024 - 06 - 01);

    fn details() -> PersonalDetails {
        PersonalDetails {
            first_name: Some("Ana".into()),
            last_name: None,
            birth_date: Some(date!(1990 - 05 - 20)),
            sex: Some(Sex::Female),
        }
    }

    fn body(height: f64, weight: f64, waist: Option<f64>) -> BodyMeasurements {
        BodyMeasurements {
            height_cm: Some(height),
            weight_kg: Some(weight),
            waist_cm: waist,
        }
    }

    #[test]
    fn full_flow_produces_one_patch() {
        let mut w = ProfileWizard::new();
        w.logged_in("ana").unwrap();
        w.personal(details(), TODAY).unwrap();
        w.body(body(170.0, 70.0, Some(85.0))).unwrap();
        w.allergies(vec![" gluten ".into(), "gluten".into(), "".into()])
            .unwrap();
        w.medical(
            vec![Illness {
                name: "asthma".into(),
                severity: Severity::Mild,
            }],
            Some("  ".into()),
            None,
        )
        .unwrap();

        let patch = w.finish().unwrap();
        assert_eq!(patch.username.as_deref(), Some("ana"));
        assert_eq!(patch.allergies, Some(vec!["gluten".to_string()]));
        assert!(patch.missing_required().is_empty());
        let medical = patch.medical.unwrap();
        assert_eq!(medical.illnesses.unwrap().len(), 1);
        assert_eq!(medical.other, None);
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut w = ProfileWizard::new();
        assert_eq!(
            w.personal(details(), TODAY),
            Err(WizardError::StepLocked(WizardStep::Login))
        );
        w.logged_in("ana").unwrap();
        assert_eq!(
            w.allergies(vec![]),
            Err(WizardError::StepLocked(WizardStep::Personal))
        );
        assert_eq!(w.finish(), Err(WizardError::StepLocked(WizardStep::Personal)));
    }

    #[test]
    fn later_submission_wins() {
        let mut w = ProfileWizard::new();
        w.logged_in("ana").unwrap();
        w.personal(details(), TODAY).unwrap();
        w.body(body(170.0, 70.0, None)).unwrap();
        w.body(body(171.0, 68.5, None)).unwrap();
        w.allergies(vec![]).unwrap();
        w.medical(vec![], None, None).unwrap();
        let patch = w.finish().unwrap();
        assert_eq!(patch.body.unwrap().weight_kg, Some(68.5));
    }

    #[test]
    fn ranges_and_dates_are_checked() {
        let mut w = ProfileWizard::new();
        w.logged_in("ana").unwrap();

        let mut future = details();
        future.birth_date = Some(date!(2030 - 01 - 01));
        assert_eq!(w.personal(future, TODAY), Err(WizardError::FutureBirthDate));

        let mut nameless = details();
        nameless.first_name = Some(" ".into());
        assert_eq!(
            w.personal(nameless, TODAY),
            Err(WizardError::Missing("first name"))
        );

        w.personal(details(), TODAY).unwrap();
        assert!(matches!(
            w.body(body(30.0, 70.0, None)),
            Err(WizardError::OutOfRange { field: "height", .. })
        ));
        assert!(matches!(
            w.body(body(170.0, 70.0, Some(250.0))),
            Err(WizardError::OutOfRange { field: "waist", .. })
        ));
        assert!(w.body(body(250.0, 20.0, Some(40.0))).is_ok());
    }
}
