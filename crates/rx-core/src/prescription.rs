//! The prescription record shape shared by extraction and storage.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder the extraction prompt asks the model to use for illegible fields.
pub const NOT_AVAILABLE: &str = "Not available";

/// A single prescribed medication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dosage: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_suggestion: Option<String>,
}

impl Medication {
    pub fn new(name: &str, dosage: &str, frequency: &str, duration: &str) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            duration: duration.into(),
            ..Self::default()
        }
    }

    /// Search text for a pharmacy lookup: the name, plus the dosage when legible.
    pub fn pharmacy_search_query(&self) -> Option<String> {
        let name = legible(&self.name)?;
        let query = match legible(&self.dosage) {
            Some(dosage) => format!("{} {}", name, dosage.split_whitespace().collect::<Vec<_>>().join(" ")),
            None => name.to_string(),
        };
        Some(query)
    }
}

/// A prescription as extracted from an image or stored as a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default, deserialize_with = "lenient_text")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub patient_age: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub patient_gender: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub doctor_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub doctor_license: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub prescription_date: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub medications: Vec<Medication>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_notes: String,
}

impl Prescription {
    /// The dummy record inserted by the database probe, dated `date`.
    pub fn verification_sample(date: NaiveDate) -> Self {
        Self {
            patient_name: "Test Patient".into(),
            patient_age: "30".into(),
            patient_gender: "Other".into(),
            doctor_name: "Dr. Test".into(),
            doctor_license: "TEST1234".into(),
            prescription_date: date.format("%Y-%m-%d").to_string(),
            medications: vec![Medication::new("TestMeds", "10mg", "Daily", "5 days")],
            additional_notes: "This is a test record from the verification script.".into(),
        }
    }

    /// Same as [`Prescription::verification_sample`], stamped with today's local date.
    pub fn verification_sample_today() -> Self {
        Self::verification_sample(chrono::Local::now().date_naive())
    }

    /// Fields the model left illegible or empty.
    pub fn unreadable_fields(&self) -> Vec<&'static str> {
        [
            ("patient_name", &self.patient_name),
            ("patient_age", &self.patient_age),
            ("patient_gender", &self.patient_gender),
            ("doctor_name", &self.doctor_name),
            ("doctor_license", &self.doctor_license),
            ("prescription_date", &self.prescription_date),
        ]
        .into_iter()
        .filter(|(_, v)| legible(v).is_none())
        .map(|(k, _)| k)
        .collect()
    }
}

fn legible(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return None;
    }
    Some(trimmed)
}

/// Accepts strings, numbers, booleans and null; models are not consistent about quoting.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Medication>, D::Error> {
    Ok(Option::<Vec<Medication>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sample_matches_dummy_row_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let row = serde_json::to_value(Prescription::verification_sample(date)).unwrap();

        assert_eq!(
            row,
            json!({
                "patient_name": "Test Patient",
                "patient_age": "30",
                "patient_gender": "Other",
                "doctor_name": "Dr. Test",
                "doctor_license": "TEST1234",
                "prescription_date": "2026-03-09",
                "medications": [
                    {"name": "TestMeds", "dosage": "10mg", "frequency": "Daily", "duration": "5 days"}
                ],
                "additional_notes": "This is a test record from the verification script."
            })
        );
    }

    #[test]
    fn today_sample_is_iso_dated() {
        let sample = Prescription::verification_sample_today();
        assert!(NaiveDate::parse_from_str(&sample.prescription_date, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn parses_model_output_with_numbers_and_nulls() {
        let raw = r#"{
            "patient_name": "Asha Rao",
            "patient_age": 42,
            "patient_gender": null,
            "doctor_name": "Dr. Mehta",
            "doctor_license": "Not available",
            "prescription_date": "2025-12-01",
            "medications": [
                {"name": "Amoxicillin", "dosage": "500 mg", "frequency": "TID", "duration": 5,
                 "safety_warning": "Take after food"}
            ],
            "additional_notes": "- Review after one week"
        }"#;

        let parsed: Prescription = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.patient_age, "42");
        assert_eq!(parsed.patient_gender, "");
        assert_eq!(parsed.medications[0].duration, "5");
        assert_eq!(parsed.medications[0].safety_warning.as_deref(), Some("Take after food"));
        assert_eq!(parsed.unreadable_fields(), vec!["patient_gender", "doctor_license"]);
    }

    #[test]
    fn missing_medications_default_to_empty() {
        let parsed: Prescription =
            serde_json::from_str(r#"{"patient_name": "X", "medications": null}"#).unwrap();
        assert!(parsed.medications.is_empty());
        assert_eq!(parsed.additional_notes, "");
    }

    #[test]
    fn pharmacy_query_skips_illegible_parts() {
        let med = Medication::new("Paracetamol", "500  mg", "BD", "3 days");
        assert_eq!(med.pharmacy_search_query().as_deref(), Some("Paracetamol 500 mg"));

        let no_dose = Medication::new("Cetirizine", NOT_AVAILABLE, "OD", "");
        assert_eq!(no_dose.pharmacy_search_query().as_deref(), Some("Cetirizine"));

        let unreadable = Medication::new("not available", "10mg", "", "");
        assert_eq!(unreadable.pharmacy_search_query(), None);
    }
}
