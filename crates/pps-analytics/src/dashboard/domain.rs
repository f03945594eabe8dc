use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row per surveyed patient, as served by the PPS backend.
///
/// Survey exports are sparse: outside the identifying columns almost any
/// field can be missing, so everything defaults. The geographic columns form
/// a hierarchy (region ⊇ district ⊇ subcounty ⊇ facility ⊇ ward) which the
/// backend does not enforce; the filter engine treats them as independent
/// categorical strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientRecord {
    pub id: String,
    #[serde(with = "survey_date")]
    pub survey_date: Option<NaiveDate>,
    pub region: String,
    pub district: String,
    pub subcounty: String,
    pub facility: String,
    pub level_of_care: String,
    pub ownership: String,
    pub ward_name: String,
    /// Literal "yes" / "no" from the survey form. Anything else counts as
    /// not-on-antibiotic when aggregating.
    pub patient_on_antibiotic: String,
    pub patient_initials: String,
    pub patient_code: String,
    pub gender: String,
    pub age_years: Option<f64>,
    pub admission_date: Option<String>,
    pub patient_number_antibiotics: Option<u32>,
    pub status: Option<String>,
    pub antibiotics: Vec<Antibiotic>,
    pub indications: Vec<Indication>,
    pub optional_vars: Vec<OptionalVar>,
    pub specimens: Vec<Specimen>,
}

impl PatientRecord {
    pub fn is_on_antibiotic(&self) -> bool {
        self.patient_on_antibiotic == "yes"
    }
}

/// Antibiotic prescribed to a patient, keyed back via `parent_key`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Antibiotic {
    pub id: String,
    pub antibiotic_inn_name: String,
    pub atc_code: String,
    pub antibiotic_class: String,
    pub antibiotic_aware_classification: String,
    pub administration_route: String,
    pub unit_dose_frequency: String,
    pub start_date_antibiotic: Option<String>,
    pub parent_key: String,
}

/// Diagnosis / indication child record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Indication {
    pub id: String,
    pub indication_type: String,
    pub diagnosis: String,
    pub start_date_treatment: Option<String>,
    pub culture_sample_taken: String,
    pub parent_key: String,
}

/// Optional clinical variables captured per patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptionalVar {
    pub id: String,
    pub prescriber_type: String,
    pub intravenous_type: String,
    pub oral_switch: String,
    pub number_missed_doses: Option<u32>,
    pub guidelines_compliance: String,
    pub treatment_type: String,
    pub parent_key: String,
}

/// Lab specimen child record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Specimen {
    pub id: String,
    pub specimen_type: String,
    pub culture_result: String,
    pub microorganism: String,
    pub resistant_phenotype: String,
    pub parent_key: String,
}

/// Parse a survey date, discarding any time-of-day component. Accepts RFC
/// 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` without offset, and plain
/// `YYYY-MM-DD`. Anything else is "no date".
pub fn parse_survey_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

mod survey_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_survey_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_dates_discard_time_of_day() {
        assert_eq!(
            parse_survey_date("2024-06-15T13:45:00Z"),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(
            parse_survey_date("2024-06-15T00:00:00"),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(
            parse_survey_date(" 2024-06-15 "),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(parse_survey_date(""), None);
        assert_eq!(parse_survey_date("yesterday"), None);
    }

    #[test]
    fn patient_parses_from_sparse_backend_payload() {
        let raw = r#"{
            "id": "p-1",
            "survey_date": "2024-01-03T08:30:00Z",
            "region": "Central",
            "facility": "Mulago NRH",
            "patient_on_antibiotic": "yes",
            "antibiotics": [{"id": "a-1", "antibiotic_inn_name": "Ceftriaxone", "parent_key": "p-1"}]
        }"#;

        let patient: PatientRecord = serde_json::from_str(raw).expect("payload parses");
        assert_eq!(patient.survey_date, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(patient.district, "");
        assert!(patient.is_on_antibiotic());
        assert_eq!(patient.antibiotics.len(), 1);
        assert_eq!(patient.antibiotics[0].parent_key, "p-1");
        assert!(patient.specimens.is_empty());
    }

    #[test]
    fn unknown_antibiotic_flag_is_not_on_antibiotic() {
        let patient = PatientRecord {
            patient_on_antibiotic: "unknown".to_string(),
            ..PatientRecord::default()
        };
        assert!(!patient.is_on_antibiotic());
    }
}
