//! Wire types for the backend's precomputed statistics and indicator
//! endpoints. The upstream payloads are ad hoc JSON; every field here is
//! optional or defaulted so a partial payload decodes instead of trusting
//! the shape implicitly, and unrecognized keys are retained rather than
//! dropped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassCount {
    pub class: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationCount {
    pub classification: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteCount {
    pub route: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyCount {
    pub frequency: String,
    pub count: u64,
}

/// `/api/v1/antibiotics/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntibioticStatsSummary {
    pub total_antibiotics: u64,
    pub by_class: Vec<ClassCount>,
    pub by_classification: Vec<ClassificationCount>,
    pub by_route: Vec<RouteCount>,
    pub by_frequency: Vec<FrequencyCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultCount {
    pub result: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroorganismCount {
    pub microorganism: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenotypeCount {
    pub resistant_phenotype: String,
    pub count: u64,
}

/// `/api/v1/specimens/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecimenStatsSummary {
    pub total_specimens: u64,
    pub by_type: Vec<TypeCount>,
    pub by_result: Vec<ResultCount>,
    pub by_microorganism: Vec<MicroorganismCount>,
    pub by_resistant_phenotype: Vec<PhenotypeCount>,
}

/// One WHO AWaRe bucket from `/api/v1/pps/aware-categorization`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwareBucket {
    pub count: u64,
    pub description: Option<String>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwareSummary {
    pub access: AwareBucket,
    pub watch: AwareBucket,
    pub reserve: AwareBucket,
    pub unclassified: AwareBucket,
    pub total_antibiotics: u64,
}

/// The named PPS indicator endpoints under `/api/v1/pps/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpsMetric {
    Basic,
    Culture,
    Diagnosis,
    Generic,
    Guideline,
    LongStayPatients,
    MissedDose,
    OralSwitch,
    Prescriber,
    Injectable,
}

impl PpsMetric {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Basic,
            Self::Culture,
            Self::Diagnosis,
            Self::Generic,
            Self::Guideline,
            Self::LongStayPatients,
            Self::MissedDose,
            Self::OralSwitch,
            Self::Prescriber,
            Self::Injectable,
        ]
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::Basic => "/api/v1/pps/basic-metrics",
            Self::Culture => "/api/v1/pps/culture-metrics",
            Self::Diagnosis => "/api/v1/pps/diagnosis-metrics",
            Self::Generic => "/api/v1/pps/generic-metrics",
            Self::Guideline => "/api/v1/pps/guideline-metrics",
            Self::LongStayPatients => "/api/v1/pps/long-stay-patients",
            Self::MissedDose => "/api/v1/pps/missed-dose-metrics",
            Self::OralSwitch => "/api/v1/pps/oral-switch-metrics",
            Self::Prescriber => "/api/v1/pps/prescriber-metrics",
            Self::Injectable => "/api/v1/pps/injectable-metrics",
        }
    }
}

/// Best-effort typed view of one indicator payload: the fields the dashboard
/// cards read, plus everything else the endpoint happened to send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricReport {
    pub title: Option<String>,
    pub description: Option<String>,
    pub numerator: Option<f64>,
    pub denominator: Option<f64>,
    pub percentage: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `/api/v1/pps/indicators`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSummary {
    pub indicators: Vec<MetricReport>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antibiotic_stats_decode_from_backend_shape() {
        let raw = r#"{
            "total_antibiotics": 12,
            "by_class": [{"class": "Cephalosporins", "count": 7}],
            "by_classification": [{"classification": "Watch", "count": 9}],
            "by_route": [{"route": "IV", "count": 10}],
            "by_frequency": [{"frequency": "BD", "count": 4}]
        }"#;
        let stats: AntibioticStatsSummary = serde_json::from_str(raw).expect("decodes");
        assert_eq!(stats.total_antibiotics, 12);
        assert_eq!(stats.by_class[0].class, "Cephalosporins");
    }

    #[test]
    fn specimen_type_field_uses_the_reserved_word() {
        let raw = r#"{"total_specimens": 2, "by_type": [{"type": "Blood", "count": 2}]}"#;
        let stats: SpecimenStatsSummary = serde_json::from_str(raw).expect("decodes");
        assert_eq!(stats.by_type[0].kind, "Blood");
        assert!(stats.by_result.is_empty());
    }

    #[test]
    fn metric_reports_keep_unknown_keys() {
        let raw = r#"{"percentage": 42.5, "hospital_count": 7}"#;
        let report: MetricReport = serde_json::from_str(raw).expect("decodes");
        assert_eq!(report.percentage, Some(42.5));
        assert_eq!(
            report.extra.get("hospital_count").and_then(|v| v.as_u64()),
            Some(7)
        );
    }

    #[test]
    fn every_metric_has_a_distinct_path() {
        let paths: std::collections::HashSet<_> =
            PpsMetric::ordered().into_iter().map(|m| m.path()).collect();
        assert_eq!(paths.len(), PpsMetric::ordered().len());
    }
}
