use super::{DashboardSnapshot, ExportArtifact, ExportError, SnapshotRenderer};
use serde::Serialize;

/// Machine-readable export: the full filtered view plus the filter state and
/// statistics that produced it, pretty-printed for humans who open it anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonPayload<'a> {
    patients: &'a [super::PatientRow],
    filters: &'a crate::dashboard::filters::FilterSelection,
    statistics: &'a crate::dashboard::stats::AggregateStats,
    export_date: String,
}

impl SnapshotRenderer for JsonRenderer {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError> {
        if snapshot.patients.is_empty() {
            return Err(ExportError::Empty);
        }

        let payload = JsonPayload {
            patients: &snapshot.patients,
            filters: &snapshot.filters,
            statistics: &snapshot.stats,
            export_date: snapshot.report_date.format("%Y-%m-%d").to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&payload)?;

        Ok(ExportArtifact {
            filename: snapshot.filename("Dashboard_Data", "json"),
            content_type: "application/json",
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::domain::PatientRecord;
    use crate::dashboard::filters::{FilterAction, FilterSelection, Selector};
    use chrono::NaiveDate;

    #[test]
    fn payload_carries_patients_filters_and_statistics() {
        let patients = vec![PatientRecord {
            patient_code: "P-1".to_string(),
            region: "Central".to_string(),
            patient_on_antibiotic: "yes".to_string(),
            ..PatientRecord::default()
        }];
        let selection =
            FilterSelection::default().apply(FilterAction::SetRegion(Selector::only("Central")));
        let snapshot = DashboardSnapshot::capture(
            &patients,
            &selection,
            NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
        );

        let artifact = JsonRenderer.render(&snapshot).expect("renders");
        let value: serde_json::Value = serde_json::from_slice(&artifact.bytes).expect("valid json");

        assert_eq!(value["export_date"], "2024-07-01");
        assert_eq!(value["filters"]["region"], "Central");
        assert_eq!(value["statistics"]["total_patients"], 1);
        assert_eq!(value["patients"][0]["patient_code"], "P-1");
        assert_eq!(artifact.filename, "PPS_Dashboard_Data_2024-07-01.json");
    }
}
