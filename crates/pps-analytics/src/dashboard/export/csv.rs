use super::{naive_csv_escape, DashboardSnapshot, ExportArtifact, ExportError, SnapshotRenderer};

const HEADER: &[&str] = &[
    "Patient Code",
    "Region",
    "District",
    "Subcounty",
    "Facility",
    "Ward",
    "On Antibiotic",
    "Survey Date",
];

/// Writes the filtered patient table as CSV. Quoting is deliberately the
/// dashboard's historical rule (quote only on embedded commas) so exports
/// stay byte-identical to what analysts already have on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl SnapshotRenderer for CsvRenderer {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError> {
        if snapshot.patients.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut lines = Vec::with_capacity(snapshot.patients.len() + 1);
        lines.push(HEADER.join(","));
        for row in &snapshot.patients {
            let survey_date = row
                .survey_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let fields = [
                row.patient_code.as_str(),
                row.region.as_str(),
                row.district.as_str(),
                row.subcounty.as_str(),
                row.facility.as_str(),
                row.ward_name.as_str(),
                row.on_antibiotic.as_str(),
                survey_date.as_str(),
            ];
            lines.push(
                fields
                    .iter()
                    .map(|field| naive_csv_escape(field))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        let mut body = lines.join("\n");
        body.push('\n');

        Ok(ExportArtifact {
            filename: snapshot.filename("Patient_Data", "csv"),
            content_type: "text/csv",
            bytes: body.into_bytes(),
        })
    }
}
