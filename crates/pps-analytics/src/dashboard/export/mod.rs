//! Export of the currently displayed view: a [`DashboardSnapshot`] captured
//! from the record store and filter state, rendered by a swappable
//! [`SnapshotRenderer`] backend.

mod csv;
mod json;
mod pdf;

pub use csv::CsvRenderer;
pub use json::JsonRenderer;
pub use pdf::{PdfRenderer, SimplePdfRenderer};

use crate::dashboard::domain::PatientRecord;
use crate::dashboard::filters::{self, FilterSelection};
use crate::dashboard::stats::AggregateStats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format '{other}' (expected csv, json, or pdf)")),
        }
    }
}

/// One patient row as it appears in exported tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRow {
    pub patient_code: String,
    pub region: String,
    pub district: String,
    pub subcounty: String,
    pub facility: String,
    pub ward_name: String,
    pub on_antibiotic: String,
    pub survey_date: Option<NaiveDate>,
}

impl PatientRow {
    fn from_record(record: &PatientRecord) -> Self {
        Self {
            patient_code: record.patient_code.clone(),
            region: record.region.clone(),
            district: record.district.clone(),
            subcounty: record.subcounty.clone(),
            facility: record.facility.clone(),
            ward_name: record.ward_name.clone(),
            on_antibiotic: record.patient_on_antibiotic.clone(),
            survey_date: record.survey_date,
        }
    }
}

/// Everything an export backend needs, decoupled from how the view was
/// rendered on screen.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub report_date: NaiveDate,
    pub filters: FilterSelection,
    pub stats: AggregateStats,
    pub patients: Vec<PatientRow>,
}

impl DashboardSnapshot {
    /// Capture the view for the given selection: passing records only,
    /// with their aggregate statistics.
    pub fn capture(
        patients: &[PatientRecord],
        selection: &FilterSelection,
        report_date: NaiveDate,
    ) -> Self {
        let passing: Vec<&PatientRecord> = patients
            .iter()
            .filter(|patient| filters::matches(patient, selection))
            .collect();

        Self {
            report_date,
            filters: selection.clone(),
            stats: AggregateStats::compute(passing.iter().copied()),
            patients: passing.iter().map(|p| PatientRow::from_record(p)).collect(),
        }
    }

    pub(crate) fn filename(&self, what: &str, extension: &str) -> String {
        format!("PPS_{}_{}.{}", what, self.report_date.format("%Y-%m-%d"), extension)
    }
}

/// A finished export, ready to download or write to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no data to export")]
    Empty,
    #[error("failed to serialize export payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
    #[error("export timed out after {0} seconds")]
    Timeout(u64),
    #[error("export worker failed: {0}")]
    Worker(String),
    #[error("export failed and the simplified fallback also failed: {source}. Try the simple text PDF option.")]
    FallbackFailed {
        #[source]
        source: Box<ExportError>,
    },
}

/// Render backend for one snapshot. Implementations must be pure with
/// respect to the snapshot: same input, same artifact.
pub trait SnapshotRenderer: Send + Sync {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError>;
}

/// Drives a renderer with a deadline and graceful degradation: if the full
/// PDF render fails or exceeds the deadline, a simplified text-only summary
/// is attempted before giving up.
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    timeout: Duration,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl ExportPipeline {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn export(
        &self,
        format: ExportFormat,
        snapshot: &DashboardSnapshot,
    ) -> Result<ExportArtifact, ExportError> {
        match format {
            ExportFormat::Csv => CsvRenderer.render(snapshot),
            ExportFormat::Json => JsonRenderer.render(snapshot),
            ExportFormat::Pdf => self.export_pdf(snapshot).await,
        }
    }

    async fn export_pdf(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError> {
        let owned = snapshot.clone();
        let deadline = self.timeout;
        let attempt = tokio::time::timeout(
            deadline,
            tokio::task::spawn_blocking(move || PdfRenderer::default().render(&owned)),
        )
        .await;

        let primary = match attempt {
            Err(_) => Err(ExportError::Timeout(deadline.as_secs())),
            Ok(Err(join)) => Err(ExportError::Worker(join.to_string())),
            Ok(Ok(result)) => result,
        };

        match primary {
            Ok(artifact) => Ok(artifact),
            Err(err) => {
                tracing::warn!(error = %err, "full PDF export failed, falling back to text summary");
                SimplePdfRenderer.render(snapshot).map_err(|fallback| {
                    ExportError::FallbackFailed {
                        source: Box::new(fallback),
                    }
                })
            }
        }
    }
}

/// Escape one CSV value the way the dashboard always has: double-quote only
/// when the value contains a comma.
pub(crate) fn naive_csv_escape(value: &str) -> String {
    if value.contains(',') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
