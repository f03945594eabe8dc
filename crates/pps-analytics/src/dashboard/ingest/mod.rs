//! Client-side validation of CSV uploads, and offline loading of patient
//! records from survey export files.

use crate::dashboard::domain::PatientRecord;
use std::io::Read;
use std::path::Path;

/// The five datasets the backend accepts via `/api/v1/upload/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadDataset {
    Patients,
    Antibiotics,
    Indications,
    OptionalVars,
    Specimens,
}

impl UploadDataset {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Patients,
            Self::Antibiotics,
            Self::Indications,
            Self::OptionalVars,
            Self::Specimens,
        ]
    }

    /// URL segment used both by our upload route and the backend's.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Antibiotics => "antibiotics",
            Self::Indications => "indications",
            Self::OptionalVars => "optional-vars",
            Self::Specimens => "specimens",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Antibiotics => "antibiotics",
            Self::Indications => "indications",
            Self::OptionalVars => "optional variables",
            Self::Specimens => "specimens",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|d| d.slug() == slug)
    }

    /// Columns that must be present before a file is worth forwarding.
    /// Survey exports carry many more; these identify the dataset.
    const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Patients => &["id", "region", "district", "facility", "ward_name"],
            Self::Antibiotics => &["id", "parent_key", "antibiotic_inn_name"],
            Self::Indications => &["id", "parent_key", "indication_type"],
            Self::OptionalVars => &["id", "parent_key"],
            Self::Specimens => &["id", "parent_key", "specimen_type"],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("'{filename}' is not a CSV file; only .csv uploads are accepted")]
    NotCsv { filename: String },
    #[error("{dataset} CSV is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        dataset: &'static str,
        columns: Vec<String>,
    },
    #[error("{dataset} CSV contains no data rows")]
    Empty { dataset: &'static str },
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a validated upload, reported back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSummary {
    pub dataset: UploadDataset,
    pub rows: usize,
}

/// Validate an upload before it is forwarded to the backend: the filename
/// must end in `.csv`, the contents must parse, the dataset's identifying
/// columns must be present, and at least one data row must exist.
pub fn validate_upload(
    dataset: UploadDataset,
    filename: &str,
    contents: &[u8],
) -> Result<CsvSummary, IngestError> {
    if !has_csv_extension(filename) {
        return Err(IngestError::NotCsv {
            filename: filename.to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = dataset
        .required_columns()
        .iter()
        .filter(|required| !headers.iter().any(|header| header == **required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            dataset: dataset.label(),
            columns: missing,
        });
    }

    let mut rows = 0;
    for record in reader.records() {
        record?;
        rows += 1;
    }
    if rows == 0 {
        return Err(IngestError::Empty {
            dataset: dataset.label(),
        });
    }

    Ok(CsvSummary { dataset, rows })
}

fn has_csv_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Deserialize a patients CSV into full records so the engine can run
/// offline from a survey export file.
pub fn patients_from_reader<R: Read>(reader: R) -> Result<Vec<PatientRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut patients = Vec::new();
    for record in csv_reader.deserialize::<PatientRecord>() {
        patients.push(record?);
    }
    Ok(patients)
}

pub fn patients_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<PatientRecord>, IngestError> {
    let file = std::fs::File::open(path)?;
    patients_from_reader(file)
}
