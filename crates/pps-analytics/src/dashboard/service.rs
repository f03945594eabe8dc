//! Application service for the dashboard: owns the record store and upload
//! gateway behind traits so the HTTP layer, the CLI and tests can share the
//! same orchestration.

use crate::dashboard::backend::UploadError;
use crate::dashboard::domain::PatientRecord;
use crate::dashboard::export::{
    DashboardSnapshot, ExportArtifact, ExportError, ExportFormat, ExportPipeline,
};
use crate::dashboard::filters::{self, FilterOptions, FilterSelection};
use crate::dashboard::ingest::{self, IngestError, UploadDataset};
use crate::dashboard::stats::AggregateStats;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("patient store is unavailable: {0}")]
    Unavailable(String),
}

/// The in-memory patient dataset the engine filters over.
pub trait PatientStore: Send + Sync {
    fn all(&self) -> Result<Vec<PatientRecord>, StoreError>;
    fn replace(&self, patients: Vec<PatientRecord>) -> Result<(), StoreError>;
}

/// Where validated uploads go, and where fresh records come from afterwards.
pub trait BackendGateway: Send + Sync {
    fn forward_upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        contents: Vec<u8>,
    ) -> impl Future<Output = Result<String, UploadError>> + Send;

    /// Re-fetch the patient dataset after a confirmed upload. `Ok(None)`
    /// means the gateway has no fresh copy to offer and the store keeps what
    /// it has.
    fn refresh_patients(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<PatientRecord>>, UploadError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// The backend's confirmation message.
    pub message: String,
    /// Data rows counted during client-side validation.
    pub rows: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub struct DashboardService<S, U> {
    store: Arc<S>,
    gateway: Arc<U>,
    exports: ExportPipeline,
}

impl<S, U> DashboardService<S, U>
where
    S: PatientStore,
    U: BackendGateway,
{
    pub fn new(store: Arc<S>, gateway: Arc<U>) -> Self {
        Self {
            store,
            gateway,
            exports: ExportPipeline::default(),
        }
    }

    /// Dropdown options narrowed by the current selection.
    pub fn options(&self, selection: &FilterSelection) -> Result<FilterOptions, DashboardServiceError> {
        let patients = self.store.all()?;
        Ok(FilterOptions::derive(&patients, selection))
    }

    /// Aggregate statistics over the records passing the selection.
    pub fn stats(&self, selection: &FilterSelection) -> Result<AggregateStats, DashboardServiceError> {
        let patients = self.store.all()?;
        Ok(AggregateStats::for_selection(&patients, selection))
    }

    pub fn snapshot(&self, selection: &FilterSelection) -> Result<DashboardSnapshot, DashboardServiceError> {
        let patients = self.store.all()?;
        Ok(DashboardSnapshot::capture(
            &patients,
            selection,
            Utc::now().date_naive(),
        ))
    }

    pub async fn export(
        &self,
        format: ExportFormat,
        selection: &FilterSelection,
    ) -> Result<ExportArtifact, DashboardServiceError> {
        let snapshot = self.snapshot(selection)?;
        Ok(self.exports.export(format, &snapshot).await?)
    }

    /// Validate a CSV locally, forward it, then refresh the store once the
    /// backend has confirmed ingestion.
    pub async fn upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, DashboardServiceError> {
        let summary = ingest::validate_upload(dataset, filename, &contents)?;
        let message = self
            .gateway
            .forward_upload(dataset, filename, contents)
            .await?;

        match self.gateway.refresh_patients().await {
            Ok(Some(patients)) => {
                let count = patients.len();
                self.store.replace(patients)?;
                tracing::info!(dataset = dataset.slug(), patients = count, "store refreshed after upload");
            }
            Ok(None) => {}
            // The upload itself succeeded; a failed refresh only means the
            // view is stale until the next load.
            Err(err) => {
                tracing::warn!(error = %err, "post-upload refresh failed, keeping existing records");
            }
        }

        Ok(UploadOutcome {
            message,
            rows: summary.rows,
        })
    }

    /// Records currently passing the selection, for report rendering.
    pub fn filtered(&self, selection: &FilterSelection) -> Result<Vec<PatientRecord>, DashboardServiceError> {
        let patients = self.store.all()?;
        Ok(patients
            .into_iter()
            .filter(|patient| filters::matches(patient, selection))
            .collect())
    }
}
