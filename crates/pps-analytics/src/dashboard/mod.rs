//! The Point Prevalence Survey dashboard core: the in-memory patient record
//! set, the cascading filter engine, derived statistics, CSV ingest, the
//! backend API client, and the export pipeline.

pub mod backend;
pub mod domain;
pub mod export;
pub mod filters;
pub mod ingest;
pub mod router;
pub mod service;
pub mod stats;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, DashboardBundle, PpsBackendClient, UploadError};
pub use domain::{Antibiotic, Indication, OptionalVar, PatientRecord, Specimen};
pub use export::{
    DashboardSnapshot, ExportArtifact, ExportError, ExportFormat, ExportPipeline, SnapshotRenderer,
};
pub use filters::{FilterAction, FilterOptions, FilterSelection, Selector};
pub use ingest::{IngestError, UploadDataset};
pub use router::dashboard_router;
pub use service::{
    BackendGateway, DashboardService, DashboardServiceError, PatientStore, StoreError,
    UploadOutcome,
};
pub use stats::{AggregateStats, FacilityCount, RegionCount, WardCount};
