//! Typed client for the PPS REST backend the dashboard consumes.

mod client;
mod metrics;

pub use client::{BackendError, DashboardBundle, PpsBackendClient, UploadError, LOAD_FAILURE_BANNER};
pub use metrics::{
    AntibioticStatsSummary, AwareBucket, AwareSummary, IndicatorSummary, MetricReport, PpsMetric,
    SpecimenStatsSummary,
};
