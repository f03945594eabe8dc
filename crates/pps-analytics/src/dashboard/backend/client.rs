use super::metrics::{
    AntibioticStatsSummary, AwareSummary, IndicatorSummary, MetricReport, PpsMetric,
    SpecimenStatsSummary,
};
use crate::dashboard::domain::PatientRecord;
use crate::dashboard::ingest::UploadDataset;
use crate::dashboard::service::BackendGateway;
use crate::dashboard::stats::AggregateStats;
use serde::Deserialize;
use std::future::Future;

/// The dashboard fetches every patient in one page and filters client-side;
/// this is the "all of it" limit the frontend has always sent.
const FETCH_ALL_LIMIT: &str = "999999";

/// Single generic banner for a failed initial load; the fan-in barrier never
/// reports per-request detail.
pub const LOAD_FAILURE_BANNER: &str =
    "Failed to load dashboard data. Please check your backend connection.";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request to PPS backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("PPS backend returned status {status} for {path}")]
    Status { path: String, status: u16 },
}

/// Upload failures keep the dashboard's `upload:`-prefixed banner taxonomy:
/// the HTTP status picks a heuristic hint, connection trouble gets its own
/// message, everything else stays generic.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload rejected with status {status}")]
    Rejected { status: u16 },
    #[error("upload could not reach the backend: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("upload failed: {0}")]
    Other(String),
}

impl UploadError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err)
        } else {
            Self::Other(err.to_string())
        }
    }

    /// The banner text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { status } if (400..500).contains(status) => {
                "upload: invalid format. Please check the CSV file and try again.".to_string()
            }
            Self::Rejected { .. } => {
                "upload: server error. Please try again later.".to_string()
            }
            Self::Connection(_) => {
                "upload: could not reach the server. Please check your connection.".to_string()
            }
            Self::Other(_) => "upload: failed. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Pagination {
    #[allow(dead_code)]
    page: u64,
    #[allow(dead_code)]
    limit: u64,
    total: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct UploadResponse {
    message: String,
}

/// Everything the dashboard needs before it can render: the full patient
/// list plus the backend's precomputed summaries, fetched concurrently.
#[derive(Debug, Clone)]
pub struct DashboardBundle {
    pub patients: Vec<PatientRecord>,
    pub patient_stats: AggregateStats,
    pub antibiotic_stats: AntibioticStatsSummary,
    pub specimen_stats: SpecimenStatsSummary,
    pub indicators: IndicatorSummary,
}

/// HTTP client for the PPS backend, base URL from `PPS_API_URL`.
#[derive(Debug, Clone)]
pub struct PpsBackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl PpsBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.http.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Fetch every patient record for client-side filtering.
    pub async fn fetch_all_patients(&self) -> Result<Vec<PatientRecord>, BackendError> {
        let path = "/api/v1/patients";
        let response = self
            .http
            .get(self.url(path))
            .query(&[("limit", FETCH_ALL_LIMIT)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        let page: PaginatedResponse<PatientRecord> = response.json().await?;
        tracing::debug!(
            fetched = page.data.len(),
            total = page.pagination.total,
            "fetched patient records"
        );
        Ok(page.data)
    }

    pub async fn patient_stats(&self) -> Result<AggregateStats, BackendError> {
        self.get_json("/api/v1/patients/stats").await
    }

    pub async fn antibiotic_stats(&self) -> Result<AntibioticStatsSummary, BackendError> {
        self.get_json("/api/v1/antibiotics/stats").await
    }

    pub async fn specimen_stats(&self) -> Result<SpecimenStatsSummary, BackendError> {
        self.get_json("/api/v1/specimens/stats").await
    }

    pub async fn aware_categorization(&self) -> Result<AwareSummary, BackendError> {
        self.get_json("/api/v1/pps/aware-categorization").await
    }

    pub async fn metric(&self, metric: PpsMetric) -> Result<MetricReport, BackendError> {
        self.get_json(metric.path()).await
    }

    pub async fn indicators(&self) -> Result<IndicatorSummary, BackendError> {
        self.get_json("/api/v1/pps/indicators").await
    }

    /// Fan-out/fan-in barrier for the initial load: all requests must
    /// succeed before the dashboard renders anything; one failure collapses
    /// the whole load with no partial result.
    pub async fn load_dashboard(&self) -> Result<DashboardBundle, BackendError> {
        let (patients, patient_stats, antibiotic_stats, specimen_stats, indicators) = tokio::try_join!(
            self.fetch_all_patients(),
            self.patient_stats(),
            self.antibiotic_stats(),
            self.specimen_stats(),
            self.indicators(),
        )?;

        Ok(DashboardBundle {
            patients,
            patient_stats,
            antibiotic_stats,
            specimen_stats,
            indicators,
        })
    }

    /// Forward a validated CSV to the backend's upload endpoint.
    pub async fn upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<String, UploadError> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str(mime::TEXT_CSV.as_ref())
            .map_err(UploadError::from_request)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url(&format!("/api/v1/upload/{}", dataset.slug())))
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(UploadError::from_request)?;
        Ok(body.message)
    }
}

impl BackendGateway for PpsBackendClient {
    fn forward_upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        contents: Vec<u8>,
    ) -> impl Future<Output = Result<String, UploadError>> + Send {
        self.upload(dataset, filename, contents)
    }

    /// The record store is refreshed only after the backend has confirmed
    /// ingestion, replacing the frontend's fixed two-second reload timer.
    fn refresh_patients(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<PatientRecord>>, UploadError>> + Send {
        async {
            let patients = self
                .fetch_all_patients()
                .await
                .map_err(|err| UploadError::Other(err.to_string()))?;
            Ok(Some(patients))
        }
    }
}
