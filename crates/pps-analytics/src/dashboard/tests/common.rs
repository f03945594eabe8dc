use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::dashboard::backend::UploadError;
use crate::dashboard::domain::PatientRecord;
use crate::dashboard::ingest::UploadDataset;
use crate::dashboard::service::{BackendGateway, DashboardService, PatientStore, StoreError};
use crate::dashboard::{dashboard_router, Selector};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn patient(
    code: &str,
    region: &str,
    district: &str,
    subcounty: &str,
    facility: &str,
    ward: &str,
    on_antibiotic: &str,
    survey_date: NaiveDate,
) -> PatientRecord {
    PatientRecord {
        patient_code: code.to_string(),
        region: region.to_string(),
        district: district.to_string(),
        subcounty: subcounty.to_string(),
        facility: facility.to_string(),
        ward_name: ward.to_string(),
        ownership: "Public".to_string(),
        level_of_care: "National Referral".to_string(),
        patient_on_antibiotic: on_antibiotic.to_string(),
        survey_date: Some(survey_date),
        ..PatientRecord::default()
    }
}

/// Two regions, two facilities in Central, surveys across June 2024.
pub(super) fn sample_patients() -> Vec<PatientRecord> {
    vec![
        patient("P-1", "Central", "Kampala", "Nakawa", "Mulago NRH", "Medical", "yes", date(2024, 6, 1)),
        patient("P-2", "Central", "Kampala", "Nakawa", "Mulago NRH", "Surgical", "no", date(2024, 6, 10)),
        patient("P-3", "Central", "Wakiso", "Kira", "Kira Health Centre", "Medical", "yes", date(2024, 6, 15)),
        patient("P-4", "Western", "Mbarara", "Kakoba", "Mbarara RRH", "Paediatric", "yes", date(2024, 6, 20)),
        patient("P-5", "Western", "Mbarara", "Kakoba", "Mbarara RRH", "Medical", "no", date(2024, 6, 25)),
    ]
}

pub(super) fn only(value: &str) -> Selector {
    Selector::only(value)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    patients: Arc<Mutex<Vec<PatientRecord>>>,
}

impl MemoryStore {
    pub(super) fn seeded(patients: Vec<PatientRecord>) -> Self {
        Self {
            patients: Arc::new(Mutex::new(patients)),
        }
    }

    pub(super) fn count(&self) -> usize {
        self.patients.lock().expect("store mutex poisoned").len()
    }
}

impl PatientStore for MemoryStore {
    fn all(&self) -> Result<Vec<PatientRecord>, StoreError> {
        Ok(self.patients.lock().expect("store mutex poisoned").clone())
    }

    fn replace(&self, patients: Vec<PatientRecord>) -> Result<(), StoreError> {
        *self.patients.lock().expect("store mutex poisoned") = patients;
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl PatientStore for UnavailableStore {
    fn all(&self) -> Result<Vec<PatientRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn replace(&self, _patients: Vec<PatientRecord>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Records forwarded uploads and hands back a configurable refreshed dataset.
#[derive(Default, Clone)]
pub(super) struct MemoryGateway {
    pub(super) forwarded: Arc<Mutex<Vec<(UploadDataset, String)>>>,
    pub(super) refreshed: Option<Vec<PatientRecord>>,
}

impl MemoryGateway {
    pub(super) fn refreshing_to(patients: Vec<PatientRecord>) -> Self {
        Self {
            forwarded: Arc::new(Mutex::new(Vec::new())),
            refreshed: Some(patients),
        }
    }

    pub(super) fn forwarded(&self) -> Vec<(UploadDataset, String)> {
        self.forwarded.lock().expect("gateway mutex poisoned").clone()
    }
}

impl BackendGateway for MemoryGateway {
    async fn forward_upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        _contents: Vec<u8>,
    ) -> Result<String, UploadError> {
        self.forwarded
            .lock()
            .expect("gateway mutex poisoned")
            .push((dataset, filename.to_string()));
        Ok(format!("{} uploaded successfully", dataset.label()))
    }

    async fn refresh_patients(&self) -> Result<Option<Vec<PatientRecord>>, UploadError> {
        Ok(self.refreshed.clone())
    }
}

/// Backend that rejects every upload with the given status.
pub(super) struct RejectingGateway {
    pub(super) status: u16,
}

impl BackendGateway for RejectingGateway {
    fn forward_upload(
        &self,
        _dataset: UploadDataset,
        _filename: &str,
        _contents: Vec<u8>,
    ) -> impl Future<Output = Result<String, UploadError>> + Send {
        std::future::ready(Err(UploadError::Rejected {
            status: self.status,
        }))
    }

    fn refresh_patients(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<PatientRecord>>, UploadError>> + Send {
        std::future::ready(Ok(None))
    }
}

/// Backend that accepts the upload but fails the follow-up refresh.
#[derive(Default)]
pub(super) struct StaleGateway;

impl BackendGateway for StaleGateway {
    async fn forward_upload(
        &self,
        dataset: UploadDataset,
        _filename: &str,
        _contents: Vec<u8>,
    ) -> Result<String, UploadError> {
        Ok(format!("{} uploaded successfully", dataset.label()))
    }

    async fn refresh_patients(&self) -> Result<Option<Vec<PatientRecord>>, UploadError> {
        Err(UploadError::Other("refresh endpoint down".to_string()))
    }
}

pub(super) fn build_service() -> (
    DashboardService<MemoryStore, MemoryGateway>,
    MemoryStore,
    MemoryGateway,
) {
    let store = MemoryStore::seeded(sample_patients());
    let gateway = MemoryGateway::default();
    let service = DashboardService::new(Arc::new(store.clone()), Arc::new(gateway.clone()));
    (service, store, gateway)
}

pub(super) fn dashboard_router_with_service(
    service: DashboardService<MemoryStore, MemoryGateway>,
) -> axum::Router {
    dashboard_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) const PATIENTS_CSV: &str = "\
id,region,district,subcounty,facility,ward_name,survey_date,patient_on_antibiotic
p-10,Northern,Gulu,Laroo,Gulu RRH,Medical,2024-07-01,yes
p-11,Northern,Gulu,Laroo,Gulu RRH,Surgical,2024-07-01,no
";

pub(super) fn multipart_upload(filename: &str, contents: &str) -> (String, Vec<u8>) {
    let boundary = "pps-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n--{boundary}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}
