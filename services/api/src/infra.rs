use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use pps_analytics::dashboard::{
    ingest, BackendGateway, PatientRecord, PatientStore, PpsBackendClient, StoreError,
    UploadDataset, UploadError,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The engine's working copy of the patient dataset.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPatientStore {
    patients: Arc<Mutex<Vec<PatientRecord>>>,
}

impl InMemoryPatientStore {
    pub(crate) fn seeded(patients: Vec<PatientRecord>) -> Self {
        Self {
            patients: Arc::new(Mutex::new(patients)),
        }
    }
}

impl PatientStore for InMemoryPatientStore {
    fn all(&self) -> Result<Vec<PatientRecord>, StoreError> {
        Ok(self.patients.lock().expect("store mutex poisoned").clone())
    }

    fn replace(&self, patients: Vec<PatientRecord>) -> Result<(), StoreError> {
        *self.patients.lock().expect("store mutex poisoned") = patients;
        Ok(())
    }
}

/// Upload path for the service: forward to the PPS backend when one is
/// configured, otherwise ingest patient CSVs locally.
pub(crate) enum ApiUploadGateway {
    Backend(PpsBackendClient),
    Offline(OfflineIngest),
}

#[derive(Default)]
pub(crate) struct OfflineIngest {
    pending: Mutex<Option<Vec<PatientRecord>>>,
}

impl BackendGateway for ApiUploadGateway {
    async fn forward_upload(
        &self,
        dataset: UploadDataset,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<String, UploadError> {
        match self {
            Self::Backend(client) => client.upload(dataset, filename, contents).await,
            Self::Offline(offline) => {
                if dataset != UploadDataset::Patients {
                    return Err(UploadError::Other(format!(
                        "offline mode only accepts patient uploads, not {}",
                        dataset.label()
                    )));
                }
                let patients = ingest::patients_from_reader(contents.as_slice())
                    .map_err(|err| UploadError::Other(err.to_string()))?;
                let rows = patients.len();
                *offline.pending.lock().expect("offline mutex poisoned") = Some(patients);
                Ok(format!("{rows} patient records ingested locally"))
            }
        }
    }

    async fn refresh_patients(&self) -> Result<Option<Vec<PatientRecord>>, UploadError> {
        match self {
            Self::Backend(client) => {
                let patients = client
                    .fetch_all_patients()
                    .await
                    .map_err(|err| UploadError::Other(err.to_string()))?;
                Ok(Some(patients))
            }
            Self::Offline(offline) => {
                Ok(offline.pending.lock().expect("offline mutex poisoned").take())
            }
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENTS_CSV: &str = "\
id,region,district,subcounty,facility,ward_name,survey_date,patient_on_antibiotic
p-1,Central,Kampala,Nakawa,Mulago NRH,Medical,2024-06-01,yes
";

    #[tokio::test]
    async fn offline_gateway_hands_uploads_back_through_refresh() {
        let gateway = ApiUploadGateway::Offline(OfflineIngest::default());

        let message = gateway
            .forward_upload(
                UploadDataset::Patients,
                "patients.csv",
                PATIENTS_CSV.as_bytes().to_vec(),
            )
            .await
            .expect("local ingest succeeds");
        assert!(message.contains("1 patient records"));

        let refreshed = gateway
            .refresh_patients()
            .await
            .expect("refresh succeeds")
            .expect("records pending");
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].region, "Central");

        // A second refresh has nothing new.
        assert!(gateway
            .refresh_patients()
            .await
            .expect("refresh succeeds")
            .is_none());
    }

    #[tokio::test]
    async fn offline_gateway_rejects_non_patient_datasets() {
        let gateway = ApiUploadGateway::Offline(OfflineIngest::default());
        let err = gateway
            .forward_upload(
                UploadDataset::Specimens,
                "specimens.csv",
                PATIENTS_CSV.as_bytes().to_vec(),
            )
            .await
            .expect_err("offline mode is patients only");
        assert!(matches!(err, UploadError::Other(_)));
    }
}
