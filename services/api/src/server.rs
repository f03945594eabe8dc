use crate::cli::ServeArgs;
use crate::infra::{ApiUploadGateway, AppState, InMemoryPatientStore, OfflineIngest};
use crate::routes::with_dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pps_analytics::config::AppConfig;
use pps_analytics::dashboard::backend::LOAD_FAILURE_BANNER;
use pps_analytics::dashboard::{ingest, DashboardService, PpsBackendClient};
use pps_analytics::error::AppError;
use pps_analytics::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (store, gateway) = match args.patients_csv.take() {
        Some(path) => {
            let patients = ingest::patients_from_path(&path)?;
            info!(patients = patients.len(), path = %path.display(), "serving from local survey export");
            (
                InMemoryPatientStore::seeded(patients),
                ApiUploadGateway::Offline(OfflineIngest::default()),
            )
        }
        None => {
            let client = PpsBackendClient::new(config.backend.base_url.clone());
            // The initial load is all-or-nothing; a partial dashboard is
            // worse than an empty one with a clear banner.
            let patients = match client.load_dashboard().await {
                Ok(bundle) => {
                    info!(
                        patients = bundle.patients.len(),
                        antibiotics = bundle.antibiotic_stats.total_antibiotics,
                        specimens = bundle.specimen_stats.total_specimens,
                        "initial dashboard load complete"
                    );
                    bundle.patients
                }
                Err(err) => {
                    warn!(error = %err, "{LOAD_FAILURE_BANNER}");
                    Vec::new()
                }
            };
            (
                InMemoryPatientStore::seeded(patients),
                ApiUploadGateway::Backend(client),
            )
        }
    };

    let dashboard_service = Arc::new(DashboardService::new(Arc::new(store), Arc::new(gateway)));

    let app = with_dashboard_routes(dashboard_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "pps analytics service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
