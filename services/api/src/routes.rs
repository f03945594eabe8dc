use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use pps_analytics::dashboard::{
    dashboard_router, BackendGateway, DashboardService, FilterSelection, PatientStore,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_dashboard_routes<S, U>(service: Arc<DashboardService<S, U>>) -> axum::Router
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    let summary = axum::Router::new()
        .route(
            "/api/v1/dashboard/summary",
            axum::routing::get(summary_endpoint::<S, U>),
        )
        .with_state(service.clone());

    dashboard_router(service)
        .merge(summary)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Unfiltered headline view: the numbers the dashboard landing cards show
/// before any filter is touched.
pub(crate) async fn summary_endpoint<S, U>(
    State(service): State<Arc<DashboardService<S, U>>>,
) -> impl IntoResponse
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    let selection = FilterSelection::default();
    let (options, stats) = match (service.options(&selection), service.stats(&selection)) {
        (Ok(options), Ok(stats)) => (options, stats),
        (Err(err), _) | (_, Err(err)) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "total_patients": stats.total_patients,
            "patients_on_antibiotic": stats.patients_on_antibiotic,
            "regions": options.regions.len(),
            "statistics": stats,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use pps_analytics::dashboard::PatientRecord;
    use tower::ServiceExt;

    use crate::infra::{ApiUploadGateway, InMemoryPatientStore, OfflineIngest};

    fn sample_patient(code: &str, region: &str, on_antibiotic: &str) -> PatientRecord {
        PatientRecord {
            patient_code: code.to_string(),
            region: region.to_string(),
            patient_on_antibiotic: on_antibiotic.to_string(),
            survey_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..PatientRecord::default()
        }
    }

    fn test_router() -> axum::Router {
        let store = InMemoryPatientStore::seeded(vec![
            sample_patient("P-1", "Central", "yes"),
            sample_patient("P-2", "Western", "no"),
        ]);
        let gateway = ApiUploadGateway::Offline(OfflineIngest::default());
        let service = Arc::new(DashboardService::new(Arc::new(store), Arc::new(gateway)));
        with_dashboard_routes(service)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["status"], "ok");
    }

    #[tokio::test]
    async fn summary_reports_headline_numbers() {
        let response = test_router()
            .oneshot(
                Request::get("/api/v1/dashboard/summary")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["total_patients"], 2);
        assert_eq!(payload["patients_on_antibiotic"], 1);
        assert_eq!(payload["regions"], 2);
    }

    #[tokio::test]
    async fn dashboard_routes_are_mounted() {
        let response = test_router()
            .oneshot(
                Request::get("/api/v1/dashboard/options")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["regions"], json!(["Central", "Western"]));
    }
}
