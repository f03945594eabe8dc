use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use crate::dashboard::service::DashboardService;

fn router() -> axum::Router {
    let (service, _, _) = build_service();
    dashboard_router_with_service(service)
}

#[tokio::test]
async fn options_route_returns_narrowed_dropdowns() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/dashboard/options?region=Central")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["regions"], serde_json::json!(["Central", "Western"]));
    assert_eq!(payload["districts"], serde_json::json!(["Kampala", "Wakiso"]));
    assert_eq!(payload["facilities"], serde_json::json!([]));
}

#[tokio::test]
async fn options_route_treats_all_as_no_filter() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/dashboard/options?region=all&from_date=all")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["districts"], serde_json::json!([]));
}

#[tokio::test]
async fn options_route_rejects_malformed_dates() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/dashboard/options?from_date=01-06-2024")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error string")
        .contains("from_date"));
}

#[tokio::test]
async fn stats_route_accepts_a_filter_payload() {
    let response = router()
        .oneshot(
            Request::post("/api/v1/dashboard/stats")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"region": "Western"}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total_patients"], 2);
    assert_eq!(payload["patients_on_antibiotic"], 1);
}

#[tokio::test]
async fn export_route_sets_download_headers() {
    let response = router()
        .oneshot(
            Request::post("/api/v1/dashboard/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"format": "csv", "filters": {"region": "Central"}}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("disposition header");
    assert!(disposition.starts_with("attachment; filename=\"PPS_Patient_Data_"));
}

#[tokio::test]
async fn export_route_rejects_an_empty_view() {
    let response = router()
        .oneshot(
            Request::post("/api/v1/dashboard/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"format": "csv", "filters": {"region": "Nowhere"}}"#,
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "no data to export");
}

#[tokio::test]
async fn upload_route_accepts_a_csv_and_reports_rows() {
    let (content_type, body) = multipart_upload("patients.csv", PATIENTS_CSV);
    let response = router()
        .oneshot(
            Request::post("/api/v1/upload/patients")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["rows"], 2);
    assert_eq!(payload["dataset"], "patients");
}

#[tokio::test]
async fn upload_route_rejects_unknown_datasets() {
    let (content_type, body) = multipart_upload("metrics.csv", PATIENTS_CSV);
    let response = router()
        .oneshot(
            Request::post("/api/v1/upload/metrics")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_route_rejects_invalid_csv_contents() {
    let (content_type, body) = multipart_upload("patients.csv", "id,notes\n1,hello\n");
    let response = router()
        .oneshot(
            Request::post("/api/v1/upload/patients")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error string")
        .contains("missing required columns"));
}

#[tokio::test]
async fn upload_route_maps_backend_rejection_to_bad_request() {
    let service = DashboardService::new(
        Arc::new(MemoryStore::seeded(sample_patients())),
        Arc::new(RejectingGateway { status: 400 }),
    );
    let router = crate::dashboard::dashboard_router(Arc::new(service));

    let (content_type, body) = multipart_upload("patients.csv", PATIENTS_CSV);
    let response = router
        .oneshot(
            Request::post("/api/v1/upload/patients")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "upload: invalid format. Please check the CSV file and try again."
    );
}
