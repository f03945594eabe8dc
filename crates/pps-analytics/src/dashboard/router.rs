//! HTTP surface of the dashboard engine.

use crate::dashboard::backend::UploadError;
use crate::dashboard::export::ExportFormat;
use crate::dashboard::filters::{FilterSelection, Selector};
use crate::dashboard::ingest::UploadDataset;
use crate::dashboard::service::{BackendGateway, DashboardService, DashboardServiceError, PatientStore};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query-string form of the filter state, every field optional. `all` and
/// the empty string both mean "not filtering on this field".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OptionsQuery {
    region: Option<String>,
    district: Option<String>,
    sub_county: Option<String>,
    facility: Option<String>,
    ownership: Option<String>,
    level_of_care: Option<String>,
    ward_name: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl OptionsQuery {
    fn into_selection(self) -> Result<FilterSelection, String> {
        fn selector(value: Option<String>) -> Selector {
            match value {
                Some(v) => Selector::from(v.as_str()),
                None => Selector::All,
            }
        }

        fn date_bound(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, String> {
            match value.as_deref() {
                None | Some("") | Some("all") => Ok(None),
                Some(raw) => raw
                    .parse::<NaiveDate>()
                    .map(Some)
                    .map_err(|_| format!("invalid {field}: '{raw}' (expected YYYY-MM-DD)")),
            }
        }

        Ok(FilterSelection {
            region: selector(self.region),
            district: selector(self.district),
            sub_county: selector(self.sub_county),
            facility: selector(self.facility),
            ownership: selector(self.ownership),
            level_of_care: selector(self.level_of_care),
            ward_name: selector(self.ward_name),
            from_date: date_bound("from_date", self.from_date)?,
            to_date: date_bound("to_date", self.to_date)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportRequest {
    format: ExportFormat,
    #[serde(default)]
    filters: FilterSelection,
}

pub fn dashboard_router<S, U>(service: Arc<DashboardService<S, U>>) -> Router
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    Router::new()
        .route("/api/v1/dashboard/options", get(filter_options::<S, U>))
        .route("/api/v1/dashboard/stats", post(dashboard_stats::<S, U>))
        .route("/api/v1/dashboard/export", post(export_dashboard::<S, U>))
        .route("/api/v1/upload/:dataset", post(upload_dataset::<S, U>))
        .with_state(service)
}

pub(crate) async fn filter_options<S, U>(
    State(service): State<Arc<DashboardService<S, U>>>,
    Query(query): Query<OptionsQuery>,
) -> Response
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    let selection = match query.into_selection() {
        Ok(selection) => selection,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };

    match service.options(&selection) {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn dashboard_stats<S, U>(
    State(service): State<Arc<DashboardService<S, U>>>,
    Json(selection): Json<FilterSelection>,
) -> Response
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    match service.stats(&selection) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn export_dashboard<S, U>(
    State(service): State<Arc<DashboardService<S, U>>>,
    Json(request): Json<ExportRequest>,
) -> Response
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    match service.export(request.format, &request.filters).await {
        Ok(artifact) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(artifact.content_type),
            );
            let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
            match HeaderValue::from_str(&disposition) {
                Ok(value) => {
                    headers.insert(header::CONTENT_DISPOSITION, value);
                }
                Err(_) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "export produced an invalid filename" })),
                    )
                        .into_response()
                }
            }
            (StatusCode::OK, headers, artifact.bytes).into_response()
        }
        Err(DashboardServiceError::Export(err)) => match err {
            crate::dashboard::export::ExportError::Empty => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        },
        Err(err) => service_error(err),
    }
}

pub(crate) async fn upload_dataset<S, U>(
    State(service): State<Arc<DashboardService<S, U>>>,
    Path(dataset): Path<String>,
    mut multipart: Multipart,
) -> Response
where
    S: PatientStore + 'static,
    U: BackendGateway + 'static,
{
    let Some(dataset) = UploadDataset::from_slug(&dataset) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown dataset '{dataset}'") })),
        )
            .into_response();
    };

    let mut file: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                match field.bytes().await {
                    Ok(bytes) => {
                        file = Some((filename, bytes.to_vec()));
                        break;
                    }
                    Err(err) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": format!("failed to read upload: {err}") })),
                        )
                            .into_response()
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid multipart body: {err}") })),
                )
                    .into_response()
            }
        }
    }

    let Some((filename, contents)) = file else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "no file part in upload" })),
        )
            .into_response();
    };

    match service.upload(dataset, &filename, contents).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": outcome.message,
                "rows": outcome.rows,
                "dataset": dataset.slug(),
            })),
        )
            .into_response(),
        Err(DashboardServiceError::Ingest(err)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(DashboardServiceError::Upload(err)) => upload_error(err),
        Err(err) => service_error(err),
    }
}

fn upload_error(err: UploadError) -> Response {
    let status = match &err {
        UploadError::Rejected { status } if (400..500).contains(status) => StatusCode::BAD_REQUEST,
        UploadError::Rejected { .. } | UploadError::Connection(_) => StatusCode::BAD_GATEWAY,
        UploadError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.user_message() }))).into_response()
}

fn service_error(err: DashboardServiceError) -> Response {
    let status = match &err {
        DashboardServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DashboardServiceError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardServiceError::Upload(_) => StatusCode::BAD_GATEWAY,
        DashboardServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
