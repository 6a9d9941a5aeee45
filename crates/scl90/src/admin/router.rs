use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::redemption::{TokenId, TokenRepository};

use super::service::{AdminError, AdminService};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub count: usize,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Router builder exposing the administrative endpoints.
pub fn admin_router<R>(service: Arc<AdminService<R>>) -> Router
where
    R: TokenRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admin/codes",
            get(list_handler::<R>).post(generate_handler::<R>),
        )
        .route("/api/v1/admin/codes/:code_id", delete(delete_handler::<R>))
        .route("/api/v1/admin/stats", get(stats_handler::<R>))
        .route("/api/v1/admin/export", get(export_handler::<R>))
        .with_state(service)
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<AdminService<R>>>) -> Response
where
    R: TokenRepository + 'static,
{
    match service.list() {
        Ok(codes) => (StatusCode::OK, Json(json!({ "codes": codes }))).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn generate_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    Json(request): Json<GenerateRequest>,
) -> Response
where
    R: TokenRepository + 'static,
{
    match service.generate(request.count, request.prefix.as_deref()) {
        Ok(codes) => (StatusCode::CREATED, Json(json!({ "codes": codes }))).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    Path(code_id): Path<String>,
) -> Response
where
    R: TokenRepository + 'static,
{
    match service.delete(&TokenId(code_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn stats_handler<R>(State(service): State<Arc<AdminService<R>>>) -> Response
where
    R: TokenRepository + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<AdminService<R>>>) -> Response
where
    R: TokenRepository + 'static,
{
    // BOM so spreadsheet tools detect UTF-8.
    let mut body = "\u{FEFF}".as_bytes().to_vec();
    if let Err(err) = service.export_csv(&mut body) {
        return admin_error_response(err);
    }

    let disposition = format!(
        "attachment; filename=\"scl90_export_{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

fn admin_error_response(err: AdminError) -> Response {
    let status = match &err {
        AdminError::InvalidBatchSize { .. } | AdminError::InvalidPrefix(_) => {
            StatusCode::BAD_REQUEST
        }
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::Repository(_) | AdminError::Csv(_) | AdminError::Io(_) => {
            error!(error = %err, "admin operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
