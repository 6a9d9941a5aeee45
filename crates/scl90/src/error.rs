use crate::admin::AdminError;
use crate::config::ConfigError;
use crate::redemption::GateError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Top-level error for the CLI, the server bootstrap and handlers that bubble up.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("redemption error: {0}")]
    Gate(#[from] GateError),
    #[error("admin error: {0}")]
    Admin(#[from] AdminError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Json(_)
            | AppError::Gate(GateError::EmptyCode)
            | AppError::Admin(AdminError::InvalidBatchSize { .. })
            | AppError::Admin(AdminError::InvalidPrefix(_)) => StatusCode::BAD_REQUEST,
            AppError::Gate(GateError::NotFound) | AppError::Admin(AdminError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Gate(GateError::InvalidAnswerSet(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Gate(GateError::AlreadyConsumed { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::BankMismatch;
    use crate::redemption::TokenId;

    #[test]
    fn integrity_violations_render_generic_500() {
        let err = AppError::from(GateError::IntegrityViolation {
            token_id: TokenId("secret-id".to_string()),
        });
        assert!(err.to_string().contains("secret-id"));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn user_correctable_errors_map_to_client_statuses() {
        let response = AppError::from(GateError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(AdminError::InvalidBatchSize { count: 0, max: 100 })
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn scoring_mismatch_is_an_internal_error() {
        let err = AppError::from(GateError::Scoring(BankMismatch {
            expected: 90,
            actual: 4,
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&err).is_some());
    }
}
