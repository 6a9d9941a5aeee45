use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::assessment::{AnswerSet, Factor, MAX_RESPONSE, MIN_RESPONSE};

use super::domain::{StoredResult, SubmissionHandle, TokenId, TokenState};
use super::repository::TokenRepository;
use super::service::{GateError, TokenGate};

const GENERIC_FAILURE: &str = "something went wrong, please try again later";

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub code: String,
}

/// Answer to a code verification. `previous_result` is set once the code is used.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub used: bool,
    pub code_id: TokenId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_result: Option<StoredResult>,
}

impl From<TokenState> for VerifyResponse {
    fn from(state: TokenState) -> Self {
        match state {
            TokenState::Fresh { handle } => Self {
                valid: true,
                used: false,
                code_id: handle.0,
                previous_result: None,
            },
            TokenState::Consumed { result } => Self {
                valid: true,
                used: true,
                code_id: result.token_id.clone(),
                previous_result: Some(*result),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub code_id: SubmissionHandle,
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct QuestionnaireView<'a> {
    pub question_count: u16,
    pub min_response: u8,
    pub max_response: u8,
    pub factors: &'a [Factor],
}

/// Router builder exposing code verification and assessment submission.
pub fn redemption_router<R>(gate: Arc<TokenGate<R>>) -> Router
where
    R: TokenRepository + 'static,
{
    Router::new()
        .route("/api/v1/codes/verify", post(verify_handler::<R>))
        .route("/api/v1/assessments", post(submit_handler::<R>))
        .route("/api/v1/questionnaire", get(questionnaire_handler::<R>))
        .with_state(gate)
}

pub(crate) async fn verify_handler<R>(
    State(gate): State<Arc<TokenGate<R>>>,
    Json(request): Json<VerifyRequest>,
) -> Response
where
    R: TokenRepository + 'static,
{
    match gate.check(&request.code) {
        Ok(state) => (StatusCode::OK, Json(VerifyResponse::from(state))).into_response(),
        Err(err) => gate_error_response(err),
    }
}

pub(crate) async fn submit_handler<R>(
    State(gate): State<Arc<TokenGate<R>>>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: TokenRepository + 'static,
{
    match gate.submit(&request.code_id, &request.answers) {
        Ok(result) => (StatusCode::CREATED, Json(result)).into_response(),
        Err(GateError::AlreadyConsumed { .. }) => match gate.lookup(&request.code_id) {
            Ok(TokenState::Consumed { result }) => {
                let payload = json!({
                    "error": "redemption code has already been used",
                    "used": true,
                    "previous_result": result,
                });
                (StatusCode::CONFLICT, Json(payload)).into_response()
            }
            Ok(TokenState::Fresh { .. }) => {
                let payload = json!({ "error": "redemption code has already been used" });
                (StatusCode::CONFLICT, Json(payload)).into_response()
            }
            Err(err) => gate_error_response(err),
        },
        Err(err) => gate_error_response(err),
    }
}

pub(crate) async fn questionnaire_handler<R>(State(gate): State<Arc<TokenGate<R>>>) -> Response
where
    R: TokenRepository + 'static,
{
    let bank = gate.engine().bank();
    let view = QuestionnaireView {
        question_count: bank.question_count(),
        min_response: MIN_RESPONSE,
        max_response: MAX_RESPONSE,
        factors: bank.factors(),
    };
    (StatusCode::OK, Json(view)).into_response()
}

fn gate_error_response(err: GateError) -> Response {
    match err {
        GateError::EmptyCode => {
            let payload = json!({ "error": err.to_string(), "valid": false });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        GateError::NotFound => {
            let payload = json!({ "error": err.to_string(), "valid": false });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        GateError::InvalidAnswerSet(details) => {
            let payload = json!({
                "error": details.to_string(),
                "missing": details.missing,
                "unknown": details.unknown,
                "out_of_range": details.out_of_range,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        GateError::AlreadyConsumed { .. } => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        GateError::IntegrityViolation { .. } => {
            let payload = json!({ "error": GENERIC_FAILURE });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        GateError::Scoring(source) => {
            error!(error = %source, "scoring engine rejected validated responses");
            let payload = json!({ "error": GENERIC_FAILURE });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        GateError::Repository(source) => {
            error!(error = %source, "token store failure");
            let payload = json!({ "error": GENERIC_FAILURE });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
