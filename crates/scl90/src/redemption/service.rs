use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::assessment::{AnswerSet, AnswerSetError, BankMismatch, ScoringEngine};

use super::domain::{
    RedemptionCode, RedemptionToken, StoredResult, SubmissionHandle, TokenId, TokenState,
};
use super::repository::{ConsumeOutcome, RepositoryError, TokenRepository};

/// Gate composing the token store and the scoring engine.
pub struct TokenGate<R> {
    repository: Arc<R>,
    engine: Arc<ScoringEngine>,
}

impl<R> TokenGate<R>
where
    R: TokenRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<ScoringEngine>) -> Self {
        Self { repository, engine }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Looks up a presented code. Never changes token state.
    pub fn check(&self, raw_code: &str) -> Result<TokenState, GateError> {
        let code = RedemptionCode::parse(raw_code).ok_or(GateError::EmptyCode)?;
        let token = self.repository.find_token(&code)?.ok_or_else(|| {
            debug!(%code, "unknown redemption code presented");
            GateError::NotFound
        })?;
        self.state_of(token)
    }

    /// Same as [`TokenGate::check`], addressed by an issued handle.
    pub fn lookup(&self, handle: &SubmissionHandle) -> Result<TokenState, GateError> {
        let token = self
            .repository
            .find_token_by_id(handle.token_id())?
            .ok_or(GateError::NotFound)?;
        self.state_of(token)
    }

    /// Scores `answers` and consumes the token in one storage write.
    ///
    /// Validation happens before any storage access, so a rejected answer set
    /// leaves the token untouched.
    pub fn submit(
        &self,
        handle: &SubmissionHandle,
        answers: &AnswerSet,
    ) -> Result<StoredResult, GateError> {
        let responses = self.engine.validate(answers)?;
        let token_id = handle.token_id();

        let token = self
            .repository
            .find_token_by_id(token_id)?
            .ok_or(GateError::NotFound)?;
        if token.used {
            debug!(%token_id, "submission against consumed token");
            return Err(GateError::AlreadyConsumed {
                token_id: token_id.clone(),
            });
        }

        let result = StoredResult {
            token_id: token_id.clone(),
            answers: responses.to_map(),
            report: self.engine.score(&responses)?,
            created_at: Utc::now(),
        };

        match self.repository.try_consume(token_id, result.clone())? {
            ConsumeOutcome::Consumed(token) => {
                info!(
                    %token_id,
                    code = %token.code,
                    total_score = result.report.total_score,
                    gsi = result.report.gsi,
                    "assessment recorded and redemption code consumed"
                );
                Ok(result)
            }
            ConsumeOutcome::AlreadyConsumed => {
                warn!(%token_id, "concurrent submission lost the consume race");
                Err(GateError::AlreadyConsumed {
                    token_id: token_id.clone(),
                })
            }
            ConsumeOutcome::UnknownToken => {
                warn!(%token_id, "token disappeared before it could be consumed");
                Err(GateError::NotFound)
            }
        }
    }

    fn state_of(&self, token: RedemptionToken) -> Result<TokenState, GateError> {
        if !token.used {
            return Ok(TokenState::Fresh {
                handle: SubmissionHandle(token.id),
            });
        }

        match self.repository.find_result_by_token(&token.id)? {
            Some(result) => Ok(TokenState::Consumed {
                result: Box::new(result),
            }),
            None => {
                error!(
                    token_id = %token.id,
                    code = %token.code,
                    "integrity violation: consumed redemption code has no stored result"
                );
                Err(GateError::IntegrityViolation { token_id: token.id })
            }
        }
    }
}

/// Error raised by the token gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("a redemption code is required")]
    EmptyCode,
    #[error("invalid redemption code")]
    NotFound,
    #[error(transparent)]
    InvalidAnswerSet(#[from] AnswerSetError),
    #[error("redemption code has already been used")]
    AlreadyConsumed { token_id: TokenId },
    #[error("redemption token {token_id} is consumed but has no stored result")]
    IntegrityViolation { token_id: TokenId },
    #[error(transparent)]
    Scoring(#[from] BankMismatch),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
