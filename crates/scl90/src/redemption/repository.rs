use serde::Serialize;

use super::domain::{RedemptionCode, RedemptionToken, StoredResult, TokenId};

/// Result of the conditional consume write.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// Flag flipped and result stored together; carries the updated token.
    Consumed(RedemptionToken),
    /// The flag was already set; nothing was written.
    AlreadyConsumed,
    /// No token with that id exists; nothing was written.
    UnknownToken,
}

/// Token paired with its result, as listed for administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenEntry {
    pub token: RedemptionToken,
    pub result: Option<StoredResult>,
}

/// Storage contract for tokens and their results.
///
/// `try_consume` must be a single atomic operation: the consumption flag,
/// its timestamp and the result are written together only when the flag is
/// currently unset.
pub trait TokenRepository: Send + Sync {
    fn find_token(&self, code: &RedemptionCode)
        -> Result<Option<RedemptionToken>, RepositoryError>;
    fn find_token_by_id(&self, id: &TokenId) -> Result<Option<RedemptionToken>, RepositoryError>;
    fn try_consume(
        &self,
        id: &TokenId,
        result: StoredResult,
    ) -> Result<ConsumeOutcome, RepositoryError>;
    fn find_result_by_token(&self, id: &TokenId) -> Result<Option<StoredResult>, RepositoryError>;
    fn insert_tokens(
        &self,
        tokens: Vec<RedemptionToken>,
    ) -> Result<Vec<RedemptionToken>, RepositoryError>;
    /// Removes a token and its result. Returns `false` when the token was absent.
    fn delete_token(&self, id: &TokenId) -> Result<bool, RepositoryError>;
    /// All tokens, newest first.
    fn list_tokens(&self) -> Result<Vec<TokenEntry>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("redemption code '{0}' already exists")]
    Conflict(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
