use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::assessment::{AnswerSet, QuestionBank, ScoringEngine};
use crate::redemption::domain::{RedemptionCode, RedemptionToken, StoredResult, TokenId};
use crate::redemption::memory::InMemoryTokenStore;
use crate::redemption::repository::{
    ConsumeOutcome, RepositoryError, TokenEntry, TokenRepository,
};
use crate::redemption::service::TokenGate;

pub(super) fn engine() -> Arc<ScoringEngine> {
    Arc::new(ScoringEngine::standard())
}

pub(super) fn build_gate() -> (TokenGate<InMemoryTokenStore>, Arc<InMemoryTokenStore>) {
    let store = Arc::new(InMemoryTokenStore::default());
    let gate = TokenGate::new(store.clone(), engine());
    (gate, store)
}

pub(super) fn issue<R: TokenRepository>(repository: &R, code: &str) -> RedemptionToken {
    let code = RedemptionCode::parse(code).expect("non-empty code");
    let mut inserted = repository
        .insert_tokens(vec![RedemptionToken::issue(code, Utc::now())])
        .expect("insert succeeds");
    inserted.remove(0)
}

pub(super) fn uniform_answers(value: i64) -> AnswerSet {
    AnswerSet::uniform(&QuestionBank::standard(), value)
}

pub(super) fn mixed_answers() -> AnswerSet {
    (1..=90).map(|id| (id, id % 4 + 1)).collect()
}

/// Store that reports consumed tokens but has lost their results.
#[derive(Default)]
pub(super) struct OrphanedResultRepository {
    pub(super) inner: InMemoryTokenStore,
}

impl TokenRepository for OrphanedResultRepository {
    fn find_token(
        &self,
        code: &RedemptionCode,
    ) -> Result<Option<RedemptionToken>, RepositoryError> {
        self.inner.find_token(code)
    }

    fn find_token_by_id(&self, id: &TokenId) -> Result<Option<RedemptionToken>, RepositoryError> {
        self.inner.find_token_by_id(id)
    }

    fn try_consume(
        &self,
        id: &TokenId,
        result: StoredResult,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        self.inner.try_consume(id, result)
    }

    fn find_result_by_token(&self, _id: &TokenId) -> Result<Option<StoredResult>, RepositoryError> {
        Ok(None)
    }

    fn insert_tokens(
        &self,
        tokens: Vec<RedemptionToken>,
    ) -> Result<Vec<RedemptionToken>, RepositoryError> {
        self.inner.insert_tokens(tokens)
    }

    fn delete_token(&self, id: &TokenId) -> Result<bool, RepositoryError> {
        self.inner.delete_token(id)
    }

    fn list_tokens(&self) -> Result<Vec<TokenEntry>, RepositoryError> {
        self.inner.list_tokens()
    }
}

pub(super) struct UnavailableRepository;

impl TokenRepository for UnavailableRepository {
    fn find_token(
        &self,
        _code: &RedemptionCode,
    ) -> Result<Option<RedemptionToken>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn find_token_by_id(&self, _id: &TokenId) -> Result<Option<RedemptionToken>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn try_consume(
        &self,
        _id: &TokenId,
        _result: StoredResult,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn find_result_by_token(&self, _id: &TokenId) -> Result<Option<StoredResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert_tokens(
        &self,
        _tokens: Vec<RedemptionToken>,
    ) -> Result<Vec<RedemptionToken>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn delete_token(&self, _id: &TokenId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn list_tokens(&self) -> Result<Vec<TokenEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
