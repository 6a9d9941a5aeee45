use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{RedemptionCode, RedemptionToken, StoredResult, TokenId};
use super::repository::{ConsumeOutcome, RepositoryError, TokenEntry, TokenRepository};

#[derive(Debug, Default)]
struct StoreState {
    tokens: HashMap<TokenId, RedemptionToken>,
    codes: HashMap<RedemptionCode, TokenId>,
    results: HashMap<TokenId, StoredResult>,
}

/// Process-local token store. A single mutex covers tokens, the code index
/// and results, so `try_consume` is one compare-and-set.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTokenStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryTokenStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("token store mutex poisoned".to_string()))
    }
}

impl TokenRepository for InMemoryTokenStore {
    fn find_token(
        &self,
        code: &RedemptionCode,
    ) -> Result<Option<RedemptionToken>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.tokens.get(id))
            .cloned())
    }

    fn find_token_by_id(&self, id: &TokenId) -> Result<Option<RedemptionToken>, RepositoryError> {
        Ok(self.lock()?.tokens.get(id).cloned())
    }

    fn try_consume(
        &self,
        id: &TokenId,
        result: StoredResult,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        let mut state = self.lock()?;
        let consumed_at = result.created_at;

        let token = match state.tokens.get_mut(id) {
            None => return Ok(ConsumeOutcome::UnknownToken),
            Some(token) if token.used => return Ok(ConsumeOutcome::AlreadyConsumed),
            Some(token) => {
                token.used = true;
                token.used_at = Some(consumed_at);
                token.clone()
            }
        };
        state.results.insert(id.clone(), result);

        Ok(ConsumeOutcome::Consumed(token))
    }

    fn find_result_by_token(&self, id: &TokenId) -> Result<Option<StoredResult>, RepositoryError> {
        Ok(self.lock()?.results.get(id).cloned())
    }

    fn insert_tokens(
        &self,
        tokens: Vec<RedemptionToken>,
    ) -> Result<Vec<RedemptionToken>, RepositoryError> {
        let mut state = self.lock()?;

        let mut batch = HashSet::new();
        for token in &tokens {
            if state.codes.contains_key(&token.code) || !batch.insert(&token.code) {
                return Err(RepositoryError::Conflict(token.code.to_string()));
            }
        }

        for token in &tokens {
            state.codes.insert(token.code.clone(), token.id.clone());
            state.tokens.insert(token.id.clone(), token.clone());
        }
        Ok(tokens)
    }

    fn delete_token(&self, id: &TokenId) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        state.results.remove(id);
        match state.tokens.remove(id) {
            Some(token) => {
                state.codes.remove(&token.code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_tokens(&self) -> Result<Vec<TokenEntry>, RepositoryError> {
        let state = self.lock()?;
        let mut entries: Vec<TokenEntry> = state
            .tokens
            .values()
            .map(|token| TokenEntry {
                token: token.clone(),
                result: state.results.get(&token.id).cloned(),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.token
                .created_at
                .cmp(&a.token.created_at)
                .then_with(|| a.token.code.cmp(&b.token.code))
        });
        Ok(entries)
    }
}
