use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::{QuestionId, ScoreReport};

/// Storage identity of a redemption token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Redemption code in its normalized (trimmed, uppercase) form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionCode(String);

impl RedemptionCode {
    /// Normalizes user input. Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-use credential. `used` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionToken {
    pub id: TokenId,
    pub code: RedemptionCode,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RedemptionToken {
    pub fn issue(code: RedemptionCode, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TokenId::generate(),
            code,
            used: false,
            used_at: None,
            created_at,
        }
    }
}

/// Authorization for one submission against a fresh token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHandle(pub TokenId);

impl SubmissionHandle {
    pub fn token_id(&self) -> &TokenId {
        &self.0
    }
}

/// Persisted outcome of a token's single submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResult {
    pub token_id: TokenId,
    pub answers: BTreeMap<QuestionId, u8>,
    pub report: ScoreReport,
    pub created_at: DateTime<Utc>,
}

/// What `check` learned about a presented code.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenState {
    Fresh { handle: SubmissionHandle },
    Consumed { result: Box<StoredResult> },
}

impl TokenState {
    pub fn is_fresh(&self) -> bool {
        matches!(self, TokenState::Fresh { .. })
    }
}
