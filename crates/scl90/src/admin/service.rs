use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::assessment::QuestionBank;
use crate::config::RedemptionConfig;
use crate::redemption::{
    RedemptionCode, RedemptionToken, RepositoryError, TokenEntry, TokenId, TokenRepository,
};

/// Largest batch a single `generate` call may issue.
pub const MAX_BATCH: usize = 100;

const RANDOM_SUFFIX_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Issued/consumed counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_codes: usize,
    pub used_codes: usize,
    pub unused_codes: usize,
    pub total_results: usize,
    /// Percentage of issued codes already used, one decimal.
    pub usage_rate: f64,
}

/// Administrative operations over the shared token store.
pub struct AdminService<R> {
    repository: Arc<R>,
    bank: Arc<QuestionBank>,
    default_prefix: String,
}

impl<R> AdminService<R>
where
    R: TokenRepository + 'static,
{
    pub fn new(repository: Arc<R>, bank: Arc<QuestionBank>, config: &RedemptionConfig) -> Self {
        Self {
            repository,
            bank,
            default_prefix: config.code_prefix.clone(),
        }
    }

    /// Issues `count` fresh codes shaped `PREFIX-<base36 millis>-<6 random base36>`.
    pub fn generate(
        &self,
        count: usize,
        prefix: Option<&str>,
    ) -> Result<Vec<RedemptionToken>, AdminError> {
        if count == 0 || count > MAX_BATCH {
            return Err(AdminError::InvalidBatchSize {
                count,
                max: MAX_BATCH,
            });
        }

        let prefix = match prefix.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) if value.chars().all(|c| c.is_ascii_alphanumeric()) => {
                value.to_ascii_uppercase()
            }
            Some(value) => return Err(AdminError::InvalidPrefix(value.to_string())),
            None => self.default_prefix.clone(),
        };

        let now = Utc::now();
        let stamp = base36(now.timestamp_millis().unsigned_abs());
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::with_capacity(count);
        let mut tokens = Vec::with_capacity(count);

        while tokens.len() < count {
            let suffix: String = (0..RANDOM_SUFFIX_LEN)
                .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
                .collect();
            let raw = format!("{prefix}-{stamp}-{suffix}");
            if !seen.insert(raw.clone()) {
                continue;
            }
            if let Some(code) = RedemptionCode::parse(&raw) {
                tokens.push(RedemptionToken::issue(code, now));
            }
        }

        let inserted = self.repository.insert_tokens(tokens)?;
        info!(count = inserted.len(), %prefix, "issued redemption codes");
        Ok(inserted)
    }

    pub fn list(&self) -> Result<Vec<TokenEntry>, AdminError> {
        Ok(self.repository.list_tokens()?)
    }

    /// Purges a token together with its result.
    pub fn delete(&self, id: &TokenId) -> Result<(), AdminError> {
        if self.repository.delete_token(id)? {
            info!(token_id = %id, "purged redemption code and its result");
            Ok(())
        } else {
            Err(AdminError::NotFound(id.clone()))
        }
    }

    pub fn stats(&self) -> Result<UsageStats, AdminError> {
        let entries = self.repository.list_tokens()?;
        let total_codes = entries.len();
        let used_codes = entries.iter().filter(|entry| entry.token.used).count();
        let total_results = entries.iter().filter(|entry| entry.result.is_some()).count();

        let usage_rate = if total_codes == 0 {
            0.0
        } else {
            let (used, total) = (used_codes as u64, total_codes as u64);
            let tenths = (2000 * used + total) / (2 * total);
            tenths as f64 / 10.0
        };

        Ok(UsageStats {
            total_codes,
            used_codes,
            unused_codes: total_codes - used_codes,
            total_results,
            usage_rate,
        })
    }

    /// Writes every token as a CSV row, one column per factor average. Returns the row count.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, AdminError> {
        let entries = self.repository.list_tokens()?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![
            "code",
            "used",
            "created_at",
            "used_at",
            "total_score",
            "gsi",
            "pst",
            "psi",
        ];
        header.extend(self.bank.factors().iter().map(|factor| factor.key.as_str()));
        csv_writer.write_record(&header)?;

        for entry in &entries {
            let token = &entry.token;
            let mut row = vec![
                token.code.to_string(),
                if token.used { "yes" } else { "no" }.to_string(),
                timestamp(Some(token.created_at)),
                timestamp(token.used_at),
            ];

            match &entry.result {
                Some(result) => {
                    let report = &result.report;
                    row.push(report.total_score.to_string());
                    row.push(format!("{:.2}", report.gsi));
                    row.push(report.positive_count.to_string());
                    row.push(format!("{:.2}", report.psi));
                    row.extend(self.bank.factors().iter().map(|factor| {
                        report
                            .factor_scores
                            .get(&factor.key)
                            .map(|score| format!("{:.2}", score.average))
                            .unwrap_or_default()
                    }));
                }
                None => row.resize(row.len() + 4 + self.bank.factors().len(), String::new()),
            }

            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|moment| moment.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Error raised by administrative operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("batch size must be between 1 and {max} (got {count})")]
    InvalidBatchSize { count: usize, max: usize },
    #[error("code prefix must be ASCII alphanumerics (got '{0}')")]
    InvalidPrefix(String),
    #[error("redemption code {0} not found")]
    NotFound(TokenId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}
