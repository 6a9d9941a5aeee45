use metrics_exporter_prometheus::PrometheusHandle;
use scl90::admin::AdminService;
use scl90::assessment::{AnswerSet, QuestionBank, ScoringEngine};
use scl90::config::RedemptionConfig;
use scl90::error::AppError;
use scl90::redemption::{InMemoryTokenStore, TokenGate};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Gate and admin service sharing one store and one question bank.
pub(crate) struct Services {
    pub(crate) gate: Arc<TokenGate<InMemoryTokenStore>>,
    pub(crate) admin: Arc<AdminService<InMemoryTokenStore>>,
}

pub(crate) fn build_services(config: &RedemptionConfig) -> Services {
    let store = Arc::new(InMemoryTokenStore::default());
    let bank = Arc::new(QuestionBank::standard());
    let engine = Arc::new(ScoringEngine::new(bank.clone()));

    Services {
        gate: Arc::new(TokenGate::new(store.clone(), engine)),
        admin: Arc::new(AdminService::new(store, bank, config)),
    }
}

pub(crate) fn read_answers(path: &Path) -> Result<AnswerSet, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let answers = serde_json::from_str(&raw)?;
    Ok(answers)
}
