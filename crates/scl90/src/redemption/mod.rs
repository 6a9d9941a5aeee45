//! Single-use redemption tokens gating one scored submission each.
//!
//! A token moves from unconsumed to consumed exactly once, through
//! [`TokenGate::submit`]. The flag flip and the result write are a single
//! conditional storage operation ([`TokenRepository::try_consume`]), so two
//! racing submissions cannot both succeed.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    RedemptionCode, RedemptionToken, StoredResult, SubmissionHandle, TokenId, TokenState,
};
pub use memory::InMemoryTokenStore;
pub use repository::{ConsumeOutcome, RepositoryError, TokenEntry, TokenRepository};
pub use router::redemption_router;
pub use service::{GateError, TokenGate};
