//! Redemption-gated SCL-90 assessment core.
//!
//! A redemption code unlocks exactly one scored submission of the 90-item
//! questionnaire. The [`assessment`] module owns the question bank and the
//! pure scoring engine; [`redemption`] enforces the single-use token
//! lifecycle on top of a storage contract; [`admin`] covers code issuance,
//! purge, statistics and CSV export.

pub mod admin;
pub mod assessment;
pub mod config;
pub mod error;
pub mod redemption;
pub mod telemetry;
