//! Administrative collaborators: code issuance, purge, usage statistics and CSV export.

pub mod router;
pub mod service;


pub use router::admin_router;
pub use service::{AdminError, AdminService, UsageStats, MAX_BATCH};
