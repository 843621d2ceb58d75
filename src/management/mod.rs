mod auth;
mod sync;

pub use auth::{EXPIRY_SKEW_SECS, TokenManager, token_expired};
pub use sync::{SyncOptions, SyncResults, SyncService};
