// Token and ticket caching
mod memory;

pub use memory::MemoryCache;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Key/value store with per-entry absolute expiry
///
/// `get` must only return a value while `now < expires_at`. Expired entries may
/// stay in the store; they are overwritten by the next refresh. Implement this
/// to back tokens with a shared store (e.g. Redis) instead of process memory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Get the cached value if present and unexpired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value until `expires_at`
    async fn set(&self, key: &str, value: String, expires_at: DateTime<Utc>) -> Result<()>;
}
