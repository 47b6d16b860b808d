//! Key-value backend abstraction.
//!
//! The file store only needs a handful of primitives from its backend:
//! string get/set-with-TTL/delete, set membership, and key expiry. Each
//! call is individually atomic; there are no cross-key transactions, and
//! deleting an absent key is a no-op.

mod redis_kv;

#[cfg(test)]
pub mod memory;

pub use redis_kv::RedisKv;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

pub type KvResult<T> = Result<T, KvError>;

/// Minimal TTL-bearing key-value surface backed by Redis in production
/// and by an in-process map in tests.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Set a string value with a time-to-live in seconds.
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> KvResult<()>;

    /// Fetch a string value. Expired and never-written keys both read as `None`.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Delete a key. Deleting an absent key succeeds.
    async fn del(&self, key: &str) -> KvResult<()>;

    /// Whether a live (unexpired) value exists at `key`.
    async fn exists(&self, key: &str) -> KvResult<bool>;

    /// Add `member` to the set at `key`, creating the set if needed.
    async fn sadd(&self, key: &str, member: &str) -> KvResult<()>;

    /// Remove `member` from the set at `key`. Absent members are ignored.
    async fn srem(&self, key: &str, member: &str) -> KvResult<()>;

    /// Reset the TTL of an existing key.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> KvResult<()>;

    /// Round-trip liveness check against the backend.
    async fn ping(&self) -> KvResult<()>;
}
