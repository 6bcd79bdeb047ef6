//! Key-value contract shared by the message and task stores.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

/// Async key-value store with per-key TTL.
///
/// Single-key put/get are atomic; there are no multi-key transactions.
/// Both stores sit on this one interface, differing only in key prefix
/// and TTL argument.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Associate `key` with `value`. `ttl_seconds: None` never expires.
    async fn put(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StoreError>;

    /// Fetch a value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// All live keys starting with `prefix`, in key order.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Key for a stored inbox message.
pub fn msg_key(user_id: &str, id: &str) -> String {
    format!("user:{user_id}:msg:{id}")
}

/// Key for a stored task.
pub fn task_key(user_id: &str, id: &str) -> String {
    format!("user:{user_id}:task:{id}")
}

/// Prefix covering all of a user's messages.
pub fn msg_prefix(user_id: &str) -> String {
    format!("user:{user_id}:msg:")
}

/// Prefix covering all of a user's tasks.
pub fn task_prefix(user_id: &str) -> String {
    format!("user:{user_id}:task:")
}

/// New opaque record identifier.
///
/// Uniqueness is purely probabilistic, from the 122 random bits of a
/// v4 UUID; no detector or lock prevents collisions.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

// ── Tests ───────────────────────────────────────────────────────────
