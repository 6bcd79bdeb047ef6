//! libSQL-backed key-value store.
//!
//! The hosted platform this service models its storage on expires keys
//! natively; a SQL backend keeps an `expires_at` column instead, filters
//! it on every read, and sweeps expired rows in a background task.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::kv::KvStore;

/// libSQL key-value backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlKv {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlKv {
    /// Open (or create) a local database file and prepare the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create store directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "CREATE TABLE IF NOT EXISTS kv_entries (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    expires_at TEXT
                )",
                (),
            )
            .await
            .map_err(|e| StoreError::Query(format!("init_schema: {e}")))?;

        self.conn()
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_kv_entries_expires_at
                 ON kv_entries (expires_at)",
                (),
            )
            .await
            .map_err(|e| StoreError::Query(format!("init_schema index: {e}")))?;

        Ok(())
    }

    /// Delete rows whose expiry has passed. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now().to_rfc3339();
        let removed = self
            .conn()
            .execute(
                "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("purge_expired: {e}")))?;

        if removed > 0 {
            debug!(removed, "Purged expired KV rows");
        }
        Ok(removed)
    }
}

#[async_trait]
impl KvStore for LibSqlKv {
    async fn put(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl_seconds
            .map(|secs| (Utc::now() + chrono::Duration::seconds(secs as i64)).to_rfc3339());

        self.conn()
            .execute(
                "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     expires_at = excluded.expires_at",
                params![key, value, opt_text(expires_at)],
            )
            .await
            .map_err(|e| StoreError::Query(format!("put: {e}")))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut rows = self
            .conn()
            .query(
                "SELECT value FROM kv_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get row parse: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Utc::now().to_rfc3339();
        let pattern = format!("{}%", escape_like(prefix));
        let mut rows = self
            .conn()
            .query(
                "SELECT key FROM kv_entries
                 WHERE key LIKE ?1 ESCAPE '\\'
                   AND (expires_at IS NULL OR expires_at > ?2)
                 ORDER BY key ASC",
                params![pattern, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_prefix: {e}")))?;

        let mut keys = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let key: String = row
                        .get(0)
                        .map_err(|e| StoreError::Query(format!("list_prefix row parse: {e}")))?;
                    keys.push(key);
                }
                Ok(None) => break,
                Err(e) => return Err(StoreError::Query(format!("list_prefix: {e}"))),
            }
        }
        Ok(keys)
    }
}

/// Escape LIKE wildcards so a prefix matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Spawn a background task that periodically deletes expired rows.
pub fn spawn_purge_task(store: Arc<LibSqlKv>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if let Err(e) = store.purge_expired().await {
                warn!(error = %e, "Purge sweep failed");
            }
        }
    })
}

// ── Tests ───────────────────────────────────────────────────────────
