//! MessageStore — persists inbound messages as JSON under namespaced KV keys.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::mail::ParsedMessage;
use crate::store::kv::{self, KvStore};

/// Messages are kept for 30 days, then the key expires.
pub const MESSAGE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// A stored inbound message. Written once at ingestion, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxRecord {
    pub id: String,
    pub user_id: String,
    pub received_at: DateTime<Utc>,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub headers: Vec<(String, String)>,
}

/// Message storage over the shared KV backend.
pub struct MessageStore {
    kv: Arc<dyn KvStore>,
}

impl MessageStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Persist a parsed message for a user. Returns the generated record id.
    pub async fn insert(
        &self,
        user_id: &str,
        parsed: &ParsedMessage,
    ) -> Result<String, StoreError> {
        let id = kv::new_record_id();
        let record = InboxRecord {
            id: id.clone(),
            user_id: user_id.to_string(),
            received_at: Utc::now(),
            from: parsed.from.clone(),
            subject: parsed.subject.clone(),
            text: parsed.text.clone(),
            html: parsed.html.clone(),
            headers: parsed.headers.clone(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(format!("encode inbox record: {e}")))?;

        self.kv
            .put(&kv::msg_key(user_id, &id), &value, Some(MESSAGE_TTL_SECS))
            .await?;
        debug!(id = %id, user_id = user_id, "Message stored");
        Ok(id)
    }

    /// Load one message record, if present and unexpired.
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<InboxRecord>, StoreError> {
        let value = self.kv.get(&kv::msg_key(user_id, id)).await?;
        match value {
            Some(json) => {
                let record = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(format!("decode inbox record: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List a user's stored messages in key order.
    pub async fn list(&self, user_id: &str) -> Result<Vec<InboxRecord>, StoreError> {
        let keys = self.kv.list_prefix(&kv::msg_prefix(user_id)).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            // A key can expire between the listing and the read.
            if let Some(json) = self.kv.get(&key).await? {
                let record = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(format!("decode inbox record: {e}")))?;
                records.push(record);
            }
        }
        Ok(records)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
