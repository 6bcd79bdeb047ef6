//! TaskStore — persists detected tasks as JSON under namespaced KV keys.
//!
//! Task keys carry no TTL. A task routinely outlives the message it came
//! from; the `inbox_message_id` link can therefore dangle after 30 days.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detect::TaskCandidate;
use crate::error::StoreError;
use crate::store::kv::{self, KvStore};

/// Origin tag recorded on every task created by email ingestion.
pub const TASK_SOURCE_EMAIL: &str = "email";

/// Lifecycle state of a task. Ingestion only ever creates `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
}

/// A stored task derived from one detected candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTask {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Verbatim due text from the detector. Never normalized.
    pub due: String,
    pub recurrence: Option<String>,
    pub source: String,
    pub inbox_message_id: String,
    pub created_at: DateTime<Utc>,
    pub status: TaskStatus,
}

/// Task storage over the shared KV backend.
pub struct TaskStore {
    kv: Arc<dyn KvStore>,
}

impl TaskStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Persist one candidate as a pending task. Returns the generated id.
    pub async fn insert(
        &self,
        user_id: &str,
        inbox_message_id: &str,
        candidate: &TaskCandidate,
    ) -> Result<String, StoreError> {
        let id = kv::new_record_id();
        let task = PersistedTask {
            id: id.clone(),
            user_id: user_id.to_string(),
            title: candidate.title.clone(),
            due: candidate.due.clone(),
            recurrence: candidate.recurrence.clone(),
            source: TASK_SOURCE_EMAIL.to_string(),
            inbox_message_id: inbox_message_id.to_string(),
            created_at: Utc::now(),
            status: TaskStatus::Pending,
        };
        let value = serde_json::to_string(&task)
            .map_err(|e| StoreError::Serialization(format!("encode task: {e}")))?;

        self.kv.put(&kv::task_key(user_id, &id), &value, None).await?;
        debug!(id = %id, user_id = user_id, title = %task.title, "Task stored");
        Ok(id)
    }

    /// Load one task, if present.
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<PersistedTask>, StoreError> {
        let value = self.kv.get(&kv::task_key(user_id, id)).await?;
        match value {
            Some(json) => {
                let task = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(format!("decode task: {e}")))?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// List a user's tasks in key order.
    pub async fn list(&self, user_id: &str) -> Result<Vec<PersistedTask>, StoreError> {
        let keys = self.kv.list_prefix(&kv::task_prefix(user_id)).await?;
        let mut tasks = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(json) = self.kv.get(&key).await? {
                let task = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(format!("decode task: {e}")))?;
                tasks.push(task);
            }
        }
        Ok(tasks)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
