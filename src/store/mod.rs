//! Persistence layer — namespaced key-value storage for messages and tasks.

pub mod kv;
pub mod libsql;
pub mod memory;
pub mod messages;
pub mod tasks;

pub use kv::KvStore;
pub use libsql::{LibSqlKv, spawn_purge_task};
pub use memory::InMemoryKv;
pub use messages::{InboxRecord, MESSAGE_TTL_SECS, MessageStore};
pub use tasks::{PersistedTask, TaskStatus, TaskStore};
