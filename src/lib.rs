//! mailsense — email-to-action ingestion service.

pub mod config;
pub mod detect;
pub mod error;
pub mod llm;
pub mod mail;
pub mod notify;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod summarize;
