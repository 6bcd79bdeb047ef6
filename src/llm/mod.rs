//! Inference backends for detection and summarization.
//!
//! Two seams: [`InferenceBackend`] is the HTTP chat-completions path used by
//! the detector's fallback strategy and the summarizer's fallback leg;
//! [`LocalInference`] is the optional low-latency binding the summarizer
//! tries first when one is wired in.

pub mod http;
pub mod local;

pub use http::HttpInference;
pub use local::LocalInference;

use async_trait::async_trait;

use crate::error::InferenceError;

/// A chat-style inference backend.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send one user prompt and return the first choice's message content.
    ///
    /// `Ok(None)` means the backend answered with a well-formed response
    /// object that carries no usable content; callers degrade rather than
    /// fail. Transport errors, non-2xx statuses, and bodies that do not
    /// decode as a chat response are `Err`.
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Option<String>, InferenceError>;

    /// Backend label for logs.
    fn name(&self) -> &str;
}
