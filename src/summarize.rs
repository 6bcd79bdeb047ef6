//! Summarizer — short natural-language digest of an ingested message.
//!
//! Primary/fallback chain: an optional local inference binding runs first;
//! if it is absent or fails, the HTTP backend gets the same prompt. An HTTP
//! failure propagates to the caller. An HTTP reply without usable content
//! degrades to a fixed one-line summary instead.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::detect::TaskCandidate;
use crate::error::InferenceError;
use crate::llm::{InferenceBackend, LocalInference};
use crate::mail::ParsedMessage;

/// Max tokens for the summary call (runs on every ingested message).
pub const SUMMARIZE_MAX_TOKENS: u32 = 256;

/// Summary used when the HTTP backend answers without usable content.
pub const DEFAULT_SUMMARY: &str = "New email received.";

/// An optional low-latency binding: the model to run and its runtime.
pub struct LocalBinding {
    pub model_id: String,
    pub runtime: Arc<dyn LocalInference>,
}

/// Produces the notification summary for an ingested message.
pub struct Summarizer {
    backend: Arc<dyn InferenceBackend>,
    local: Option<LocalBinding>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            local: None,
        }
    }

    /// Attach a local inference binding to try before the HTTP backend.
    pub fn with_local(mut self, model_id: impl Into<String>, runtime: Arc<dyn LocalInference>) -> Self {
        self.local = Some(LocalBinding {
            model_id: model_id.into(),
            runtime,
        });
        self
    }

    /// Summarize a message and its detected candidates.
    ///
    /// Errors only when the HTTP backend fails; a local-binding failure is
    /// recovered by falling back within the same request.
    pub async fn summarize(
        &self,
        parsed: &ParsedMessage,
        candidates: &[TaskCandidate],
    ) -> Result<String, InferenceError> {
        let prompt = build_summary_prompt(parsed, candidates);

        if let Some(local) = &self.local {
            match local
                .runtime
                .run(&local.model_id, &prompt, SUMMARIZE_MAX_TOKENS)
                .await
            {
                Ok(text) => {
                    debug!(model = %local.model_id, "Local inference produced summary");
                    return Ok(text.trim().to_string());
                }
                Err(e) => {
                    warn!(
                        model = %local.model_id,
                        error = %e,
                        "Local inference failed, falling back to HTTP backend"
                    );
                }
            }
        } else {
            debug!("No local inference binding configured, using HTTP backend");
        }

        match self.backend.complete(&prompt, SUMMARIZE_MAX_TOKENS).await? {
            Some(text) => Ok(text.trim().to_string()),
            None => Ok(DEFAULT_SUMMARY.to_string()),
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the summary prompt from the parsed message and candidate list.
fn build_summary_prompt(parsed: &ParsedMessage, candidates: &[TaskCandidate]) -> String {
    let candidates_json = serde_json::to_string(candidates).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::with_capacity(512);
    prompt.push_str(
        "Summarize this email in 2 sentences, then list its action items as bullet points.\n\n",
    );
    prompt.push_str(&format!("Subject: {}\n", parsed.subject));
    prompt.push_str(&format!("From: {}\n", parsed.from));
    prompt.push_str(&format!("Detected action items (JSON): {}\n", candidates_json));

    // Body preview (truncated for token efficiency)
    let body_preview: String = parsed.text.chars().take(2000).collect();
    prompt.push_str(&format!("\nBody:\n{}", body_preview));

    prompt
}

// ── Tests ───────────────────────────────────────────────────────────
