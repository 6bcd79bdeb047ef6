//! Action detection — turns a parsed message into task candidates.
//!
//! Three strategies run in fixed order:
//! 1. Time-token scan (regex, fast) — at most one candidate
//! 2. Calendar attachments (ICS line scan) — one candidate per invite
//! 3. Inference fallback — only when 1 and 2 found nothing
//!
//! Detection never fails: extraction problems, backend errors, and
//! malformed model output all degrade to fewer candidates.

pub mod calendar;
pub mod time_token;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::detect::time_token::TimeTokenStrategy;
use crate::llm::InferenceBackend;
use crate::mail::ParsedMessage;

/// Max tokens for the fallback extraction call (kept tight — the model
/// only returns a small JSON array).
const DETECT_MAX_TOKENS: u32 = 512;

/// A detected-but-not-yet-persisted task-like item. The due string is
/// verbatim from its source (regex match, ICS token, or model text) and
/// is never normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCandidate {
    pub title: String,
    pub due: String,
    pub recurrence: Option<String>,
}

/// Ordered strategy chain producing task candidates from a parsed message.
pub struct ActionDetector {
    time: TimeTokenStrategy,
    backend: Arc<dyn InferenceBackend>,
}

impl ActionDetector {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            time: TimeTokenStrategy::new(),
            backend,
        }
    }

    /// Run the strategy chain. Candidates from the time-token scan precede
    /// calendar candidates; the inference fallback runs only when both
    /// found nothing, and its output is then the entire result.
    pub async fn detect(&self, message: &ParsedMessage) -> Vec<TaskCandidate> {
        let mut candidates = Vec::new();

        if let Some(candidate) = self.time.scan(message) {
            debug!(due = %candidate.due, "Time-token strategy matched");
            candidates.push(candidate);
        }

        let from_calendar = calendar::scan(message);
        if !from_calendar.is_empty() {
            debug!(count = from_calendar.len(), "Calendar strategy matched");
            candidates.extend(from_calendar);
        }

        if candidates.is_empty() {
            candidates = self.infer(message).await;
        }

        candidates
    }

    /// Inference fallback — parse-or-empty, never an error.
    async fn infer(&self, message: &ParsedMessage) -> Vec<TaskCandidate> {
        let prompt = build_detection_prompt(message);

        match self.backend.complete(&prompt, DETECT_MAX_TOKENS).await {
            Ok(Some(content)) => {
                let candidates = parse_candidates(&content);
                debug!(count = candidates.len(), "Inference fallback parsed");
                candidates
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Inference fallback failed, detection degrades to empty"
                );
                Vec::new()
            }
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the extraction prompt from the lower-cased subject and body.
fn build_detection_prompt(message: &ParsedMessage) -> String {
    let content = format!("{}\n{}", message.subject, message.text).to_lowercase();
    // Truncated for token efficiency
    let preview: String = content.chars().take(2000).collect();

    format!(
        "Extract actionable items (meetings, reminders, deadlines) from this email.\n\
         Respond with ONLY a JSON array of objects, each with keys \"title\", \"due\", \
         and \"recurrence\" (null when the item does not repeat). \
         Respond with [] when there is nothing actionable.\n\n\
         Email:\n{preview}"
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// One array item as the model writes it; incomplete items are dropped.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    title: Option<String>,
    due: Option<String>,
    recurrence: Option<String>,
}

/// Parse model output into candidates. Malformed JSON, a non-array body,
/// or items missing title/due all degrade instead of erroring.
fn parse_candidates(raw: &str) -> Vec<TaskCandidate> {
    let json_str = extract_json_array(raw);
    let items: Vec<RawCandidate> = match serde_json::from_str(&json_str) {
        Ok(items) => items,
        Err(_) => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| {
            Some(TaskCandidate {
                title: item.title?,
                due: item.due?,
                recurrence: item.recurrence,
            })
        })
        .collect()
}

/// Extract a JSON array from model output (handles markdown wrapping).
fn extract_json_array(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON array
    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('[') {
                return inner.to_string();
            }
        }
    }

    // Try to find array bounds
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
