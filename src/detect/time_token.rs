//! Time-token strategy — first am/pm time mention in subject or body.

use regex::Regex;

use crate::detect::TaskCandidate;
use crate::mail::ParsedMessage;

/// Title used when the message has no subject to borrow.
const UNTITLED: &str = "Untitled reminder";

/// Scans for an hour token (1-2 digits), optional minutes, and an am/pm
/// marker. At most one candidate per message; the matched substring is
/// kept verbatim as the due string.
pub struct TimeTokenStrategy {
    re: Regex,
}

impl TimeTokenStrategy {
    pub fn new() -> Self {
        Self {
            re: Regex::new(r"(?i)\b\d{1,2}(:\d{2})?\s?(am|pm)\b").unwrap(),
        }
    }

    /// First match over `subject + "\n" + body`; scanning does not re-run
    /// per attachment.
    pub fn scan(&self, message: &ParsedMessage) -> Option<TaskCandidate> {
        let haystack = format!("{}\n{}", message.subject, message.text);
        let found = self.re.find(&haystack)?;

        let title = if message.subject.is_empty() {
            UNTITLED.to_string()
        } else {
            message.subject.clone()
        };

        Some(TaskCandidate {
            title,
            due: found.as_str().to_string(),
            recurrence: None,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
