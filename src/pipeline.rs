//! Ingest pipeline — runs one inbound email through the full flow.
//!
//! Flow: parse → detect → persist message → persist tasks → summarize →
//! notify. Persistence completes before summarization, so a summarizer
//! failure fails the request with the message and task writes already
//! committed. Notification failures are logged and never fail the request.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::detect::ActionDetector;
use crate::error::Result;
use crate::mail;
use crate::notify::Notifier;
use crate::store::{MessageStore, TaskStore};
use crate::summarize::Summarizer;

/// Outcome of one successful ingestion.
#[derive(Debug)]
pub struct IngestOutcome {
    pub msg_id: String,
    pub tasks_created: usize,
    pub summary: String,
}

/// Sequences the detector, stores, summarizer, and notifier per request.
///
/// Strictly sequential; no stage calls back into an earlier one. The only
/// shared state is the KV store behind the two record stores.
pub struct IngestPipeline {
    detector: ActionDetector,
    messages: MessageStore,
    tasks: TaskStore,
    summarizer: Summarizer,
    notifier: Arc<dyn Notifier>,
}

impl IngestPipeline {
    pub fn new(
        detector: ActionDetector,
        messages: MessageStore,
        tasks: TaskStore,
        summarizer: Summarizer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            detector,
            messages,
            tasks,
            summarizer,
            notifier,
        }
    }

    /// Ingest one raw email for a user.
    ///
    /// Errors before the message write leave no trace in the stores.
    /// Errors after it (summarizer, a late task write) leave the committed
    /// records in place; nothing is rolled back.
    pub async fn ingest(&self, user_id: &str, raw: &[u8]) -> Result<IngestOutcome> {
        let parsed = mail::parse_raw(raw)?;
        info!(
            user_id,
            from = %parsed.from,
            subject = %parsed.subject,
            "Ingesting message"
        );

        let candidates = self.detector.detect(&parsed).await;
        debug!(user_id, candidates = candidates.len(), "Detection complete");

        let msg_id = self.messages.insert(user_id, &parsed).await?;

        let mut tasks_created = 0;
        for candidate in &candidates {
            self.tasks.insert(user_id, &msg_id, candidate).await?;
            tasks_created += 1;
        }

        let summary = self.summarizer.summarize(&parsed, &candidates).await?;

        if let Err(e) = self.notifier.notify(user_id, &summary).await {
            warn!(user_id, error = %e, "Notification failed");
        }

        info!(user_id, msg_id = %msg_id, tasks_created, "Ingest complete");

        Ok(IngestOutcome {
            msg_id,
            tasks_created,
            summary,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, InferenceError};
    use crate::llm::InferenceBackend;
    use crate::store::memory::InMemoryKv;

    struct MockBackend {
        reply: std::result::Result<Option<String>, String>,
    }

    impl MockBackend {
        fn content(text: &str) -> Self {
            Self {
                reply: Ok(Some(text.to_string())),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                reply: Err(reason.to_string()),
            }
        }
    }

    #[async_trait]
    impl InferenceBackend for MockBackend {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
        ) -> std::result::Result<Option<String>, InferenceError> {
            match &self.reply {
                Ok(content) => Ok(content.clone()),
                Err(reason) => Err(InferenceError::RequestFailed {
                    backend: "mock".to_string(),
                    reason: reason.clone(),
                }),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct MockNotifier {
        calls: AtomicUsize,
        delivered: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delivered: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(&self, _user_id: &str, text: &str) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("delivery refused");
            }
            self.delivered.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct TestRig {
        pipeline: IngestPipeline,
        messages: MessageStore,
        tasks: TaskStore,
        notifier: Arc<MockNotifier>,
    }

    fn make_rig(backend: MockBackend, notifier: MockNotifier) -> TestRig {
        let kv: Arc<dyn crate::store::KvStore> = Arc::new(InMemoryKv::new());
        let backend: Arc<dyn InferenceBackend> = Arc::new(backend);
        let notifier = Arc::new(notifier);

        let pipeline = IngestPipeline::new(
            ActionDetector::new(backend.clone()),
            MessageStore::new(kv.clone()),
            TaskStore::new(kv.clone()),
            Summarizer::new(backend),
            notifier.clone() as Arc<dyn Notifier>,
        );

        TestRig {
            pipeline,
            messages: MessageStore::new(kv.clone()),
            tasks: TaskStore::new(kv),
            notifier,
        }
    }

    fn raw_email(subject: &str, body: &str) -> Vec<u8> {
        format!(
            "From: alice@example.com\r\nTo: me@example.com\r\nSubject: {subject}\r\n\r\n{body}\r\n"
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn happy_path_persists_and_notifies() {
        let rig = make_rig(MockBackend::content("Summary line."), MockNotifier::new());
        let raw = raw_email("Dentist", "Appointment at 3:00pm on Friday.");

        let outcome = rig.pipeline.ingest("u1", &raw).await.unwrap();

        assert_eq!(outcome.tasks_created, 1);
        assert_eq!(outcome.summary, "Summary line.");

        let stored = rig.messages.get("u1", &outcome.msg_id).await.unwrap().unwrap();
        assert_eq!(stored.subject, "Dentist");

        let tasks = rig.tasks.list("u1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].due, "3:00pm");
        assert_eq!(tasks[0].inbox_message_id, outcome.msg_id);

        assert_eq!(rig.notifier.call_count(), 1);
        let delivered = rig.notifier.delivered.lock().unwrap();
        assert_eq!(delivered.as_slice(), ["Summary line."]);
    }

    #[tokio::test]
    async fn tasks_created_matches_persisted_count() {
        let rig = make_rig(MockBackend::content("Summary."), MockNotifier::new());
        // No time token and no attachment: the detector falls back to
        // inference, whose mocked reply is not a JSON array, so zero tasks.
        let raw = raw_email("Newsletter", "Nothing actionable here.");

        let outcome = rig.pipeline.ingest("u1", &raw).await.unwrap();

        assert_eq!(outcome.tasks_created, 0);
        assert_eq!(rig.tasks.list("u1").await.unwrap().len(), 0);
        assert_eq!(rig.messages.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summarizer_failure_keeps_committed_writes() {
        let rig = make_rig(MockBackend::failing("bad gateway"), MockNotifier::new());
        let raw = raw_email("Dentist", "Appointment at 3:00pm.");

        let result = rig.pipeline.ingest("u1", &raw).await;
        assert!(matches!(result, Err(Error::Inference(_))));

        // Partial success: message and task records are already durable.
        assert_eq!(rig.messages.list("u1").await.unwrap().len(), 1);
        assert_eq!(rig.tasks.list("u1").await.unwrap().len(), 1);

        // The notifier never ran.
        assert_eq!(rig.notifier.call_count(), 0);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_the_request() {
        let rig = make_rig(MockBackend::content("Summary."), MockNotifier::failing());
        let raw = raw_email("Dentist", "Appointment at 3:00pm.");

        let outcome = rig.pipeline.ingest("u1", &raw).await.unwrap();

        assert_eq!(outcome.tasks_created, 1);
        assert_eq!(rig.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn unparsable_raw_writes_nothing() {
        let rig = make_rig(MockBackend::content("Summary."), MockNotifier::new());

        let result = rig.pipeline.ingest("u1", b"").await;
        assert!(matches!(result, Err(Error::Mail(_))));

        assert_eq!(rig.messages.list("u1").await.unwrap().len(), 0);
        assert_eq!(rig.tasks.list("u1").await.unwrap().len(), 0);
        assert_eq!(rig.notifier.call_count(), 0);
    }
}
