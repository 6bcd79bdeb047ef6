//! Notifier — fire-and-forget delivery of the ingest summary.
//!
//! No delivery acknowledgment, no retry, no persisted notification event.
//! A failed delivery is the caller's to log; it never fails the request.

use async_trait::async_trait;
use tracing::{debug, info};

/// Delivery seam for ingest notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, text: &str) -> anyhow::Result<()>;
}

/// POSTs `{userId, text}` as JSON to a configured webhook URL.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "userId": user_id,
            "text": text,
        });

        let resp = self.client.post(&self.url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned {status}: {detail}");
        }

        debug!(user_id, "Notification delivered");
        Ok(())
    }
}

/// Logs the summary instead of delivering it anywhere.
/// Used when no webhook URL is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        info!(user_id, text, "Notification (log only)");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::extract::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    use super::*;

    /// Bind a one-route webhook receiver on a random port.
    async fn start_hook(status: StatusCode) -> u16 {
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| async move {
                assert!(body.get("userId").is_some());
                assert!(body.get("text").is_some());
                status
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn webhook_delivers_json_payload() {
        let port = start_hook(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(format!("http://127.0.0.1:{port}/hook"));

        let result = notifier.notify("u1", "Lunch at noon.").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn webhook_non_success_status_is_an_error() {
        let port = start_hook(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(format!("http://127.0.0.1:{port}/hook"));

        let result = notifier.notify("u1", "Lunch at noon.").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.notify("u1", "anything").await.is_ok());
    }
}
