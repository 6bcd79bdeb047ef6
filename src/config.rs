//! Service configuration, built from environment variables.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Runtime configuration for the ingestion service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds on.
    pub port: u16,
    /// Path to the local libSQL database file.
    pub db_path: String,
    /// Chat-completions endpoint of the HTTP inference backend.
    pub inference_url: String,
    /// Model id sent to the HTTP inference backend.
    pub inference_model: String,
    /// Bearer credential for the HTTP inference backend.
    pub inference_api_key: SecretString,
    /// Model id for the low-latency binding, when one is wired in.
    pub local_model: Option<String>,
    /// Webhook URL for notifications. Absent means log-only delivery.
    pub webhook_url: Option<String>,
    /// Seconds between expired-row purge sweeps.
    pub purge_interval_secs: u64,
}

impl Config {
    /// Build config from environment variables.
    /// `MAILSENSE_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let inference_api_key = std::env::var("MAILSENSE_API_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("MAILSENSE_API_KEY".into()))?;

        let port: u16 = match std::env::var("MAILSENSE_PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAILSENSE_PORT".into(),
                message: format!("not a port number: {s}"),
            })?,
            Err(_) => 8080,
        };

        let db_path = std::env::var("MAILSENSE_DB_PATH")
            .unwrap_or_else(|_| "./data/mailsense.db".to_string());

        let inference_url = std::env::var("MAILSENSE_INFERENCE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());

        let inference_model =
            std::env::var("MAILSENSE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let local_model = std::env::var("MAILSENSE_LOCAL_MODEL").ok();

        let webhook_url = std::env::var("MAILSENSE_WEBHOOK_URL").ok();

        let purge_interval_secs: u64 = std::env::var("MAILSENSE_PURGE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            port,
            db_path,
            inference_url,
            inference_model,
            inference_api_key,
            local_model,
            webhook_url,
            purge_interval_secs,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
