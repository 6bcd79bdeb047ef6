use std::sync::Arc;

use mailsense::config::Config;
use mailsense::detect::ActionDetector;
use mailsense::llm::{HttpInference, InferenceBackend};
use mailsense::notify::{LogNotifier, Notifier, WebhookNotifier};
use mailsense::pipeline::IngestPipeline;
use mailsense::server::ingest_routes;
use mailsense::store::{self, KvStore, LibSqlKv, MessageStore, TaskStore};
use mailsense::summarize::Summarizer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export MAILSENSE_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("📬 mailsense v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.inference_model);
    if let Some(ref model) = config.local_model {
        eprintln!("   Local model: {}", model);
    }
    eprintln!("   Store: {}", config.db_path);
    eprintln!("   Ingest API: http://0.0.0.0:{}/ingest", config.port);
    match config.webhook_url {
        Some(ref url) => eprintln!("   Notifier: webhook {}", url),
        None => eprintln!("   Notifier: log only"),
    }
    eprintln!();

    // ── Store ────────────────────────────────────────────────────────
    let kv = Arc::new(
        LibSqlKv::new_local(std::path::Path::new(&config.db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open store at {}: {}", config.db_path, e);
                std::process::exit(1);
            }),
    );

    // Spawn expired-row purge sweep
    let _purge_handle = store::spawn_purge_task(kv.clone(), config.purge_interval_secs);

    let kv: Arc<dyn KvStore> = kv;

    // ── Inference ────────────────────────────────────────────────────
    let backend: Arc<dyn InferenceBackend> = Arc::new(HttpInference::new(
        config.inference_url.clone(),
        config.inference_model.clone(),
        config.inference_api_key.clone(),
    ));

    let summarizer = Summarizer::new(backend.clone());
    if let Some(ref model) = config.local_model {
        tracing::warn!(
            model,
            "MAILSENSE_LOCAL_MODEL is set but no local runtime is linked in; using HTTP backend only"
        );
    }

    // ── Pipeline ─────────────────────────────────────────────────────
    let notifier: Arc<dyn Notifier> = match config.webhook_url {
        Some(ref url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    };

    let pipeline = Arc::new(IngestPipeline::new(
        ActionDetector::new(backend.clone()),
        MessageStore::new(kv.clone()),
        TaskStore::new(kv.clone()),
        summarizer,
        notifier,
    ));

    // ── Server ───────────────────────────────────────────────────────
    let app = ingest_routes(
        pipeline,
        Arc::new(MessageStore::new(kv.clone())),
        Arc::new(TaskStore::new(kv)),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Ingest server started");
    axum::serve(listener, app).await?;

    Ok(())
}
