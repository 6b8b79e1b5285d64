use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memoir::api::{create_router, AppState};
use memoir::config::{Config, LogFormat};
use memoir::db::{Database, DatabaseBackend, LibSqlBackend};
use memoir::embeddings::EmbeddingProvider;
use memoir::llm::LlmProvider;
use memoir::migration;

#[derive(Parser)]
#[command(name = "memoir")]
#[command(about = "Self-hostable AI diary with a past-self chat")]
struct Args {
    /// Force rebuild embeddings when dimension mismatch detected
    #[arg(long)]
    rebuild_embeddings: bool,
}

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "memoir=info,tower_http=debug".into());
    let json = config.server.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "MEMOIR_API_KEYS is not set. The diary API is open to anyone who can reach {}:{}",
            config.server.host,
            config.server.port
        );
    }

    tracing::info!("Loading embedding model: {}...", config.embeddings.model);
    let embeddings = EmbeddingProvider::new_async(&config.embeddings).await?;

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database, embeddings.dimensions()).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db));

    match migration::check_dimension_compatibility(&*db, &embeddings, args.rebuild_embeddings)
        .await?
    {
        migration::MigrationDecision::NotNeeded => {}
        migration::MigrationDecision::Approved => {
            let embedded =
                migration::rebuild_embeddings(&*db, &embeddings, embeddings.dimensions()).await?;
            tracing::info!(embedded, "Memories re-embedded");
        }
        migration::MigrationDecision::Rejected => {
            tracing::error!("Migration rejected. Cannot start with dimension mismatch.");
            return Err(anyhow::anyhow!(
                "Embedding dimension mismatch - use --rebuild-embeddings flag to force migration"
            ));
        }
    }

    migration::embed_pending_records(&*db, &embeddings).await?;

    tracing::info!("Initializing LLM provider: {}...", config.llm.model);
    let llm = LlmProvider::new(&config.llm);
    if !llm.is_available() {
        tracing::warn!(
            "LLM unavailable - requests must carry their own key in `apiKey` or X-Api-Key"
        );
    }

    let state = AppState::new(config.clone(), db, embeddings, llm);

    let cancel_token = CancellationToken::new();

    let sessions = state.sessions.store().clone();
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Session sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(SESSION_SWEEP_INTERVAL) => {
                    sessions.sweep_idle();
                }
            }
        }
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Memoir starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
