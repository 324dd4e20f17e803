use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vizflow_llm::LlmClient;
use vizflow_server::{AppState, ServerConfig, router};

/// Console logging, plus JSON files when `log_dir` is set. The returned
/// guard must live until exit so buffered file output is flushed.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vizflow_llm=debug,vizflow_server=debug"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("vizflow")
                .filename_suffix("log")
                .build(dir)
                .context("Failed to create log file appender")?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing FEATHERLESS_API_KEY makes clap exit here.
    let config = ServerConfig::parse();
    let _guard = init_tracing(config.log_dir.as_deref())?;

    let client = LlmClient::new(config.llm_config()).context("Failed to build HTTP client")?;
    let app = router(AppState {
        backend: client,
        settings: config.planner_settings(),
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        %addr,
        model = %config.model,
        prompt_style = %config.prompt_style,
        upstream = %config.base_url,
        "vizflow listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
