use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use captioner::{
    FetcherOptions, FileStore, HttpClientOptions, TranscriptFetcher, TranscriptStore,
    YouTubeProvider,
};
use captioner_server::AppState;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "captioner-server", about = "Serve cached video captions over HTTP")]
struct Cli {
    /// Bind address.
    #[arg(long, env = "CAPTIONER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP port.
    #[arg(long, env = "CAPTIONER_PORT", default_value = "8000")]
    port: u16,

    /// Transcript cache file (default: <data dir>/captioner/transcript_cache.json).
    #[arg(long, env = "CAPTIONER_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Log level, used when RUST_LOG is not set.
    #[arg(long, env = "CAPTIONER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Skip the public-IP lookup logged before each provider call.
    #[arg(long, env = "CAPTIONER_NO_IP_LOOKUP")]
    no_ip_lookup: bool,

    /// User-Agent sent to the caption provider.
    #[arg(long, env = "CAPTIONER_USER_AGENT")]
    user_agent: Option<String>,

    /// Provider request timeout in seconds.
    #[arg(long, env = "CAPTIONER_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut http = HttpClientOptions::new().timeout(Duration::from_secs(cli.timeout_secs))?;
    if let Some(user_agent) = &cli.user_agent {
        http = http.user_agent(user_agent.as_str());
    }
    let client = http.build_client().context("failed to build HTTP client")?;

    let cache_path = cli.cache_path.clone().unwrap_or_else(captioner::default_store_path);
    let store = Arc::new(
        FileStore::open(&cache_path)
            .with_context(|| format!("failed to open transcript cache {}", cache_path.display()))?,
    );

    let fetcher = TranscriptFetcher::new(
        store.clone(),
        Arc::new(YouTubeProvider::new(client.clone())),
        FetcherOptions::new().ip_lookup(!cli.no_ip_lookup),
    )
    .diagnostics_client(client);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, cache = %cache_path.display(), "captioner-server listening");

    let served = captioner_server::serve(listener, AppState::new(fetcher), shutdown_signal()).await;

    // Close even if the server failed, then report the first error.
    let closed = store.close().context("failed to close transcript cache");
    served.context("server error")?;
    closed?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
