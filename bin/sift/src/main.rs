//! Sift - paginated list API.
//!
//! # Usage
//!
//! ```bash
//! # Start against PostgreSQL
//! DATABASE_URL=postgres://localhost/sift sift
//!
//! # Start with a seeded in-memory store, no database needed
//! sift --in-memory
//!
//! # Continuation links behind a proxy
//! PROTOCOL=https HOST=api.example.com sift
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use sift_core::metrics::init_metrics;
use sift_core::pagination::{EngineConfig, PaginationEngine};
use sift_core::ports::Repositories;
use sift_core::query::RequestLimits;
use sift_http::{AppState, ServerConfig, serve_with_shutdown};
use sift_storage::{Database, DatabaseConfig, MemoryRepositories, PgRepositories};

/// Sift CLI - paginated list API.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(about = "Sift - paginated and filtered list endpoints")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/sift")]
    database_url: String,

    /// HTTP server port.
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Externally visible base URL for continuation links.
    /// Takes precedence over PROTOCOL and HOST.
    #[arg(long, env = "PUBLIC_URL")]
    public_url: Option<String>,

    /// Scheme used for continuation links when no public URL is set.
    #[arg(long, env = "PROTOCOL", default_value = "http")]
    protocol: String,

    /// Host (and port) used for continuation links when no public URL is set.
    /// Defaults to localhost on the server port.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Page size when `take` is absent.
    #[arg(long, env = "DEFAULT_TAKE", default_value = "20")]
    default_take: u32,

    /// Upper bound on `take`.
    #[arg(long, env = "MAX_TAKE", default_value = "100")]
    max_take: u32,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run database migrations and exit.
    #[arg(long, conflicts_with = "in_memory")]
    migrate_only: bool,

    /// Serve a seeded in-memory dataset instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        ensure!(self.default_take > 0, "DEFAULT_TAKE must be positive");
        ensure!(
            self.max_take >= self.default_take,
            "MAX_TAKE ({}) must not be below DEFAULT_TAKE ({})",
            self.max_take,
            self.default_take
        );

        let public_url = match &self.public_url {
            Some(raw) => Url::parse(raw).with_context(|| format!("Invalid PUBLIC_URL '{}'", raw))?,
            None => {
                let host = self
                    .host
                    .clone()
                    .unwrap_or_else(|| format!("localhost:{}", self.port));
                EngineConfig::from_protocol_and_host(&self.protocol, &host)
                    .with_context(|| format!("Invalid PROTOCOL/HOST '{}://{}'", self.protocol, host))?
                    .public_url
            }
        };

        Ok(EngineConfig {
            public_url,
            limits: RequestLimits {
                default_take: self.default_take,
                max_take: self.max_take,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Sift");
    let engine_config = cli.engine_config()?;
    debug!(
        public_url = %engine_config.public_url,
        default_take = engine_config.limits.default_take,
        max_take = engine_config.limits.max_take,
        "Pagination settings"
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ STORAGE
    // ─────────────────────────────────────────────────────────────────────────
    let (repositories, db): (Arc<dyn Repositories>, Option<Database>) = if cli.in_memory {
        info!("🧪 Using seeded in-memory store");
        let seeded: Arc<dyn Repositories> =
            Arc::new(MemoryRepositories::demo(chrono::Utc::now()).await);
        (seeded, None)
    } else {
        debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");
        info!("🗄️  Connecting to database...");
        let db = Database::connect(&DatabaseConfig::for_api(&cli.database_url))
            .await
            .context("Failed to connect to database")?;

        db.migrate().await.context("Failed to run migrations")?;
        info!("🗄️  Database ready (migrations applied)");

        if cli.migrate_only {
            info!("🛑 --migrate-only flag set, exiting");
            db.close().await;
            return Ok(());
        }

        let repositories: Arc<dyn Repositories> = Arc::new(PgRepositories::new(&db));
        (repositories, Some(db))
    };

    let engine = Arc::new(PaginationEngine::new(engine_config));
    let state = AppState::new(engine, repositories);

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVER START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server_config = ServerConfig {
        port: cli.port,
        ..Default::default()
    };

    let server_handle = tokio::spawn(
        async move {
            let shutdown_signal = async move {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            };

            if let Err(e) = serve_with_shutdown(state, server_config, shutdown_signal).await {
                error!(error = %e, "❌ Server error");
            }
            debug!("Server stopped");
        }
        .instrument(info_span!("http")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Sift ready");
    info!("   ⚡ API:      http://localhost:{}/posts", cli.port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(Duration::from_secs(10), server_handle).await {
        Ok(_) => debug!("HTTP server stopped"),
        Err(_) => warn!("⚠️  HTTP server shutdown timed out"),
    }

    if let Some(db) = db {
        db.close().await;
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("sift").chain(args.iter().copied()))
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://sift:secret@db:5432/sift"),
            "postgres://sift:****@db:5432/sift"
        );
        assert_eq!(mask_password("not a url"), "not a url");
    }

    #[test]
    fn test_public_url_from_protocol_and_host() {
        let config = cli(&["--protocol", "https", "--host", "api.example.com"])
            .engine_config()
            .unwrap();
        assert_eq!(config.public_url.as_str(), "https://api.example.com/");

        let config = cli(&["--public-url", "https://example.com/api/"])
            .engine_config()
            .unwrap();
        assert_eq!(config.public_url.path(), "/api/");
    }

    #[test]
    fn test_take_limits_are_validated() {
        assert!(cli(&["--default-take", "0"]).engine_config().is_err());
        assert!(cli(&["--default-take", "50", "--max-take", "10"]).engine_config().is_err());

        let config = cli(&["--default-take", "10", "--max-take", "50"])
            .engine_config()
            .unwrap();
        assert_eq!(config.limits.default_take, 10);
        assert_eq!(config.limits.max_take, 50);
    }
}
