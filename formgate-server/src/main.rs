// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  formgate — contact-form webhook relay
//
//  Front door:  axum on tokio, one task per connection
//  Persistence: per-form JSON append log
//  Delivery:    Slack chat.postMessage, one attempt per request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::Parser;
use formgate_core::{RelayConfig, TemplateRegistry};
use formgate_http::server::AppState;
use formgate_notify::Notifier;
use formgate_store::AppendLog;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "formgate", version, about = "formgate — relay contact form submissions to Slack")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "formgate.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Override the append-log output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Override the templates directory
    #[arg(long)]
    templates_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "formgate starting");

    // ── Config ──
    let mut config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        RelayConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        RelayConfig::default()
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.out_dir {
        config.storage.out_dir = dir;
    }
    if let Some(dir) = cli.templates_dir {
        config.templates.dir = dir;
    }
    config.validate()?;

    // The append log never creates its output directory.
    if !config.storage.out_dir.is_dir() {
        anyhow::bail!(
            "{}: no such file or directory",
            config.storage.out_dir.display()
        );
    }

    // ── Template registry ──
    let registry = TemplateRegistry::load(&config.templates.dir)?;
    info!(routes = ?registry.route_names(), "Templates compiled");

    // ── Front door state ──
    let state = Arc::new(AppState {
        base_path: config.server.base_path.clone(),
        registry,
        log: AppendLog::new(&config.storage.out_dir),
        notifier: Notifier::new(&config),
    });

    // ── Serve until a termination signal arrives ──
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    formgate_http::server::start(addr, state, shutdown_signal()).await?;

    info!("formgate stopped, goodbye");
    Ok(())
}

/// Resolves on SIGHUP / SIGINT / SIGTERM / SIGQUIT.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
    let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut quit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");

    tokio::select! {
        _ = hangup.recv() => {}
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
    info!("Shutdown signal received, stopping...");
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, stopping...");
}
