//! Command-line entry point for running the server.
//!
//! Shared by the `streamlined` binary and the `streamline --mode server`
//! mode selector.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigFile, ConfigOverrides, ServerConfig};
use crate::registry::spawn_registry;
use crate::server::ChatServer;
use crate::transport::TransportProvider;

/// Server options. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (0 or absent picks a free port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Password clients must send before choosing a nickname
    #[arg(long)]
    pub password: Option<String>,

    /// Number of connections relayed concurrently
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Path to config.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Accept nicknames with characters other than letters and digits
    #[arg(long)]
    pub allow_any_nickname: bool,
}

impl ServerArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            max_workers: self.max_workers,
            allow_any_nickname: self.allow_any_nickname,
        }
    }

    /// Loads the config file and applies these flags on top.
    pub fn resolve_config(&self) -> Result<ServerConfig> {
        let file = ConfigFile::discover(self.config.as_deref())?;
        let config = ServerConfig::resolve(file, self.overrides())?;
        Ok(config)
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` is honoured; the defaults keep the server at `info` and the
/// client quiet. Output goes to stderr.
pub fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("streamlined=info".parse()?)
                .add_directive("streamline_client=warn".parse()?),
        )
        .init();
    Ok(())
}

/// Runs the server until SIGINT/SIGTERM.
pub async fn run(args: ServerArgs) -> Result<()> {
    let config = args.resolve_config().context("Failed to load configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "StreamLine server starting"
    );

    let transport = TransportProvider::from_config(config.tls.as_ref())
        .context("Failed to set up transport")?;

    let cancel_token = CancellationToken::new();

    watch_for_shutdown(wait_for_shutdown_signal(), cancel_token.clone());

    let registry = spawn_registry();
    info!("Participant registry started");

    let server = ChatServer::bind(&config, transport, registry, cancel_token).await?;
    let address = server.local_addr()?;
    println!(
        "StreamLine server listening on {}:{}{}",
        config.host,
        address.port(),
        if config.password.is_some() { " (password required)" } else { "" }
    );

    server.run().await?;

    info!("StreamLine server stopped");
    Ok(())
}

/// Cancels `token` once `signal` resolves.
///
/// If the signal handlers cannot be installed the server keeps running;
/// only a received signal stops it.
pub fn watch_for_shutdown<F>(signal: F, token: CancellationToken) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                info!("Shutdown signal received");
                token.cancel();
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for shutdown signals");
            }
        }
    })
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
pub async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
