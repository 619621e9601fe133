//! Deploy manager - OCM orchestrator driver
//!
//! Pulls executable jobs from the job manager, dispatches them to an Open
//! Cluster Management hub as ManifestWorks, and reports status back.

use clap::Parser;
use ocm_daemon::config::{ControlPlaneKind, DaemonConfig};
use ocm_daemon::{DaemonError, DaemonResult, Server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Deploy manager CLI
#[derive(Parser)]
#[command(name = "deploy-manager")]
#[command(about = "OCM deploy manager - runs job manager jobs on an OCM hub", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DEPLOY_MANAGER_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "DEPLOY_MANAGER_LISTEN_ADDR")]
    listen: Option<String>,

    /// Job manager base URL
    #[arg(long, env = "JOBMANAGER_URL")]
    job_manager_url: Option<String>,

    /// Control plane backend (kubernetes, memory)
    #[arg(long)]
    control_plane: Option<ControlPlaneKind>,

    /// Kubeconfig used outside the hub cluster
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "DEPLOY_MANAGER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DEPLOY_MANAGER_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(url) = cli.job_manager_url {
        config.job_manager.base_url = url;
    }
    if let Some(kind) = cli.control_plane {
        config.control_plane.kind = kind;
    }
    if cli.kubeconfig.is_some() {
        config.control_plane.kubeconfig = cli.kubeconfig;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
  OCM Deploy Manager
  Version: {}
  Control plane: {:?}
  Job manager: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.control_plane.kind,
        config.job_manager.base_url,
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
