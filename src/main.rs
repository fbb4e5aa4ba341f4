use batch_dl::{Config, TaskManager, run_with_shutdown};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Download batches of URLs submitted over HTTP
#[derive(Parser, Debug)]
#[command(name = "batch-dl")]
#[command(version)]
#[command(about = "Accepts URL batches over HTTP and downloads them in the background", long_about = None)]
struct Cli {
    /// JSON configuration file; every setting has a default
    #[arg(long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Address for the HTTP API (overrides the configuration file)
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Directory downloaded files are written to
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    download_dir: Option<PathBuf>,

    /// Snapshot file holding task state across restarts
    #[arg(long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    snapshot: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> batch_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.server.api.bind_address = bind;
        }
        if let Some(dir) = self.download_dir {
            config.download.download_dir = dir;
        }
        if let Some(path) = self.snapshot {
            config.persistence.snapshot_path = path;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        bind = %config.server.api.bind_address,
        download_dir = %config.download_dir().display(),
        snapshot = %config.snapshot_path().display(),
        "Starting batch-dl"
    );

    let manager = Arc::new(TaskManager::new(config).await?);
    run_with_shutdown(manager).await?;
    Ok(())
}
