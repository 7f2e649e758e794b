//! Diagnostic CLI for the Vite bridge.
//!
//! Resolves the configuration the application would see and reports on it:
//! the merged config, the proxy decision and dev server liveness, the
//! environment passed to Vite, and the watched files digest.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use vite_bridge::config::watcher::ConfigWatcher;
use vite_bridge::observability::logging::{init_logging, DEFAULT_FILTER};
use vite_bridge::{ConfigOptions, Registry};

#[derive(Parser)]
#[command(name = "vite-bridge")]
#[command(about = "Inspect the Vite integration of an application", long_about = None)]
struct Cli {
    /// Application root (defaults to the working directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Mode, e.g. development or production (defaults to RACK_ENV)
    #[arg(short, long, global = true)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration
    Config,
    /// Report the proxy decision and whether the dev server is up
    Check,
    /// Print the VITE_RUBY* variables passed to Vite
    Env,
    /// Print the digest of the watched source files
    Digest,
    /// Reload whenever the config file changes, until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(DEFAULT_FILTER);
    let cli = Cli::parse();

    let options = ConfigOptions {
        root: cli.root,
        mode: cli.mode,
        ..Default::default()
    };
    let registry = Registry::new();
    registry.reload(options.clone());

    match cli.command {
        Commands::Config => {
            let config = registry.config()?;
            println!("{}", serde_json::to_string_pretty(&*config)?);
        }
        Commands::Check => {
            let instance = registry.instance();
            let config = instance.config()?;
            let run_proxy = instance.run_proxy();
            let dev_server_running = instance.dev_server_running().await;
            let report = json!({
                "mode": config.mode,
                "dev_server_url": config.dev_server_url()?.to_string(),
                "run_proxy": run_proxy,
                "dev_server_running": dev_server_running,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Env => {
            println!("{}", serde_json::to_string_pretty(&*registry.env())?);
        }
        Commands::Digest => {
            println!("{}", registry.digest()?);
        }
        Commands::Watch => watch(&registry, options).await?,
    }

    Ok(())
}

async fn watch(registry: &Registry, options: ConfigOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = registry.config()?;
    let path = config.config_file();
    if !path.exists() {
        return Err(format!("config file {} does not exist", path.display()).into());
    }

    let (watcher, mut updates) = ConfigWatcher::new(&path, &config.mode);
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            Some(_) = updates.recv() => {
                let instance = registry.reload(options.clone());
                match instance.config() {
                    Ok(config) => tracing::info!(
                        dev_server = %config.host_with_port(),
                        public_output_dir = %config.public_output_dir,
                        "Configuration reloaded"
                    ),
                    Err(e) => tracing::error!(error = %e, "Reloaded configuration is invalid"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
