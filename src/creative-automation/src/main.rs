//! Creative Automation turns campaign briefs into captioned social
//! renditions, generating missing product imagery on the way.
//!
//! `run` processes one brief file; `serve` exposes the same pipeline over HTTP.

use campaign_api::ApiServer;
use campaign_core::config::AppConfig;
use campaign_pipeline::PipelineOrchestrator;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "creative-automation")]
#[command(about = "Generate campaign creatives from a brief")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); environment overrides still apply
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key for the image-generation provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Provider project identifier
    #[arg(long, env = "OPENAI_PROJECT_ID", global = true)]
    project_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single brief and print the run summary as JSON
    Run {
        /// Brief file (.json, .yaml or .yml)
        #[arg(long)]
        brief: PathBuf,

        /// Asset root (overrides config)
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Output root (overrides config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "creative_automation=info,campaign_pipeline=info,campaign_integrations=info,campaign_dco=info,tower_http=info"
                    .into()
            }),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))?,
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(key) = cli.api_key {
        config.provider.api_key = key;
    }
    if let Some(project) = cli.project_id {
        config.provider.project_id = Some(project);
    }

    match cli.command {
        Command::Run {
            brief,
            assets_dir,
            output_dir,
        } => {
            if let Some(dir) = assets_dir {
                config.paths.assets_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            info!(
                brief = %brief.display(),
                assets_dir = %config.paths.assets_dir.display(),
                output_dir = %config.paths.output_dir.display(),
                model = %config.generation.model,
                "Configuration loaded"
            );

            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            let result = orchestrator.run(&brief).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = port {
                config.api.http_port = port;
            }
            info!(
                host = %config.api.host,
                http_port = config.api.http_port,
                metrics_port = config.metrics.port,
                "Configuration loaded"
            );

            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            let server = ApiServer::new(config.api.clone(), config.metrics.clone(), orchestrator);
            if let Err(e) = server.start_metrics() {
                error!(error = %e, "Failed to start metrics exporter");
            }
            info!("Creative Automation is ready to serve traffic");
            server.start_http().await?;
        }
    }

    Ok(())
}
