mod config;
mod data_aquisition;
mod logging;
mod network;
mod parsers;
mod server;
mod topology;

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::{
    config::{Settings, load_inventory},
    data_aquisition::probe::SshProber,
    logging::{LogArgs, init_logging},
    network::device::ProbeResult,
    server::AppState,
    topology::{TopologyResponse, discover, respond},
};

/// Layer-2 topology discovery for Cisco switches using STP and CDP.
#[derive(Debug, Parser)]
#[command(name = "stp-topology", version, about)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Args)]
struct OutputArgs {
    /// Keep blocked links in the graph, flagged, instead of removing them.
    #[arg(long)]
    annotated: bool,

    /// Print the leveled tree instead of JSON.
    #[arg(long, conflicts_with = "full")]
    tree: bool,

    /// Print the whole response (summary, blocked interfaces, timing) instead of just the graph.
    #[arg(long)]
    full: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe every device in the inventory and print the topology.
    Graph {
        /// JSON array of device descriptors.
        #[arg(long)]
        inventory: PathBuf,
        /// TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Build the topology from previously saved probe results without touching the network.
    Build {
        #[arg(long)]
        results: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Serve the topology over HTTP.
    Serve {
        #[arg(long)]
        inventory: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides `server.listen` from the settings file.
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match cli.command {
        Command::Graph {
            inventory,
            config,
            output,
        } => {
            let settings = Settings::load(config.as_deref())?;
            let devices = load_inventory(&inventory)?;
            let prober = SshProber::new(&settings.collector);
            let response = discover(&prober, &devices, settings.collector.max_workers).await;
            print_response(&response, &output)
        }
        Command::Build { results, output } => {
            let text = std::fs::read_to_string(&results)
                .with_context(|| format!("failed to read {}", results.display()))?;
            let results: Vec<ProbeResult> = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse probe results {}", results.display()))?;
            let response = respond(results, Instant::now());
            print_response(&response, &output)
        }
        Command::Serve {
            inventory,
            config,
            listen,
        } => {
            let settings = Settings::load(config.as_deref())?;
            let devices = load_inventory(&inventory)?;
            info!(devices = devices.len(), "inventory loaded");
            let state = AppState {
                prober: Arc::new(SshProber::new(&settings.collector)),
                inventory: Arc::new(devices),
                max_workers: settings.collector.max_workers,
            };
            server::serve(listen.unwrap_or(settings.server.listen), state).await?;
            Ok(())
        }
    }
}

fn print_response(response: &TopologyResponse, output: &OutputArgs) -> Result<()> {
    if response.error {
        bail!("{}", response.error_description);
    }
    if output.tree {
        print!("{}", response.graph(output.annotated).render_tree());
    } else if output.full {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&response.graph(output.annotated))?);
    }
    Ok(())
}
