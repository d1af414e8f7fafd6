use clap::{Parser, Subcommand};
use watcher_core::{config::AppConfig, types::Network};

mod commands;
use commands::{
    handle_config_command, list_upgrades, probe_chain, resolve_chain, show_upgrade,
    utils::{CliError, CliResult},
    ConfigCommands,
};

#[derive(Parser)]
#[command(name = "watcher-cli")]
#[command(about = "Operator tool for the Cosmos upgrade watcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "WATCHER_CONFIG", default_value = "config/config.toml")]
    config: String,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// HEAD and GET a chain's descriptor under both registry partitions
    Probe {
        chain: String,

        /// Timeout for each request in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Resolve a chain and print its descriptor
    Resolve {
        chain: String,

        /// Ignore any cached identity and re-probe
        #[arg(long)]
        refresh: bool,
    },

    /// Print the current upgrade for a chain
    Upgrade { chain: String },

    /// List pending upgrades for every chain in the chain list
    Upgrades {
        /// Only show one network (mainnet or testnet)
        #[arg(short, long, value_parser = parse_network)]
        network: Option<Network>,

        /// Chain list to use instead of the configured one
        #[arg(long)]
        chains: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn parse_network(value: &str) -> Result<Network, String> {
    value.parse()
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,watcher_core=debug,cli=debug"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &str) -> CliResult<AppConfig> {
    let config = AppConfig::from_file(path).map_err(|e| CliError::Config(e.to_string()))?;
    config.validate().map_err(CliError::Config)?;
    tracing::debug!(path = %path, registry = %config.registry.base_url, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Probe { chain, timeout } => {
            probe_chain(&load_config(&cli.config)?, &chain, timeout).await?;
        }

        Commands::Resolve { chain, refresh } => {
            resolve_chain(&load_config(&cli.config)?, &chain, refresh).await?;
        }

        Commands::Upgrade { chain } => {
            show_upgrade(&load_config(&cli.config)?, &chain).await?;
        }

        Commands::Upgrades { network, chains, json } => {
            list_upgrades(&load_config(&cli.config)?, network, chains.as_deref(), json).await?;
        }

        Commands::Config(config_command) => {
            handle_config_command(config_command)?;
        }
    }

    Ok(())
}
