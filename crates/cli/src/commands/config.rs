use clap::Subcommand;
use std::path::Path;
use watcher_core::config::{AppConfig, ChainsConfig};

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file and its chain list
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show the effective configuration, including environment overrides
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,

        /// Show the Slack webhook URL
        #[arg(long)]
        show_sensitive: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, show_sensitive } => show_config(&file, show_sensitive),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    let chains = ChainsConfig::from_file(&config.chains_file).map_err(|e| {
        CliError::Config(format!("Chain list {} could not be loaded: {e}", config.chains_file))
    })?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Server: {}:{}", config.server.bind_address, config.server.bind_port);
    println!("  Registry: {}", config.registry.base_url);
    println!(
        "  Upgrade feed: {}",
        config.registry.upgrade_feed_url.as_deref().unwrap_or("disabled")
    );
    println!("  Cache TTL: {}s", config.cache.ttl_seconds);
    println!(
        "  Chains: {} mainnet, {} testnet ({})",
        chains.mainnet.len(),
        chains.testnet.len(),
        config.chains_file
    );
    let enabled = config.jobs.predefined.iter().filter(|j| j.enabled).count();
    println!("  Jobs: {enabled} of {} enabled", config.jobs.predefined.len());
    println!(
        "  Slack: {}",
        if config.notifications.slack_webhook().is_some() { "configured" } else { "not configured" }
    );

    Ok(())
}

fn show_config(file: &str, show_sensitive: bool) -> CliResult<()> {
    let mut config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;
    if !show_sensitive && config.notifications.slack_webhook_url.is_some() {
        config.notifications.slack_webhook_url = Some("[hidden - use --show-sensitive]".to_string());
    }

    let rendered =
        toml::to_string_pretty(&config).map_err(|e| CliError::General(e.to_string()))?;
    println!("# Effective configuration from {file}\n");
    println!("{rendered}");
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# Upgrade watcher configuration
# Every value below is the default. Any field can be overridden with
# WATCHER__SECTION__FIELD environment variables.

environment = "development"
chains_file = "config/chains.yaml"

[server]
bind_address = "127.0.0.1"
bind_port = 8080
request_timeout_seconds = 35

[registry]
base_url = "https://raw.githubusercontent.com/cosmos/chain-registry/master"
mainnet_partition = ""
testnet_partition = "testnets"
upgrade_feed_url = "https://polkachu.com/api/v2/chain_upgrades"
probe_timeout_ms = 3000
request_timeout_seconds = 5
max_concurrent_requests = 32

[cache]
ttl_seconds = 300
sweep_interval_seconds = 10

[fanout]
background_concurrency = 5
read_concurrency = 10
read_deadline_seconds = 30

[jobs]
max_concurrent = 3

[[jobs.predefined]]
name = "load-chains"
task = "load-chains"
interval_seconds = 3600
description = "Reload the chain list and prime the cache"

[[jobs.predefined]]
name = "registry-poller"
task = "refresh-registry"
interval_seconds = 60
description = "Refresh descriptors and upgrades for monitored chains"

[[jobs.predefined]]
name = "upgrade-checker"
task = "check-upgrades"
interval_seconds = 3600
description = "Notify about pending upgrades"

[notifications]
# slack_webhook_url = "https://hooks.slack.com/services/..."
notify_on_startup = true
startup_delay_seconds = 5

[logging]
level = "info"
format = "pretty"
"#;

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Remember to:");
    print_info("  1. List the chains to watch in the chains file");
    print_info("  2. Set SLACK_WEBHOOK_URL or notifications.slack_webhook_url");

    Ok(())
}
