use chrono::{DateTime, Utc};
use prettytable::{row, Table};
use std::sync::Arc;
use watcher_core::{
    config::{AppConfig, ChainsConfig},
    engine::ChainEngine,
    types::{Network, UpgradeRecord},
    utils::format_time_until,
};

use super::utils::{or_dash, print_error, print_info, print_success, CliError, CliResult};

fn build_engine(config: &AppConfig) -> CliResult<Arc<ChainEngine>> {
    Ok(Arc::new(ChainEngine::from_config(config)?))
}

/// Resolves one chain and prints its descriptor as JSON.
pub async fn resolve_chain(config: &AppConfig, chain: &str, refresh: bool) -> CliResult<()> {
    let engine = build_engine(config)?;
    let descriptor = engine.get_chain_info(chain, refresh).await?;
    println!("{}", serde_json::to_string_pretty(descriptor.as_ref())?);
    Ok(())
}

/// Prints the current upgrade for one chain as JSON, or `null`.
pub async fn show_upgrade(config: &AppConfig, chain: &str) -> CliResult<()> {
    let engine = build_engine(config)?;
    let record = engine.get_upgrade_info(chain, false).await?;
    match &record {
        Some(record) if record.is_pending() => {
            println!("{}", serde_json::to_string_pretty(record.as_ref())?);
        }
        _ => {
            print_info(&format!("No pending upgrade for {chain}"));
            println!("null");
        }
    }
    Ok(())
}

pub(crate) fn upgrades_table(records: &[Arc<UpgradeRecord>], now: DateTime<Utc>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Chain", "Network", "Upgrade", "Version", "Height", "Estimated Time", "In", "Folder"]);
    for record in records {
        table.add_row(row![
            record.chain_name,
            record.network,
            record.upgrade_name,
            record.version_label,
            record.target_height,
            record.target_time.format("%Y-%m-%d %H:%M UTC"),
            format_time_until(record.target_time - now),
            or_dash(record.cosmovisor_folder.as_deref())
        ]);
    }
    table
}

/// Loads the chain list and prints every pending upgrade.
pub async fn list_upgrades(
    config: &AppConfig,
    network: Option<Network>,
    chains_file: Option<&str>,
    as_json: bool,
) -> CliResult<()> {
    let path = chains_file.unwrap_or(&config.chains_file);
    let chains = ChainsConfig::from_file(path)
        .map_err(|e| CliError::Config(format!("Failed to load chain list {path}: {e}")))?;
    if chains.is_empty() {
        print_error(&format!("Chain list {path} is empty"));
        return Ok(());
    }

    let engine = build_engine(config)?;
    engine.set_monitored_chains(chains.names());
    if !as_json {
        print_info(&format!("Checking {} chains...", chains.len()));
    }

    let report = engine.collect_upgrades(network).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report.upgrades)?);
        return Ok(());
    }

    if report.upgrades.is_empty() {
        print_info("No pending upgrades");
    } else {
        upgrades_table(&report.upgrades, Utc::now()).printstd();
        print_success(&format!("{} pending upgrades", report.upgrades.len()));
    }

    for (chain, error) in &report.failed {
        print_error(&format!("{chain}: {error}"));
    }
    Ok(())
}
