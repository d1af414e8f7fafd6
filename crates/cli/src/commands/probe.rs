use futures::future::join_all;
use prettytable::{row, Table};
use std::time::{Duration, Instant};
use watcher_core::{
    config::AppConfig,
    registry::{normalize_chain_name, RegistryError, RegistryLayout},
    types::Network,
};

use super::utils::{print_info, print_success, CliError, CliResult};

/// Outcome of probing one partition URL.
#[derive(Debug)]
pub struct ProbeReport {
    pub network: Network,
    pub url: String,
    pub head_status: Result<u16, String>,
    pub get_status: Result<u16, String>,
    pub body_bytes: usize,
    pub elapsed: Duration,
}

impl ProbeReport {
    fn found(&self) -> bool {
        matches!(self.head_status, Ok(status) if (200..300).contains(&status))
    }
}

async fn probe_url(client: &reqwest::Client, network: Network, url: String) -> ProbeReport {
    let start = Instant::now();
    let head_status = client
        .head(&url)
        .send()
        .await
        .map(|r| r.status().as_u16())
        .map_err(|e| e.to_string());

    let (get_status, body_bytes) = match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let bytes = response.bytes().await.map(|b| b.len()).unwrap_or(0);
            (Ok(status), bytes)
        }
        Err(e) => (Err(e.to_string()), 0),
    };

    ProbeReport { network, url, head_status, get_status, body_bytes, elapsed: start.elapsed() }
}

/// Issues HEAD and GET against both partition URLs for `chain`.
pub async fn probe_reports(
    layout: &RegistryLayout,
    chain: &str,
    timeout: Duration,
) -> CliResult<Vec<ProbeReport>> {
    let name = normalize_chain_name(chain);
    if name.is_empty() {
        return Err(CliError::Registry(RegistryError::InvalidName(chain.to_string())));
    }

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let probes = [Network::Mainnet, Network::Testnet]
        .into_iter()
        .map(|network| probe_url(&client, network, layout.descriptor_url(&name, network)));
    Ok(join_all(probes).await)
}

fn status_cell(status: &Result<u16, String>) -> String {
    match status {
        Ok(code) => code.to_string(),
        Err(e) => format!("error: {e}"),
    }
}

pub async fn probe_chain(config: &AppConfig, chain: &str, timeout_secs: u64) -> CliResult<()> {
    let layout = RegistryLayout::new(
        &config.registry.base_url,
        &config.registry.mainnet_partition,
        &config.registry.testnet_partition,
    );
    print_info(&format!("Probing {chain} under {}...", layout.base_url()));

    let reports = probe_reports(&layout, chain, Duration::from_secs(timeout_secs)).await?;

    let mut table = Table::new();
    table.add_row(row!["Network", "HEAD", "GET", "Bytes", "Time", "URL"]);
    for report in &reports {
        table.add_row(row![
            report.network,
            status_cell(&report.head_status),
            status_cell(&report.get_status),
            report.body_bytes,
            format!("{}ms", report.elapsed.as_millis()),
            report.url
        ]);
    }
    table.printstd();

    match reports.iter().find(|r| r.found()) {
        Some(report) => print_success(&format!("{chain} exists on {}", report.network)),
        None => print_info(&format!("{chain} was not found under any partition")),
    }
    Ok(())
}
