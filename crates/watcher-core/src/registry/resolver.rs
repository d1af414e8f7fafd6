//! Chain identity resolution.
//!
//! Turns a noisy, user- or config-supplied chain name into a canonical registry
//! directory name plus the partition it lives under. Resolution only issues HEAD
//! probes; document bodies are fetched later by the metadata fetcher.
//!
//! # Probe Order
//!
//! ```text
//! normalize("https://github.com/cosmos/chain-registry/tree/master/osmosis-1/chain.json")
//!     └─► "osmosis-1"
//!
//! 1. <base>/osmosis-1/chain.json            (mainnet)
//! 2. <base>/testnets/osmosis-1/chain.json   (testnet)
//! 3. <base>/osmosis/chain.json              (numeric suffix stripped)
//! 4. <base>/testnets/osmosis/chain.json
//! ```
//!
//! Names ending in `testnet` get one more round with that suffix removed, probing the
//! testnet partition first. The first probe answering 2xx wins.

use std::sync::Arc;

use crate::{
    registry::{ProbeOutcome, RegistryClient, RegistryError, RegistryLayout},
    types::Network,
};

/// Path segments that never name a chain.
const IGNORED_SEGMENTS: [&str; 4] = ["chain.json", "testnets", "master", "upgrades.json"];

/// Canonical identity of a chain within the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub canonical_name: String,
    pub network: Network,
}

/// Normalizes a raw chain name.
///
/// Path-like input is reduced to its last meaningful segment, a trailing file
/// extension is dropped, and surrounding whitespace and slashes are trimmed. Returns
/// an empty string when nothing usable remains.
#[must_use]
pub fn normalize_chain_name(raw: &str) -> String {
    let trimmed = raw.trim();

    let segment = if trimmed.contains('/') {
        trimmed
            .rsplit('/')
            .map(str::trim)
            .find(|part| {
                !part.is_empty() &&
                    !IGNORED_SEGMENTS.contains(part) &&
                    !part.to_ascii_lowercase().contains("github")
            })
            .unwrap_or("")
    } else {
        trimmed
    };

    let without_extension = match segment.rfind('.') {
        Some(idx) => &segment[..idx],
        None => segment,
    };

    without_extension.trim().trim_matches('/').to_string()
}

/// Strips a `-<digits>` or `_<digits>` suffix, e.g. `osmosis-1` → `osmosis`.
#[must_use]
pub fn strip_numeric_suffix(name: &str) -> Option<&str> {
    let idx = name.rfind(&['-', '_'][..])?;
    let (base, suffix) = (&name[..idx], &name[idx + 1..]);
    if base.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(base)
}

/// Strips a trailing `testnet` marker, e.g. `junotestnet` or `juno-testnet` → `juno`.
#[must_use]
pub fn strip_testnet_suffix(name: &str) -> Option<&str> {
    let lower = name.to_ascii_lowercase();
    if !lower.ends_with("testnet") {
        return None;
    }
    let base = name[..name.len() - "testnet".len()].trim_end_matches(&['-', '_'][..]);
    (!base.is_empty()).then_some(base)
}

/// Builds the ordered list of `(candidate name, partition)` probes for a normalized name.
fn probe_plan(name: &str) -> Vec<(String, Network)> {
    let mut plan: Vec<(String, Network)> = Vec::with_capacity(8);
    let mut push = |candidate: &str, order: [Network; 2]| {
        for network in order {
            let entry = (candidate.to_string(), network);
            if !plan.contains(&entry) {
                plan.push(entry);
            }
        }
    };

    let default_order = [Network::Mainnet, Network::Testnet];
    push(name, default_order);
    if let Some(base) = strip_numeric_suffix(name) {
        push(base, default_order);
    }

    if let Some(base) = strip_testnet_suffix(name) {
        let testnet_first = [Network::Testnet, Network::Mainnet];
        push(base, testnet_first);
        if let Some(inner) = strip_numeric_suffix(base) {
            push(inner, testnet_first);
        }
    }

    plan
}

/// Resolves chain names to registry identities by probing the partition hierarchy.
pub struct IdentityResolver {
    client: Arc<RegistryClient>,
    layout: RegistryLayout,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(client: Arc<RegistryClient>, layout: RegistryLayout) -> Self {
        Self { client, layout }
    }

    #[must_use]
    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    /// Resolves `raw_name` to its canonical name and partition.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidName`] if the name normalizes to nothing (no requests
    ///   are made)
    /// - [`RegistryError::NotFound`] if every probe answered with a 4xx
    /// - [`RegistryError::Transport`] or [`RegistryError::UpstreamStatus`] (the first
    ///   inconclusive probe's error) if no probe confirmed existence and at least one
    ///   probe was inconclusive
    pub async fn resolve(&self, raw_name: &str) -> Result<ResolvedIdentity, RegistryError> {
        let name = normalize_chain_name(raw_name);
        if name.is_empty() {
            return Err(RegistryError::InvalidName(raw_name.to_string()));
        }

        let mut inconclusive: Option<RegistryError> = None;
        for (candidate, network) in probe_plan(&name) {
            let url = self.layout.descriptor_url(&candidate, network);
            match self.client.probe(&url).await {
                ProbeOutcome::Exists => {
                    tracing::debug!(
                        chain = %name,
                        canonical = %candidate,
                        network = %network,
                        "chain identity resolved"
                    );
                    return Ok(ResolvedIdentity { canonical_name: candidate, network });
                }
                ProbeOutcome::Missing(status) => {
                    tracing::trace!(url = %url, status = status, "chain variation not present");
                }
                ProbeOutcome::Inconclusive(e) => {
                    tracing::warn!(chain = %name, url = %url, error = %e, "registry probe inconclusive");
                    inconclusive.get_or_insert(e);
                }
            }
        }

        // Nothing exists, but a failed probe means absence is not confirmed.
        match inconclusive {
            Some(e) => Err(e),
            None => Err(RegistryError::NotFound(name)),
        }
    }
}
