use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    registry::{RegistryClient, RegistryError, RegistryLayout},
    types::{ApiEndpoints, ChainDescriptor, Explorer, Network},
    utils::deserialize_height,
};

/// Raw `chain.json` document.
///
/// Accepts both the chain-registry layout (`chain_name`, `pretty_name`,
/// `codebase.recommended_version`) and the flat `name`/`version`/`height` layout some
/// mirrors publish.
#[derive(Debug, Default, Deserialize)]
pub struct ChainDocument {
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub pretty_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub codebase: Option<Codebase>,
    #[serde(default, deserialize_with = "deserialize_height")]
    pub height: i64,
    #[serde(default)]
    pub apis: DocumentApis,
    #[serde(default)]
    pub explorers: Vec<Explorer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Codebase {
    #[serde(default)]
    pub recommended_version: Option<String>,
    #[serde(default)]
    pub git_repo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentApis {
    #[serde(default)]
    pub rpc: Vec<AddressEntry>,
    #[serde(default)]
    pub rest: Vec<AddressEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressEntry {
    #[serde(default)]
    pub address: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ChainDocument {
    /// Converts the raw document into a [`ChainDescriptor`].
    ///
    /// `network` always comes from resolution; the document's own network hints are
    /// ignored. `fallback_name` is used when the document carries no name.
    #[must_use]
    pub fn into_descriptor(self, fallback_name: &str, network: Network) -> ChainDescriptor {
        let name = non_empty(self.chain_name)
            .or_else(|| non_empty(self.name))
            .unwrap_or_else(|| fallback_name.to_string());

        let current_version = non_empty(self.version)
            .or_else(|| self.codebase.and_then(|c| non_empty(c.recommended_version)))
            .unwrap_or_default();

        let addresses = |entries: Vec<AddressEntry>| -> Vec<String> {
            entries
                .into_iter()
                .map(|e| e.address.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect()
        };

        ChainDescriptor {
            name,
            network,
            chain_id: self.chain_id.unwrap_or_default(),
            pretty_name: non_empty(self.pretty_name),
            current_version,
            current_height: self.height.max(0),
            api_endpoints: ApiEndpoints {
                rpc: addresses(self.apis.rpc),
                rest: addresses(self.apis.rest),
            },
            explorers: self.explorers.into_iter().filter(|e| !e.url.is_empty()).collect(),
            last_resolved_at: Utc::now(),
        }
    }
}

/// Fetches and decodes chain descriptor documents from a resolved location.
pub struct MetadataFetcher {
    client: Arc<RegistryClient>,
    layout: RegistryLayout,
}

impl MetadataFetcher {
    #[must_use]
    pub fn new(client: Arc<RegistryClient>, layout: RegistryLayout) -> Self {
        Self { client, layout }
    }

    /// Fetches the descriptor for `canonical_name` under `network`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Transport`] for network failures
    /// - [`RegistryError::UpstreamStatus`] for non-2xx responses
    /// - [`RegistryError::Decode`] for HTML error pages or malformed JSON
    pub async fn fetch_descriptor(
        &self,
        canonical_name: &str,
        network: Network,
    ) -> Result<ChainDescriptor, RegistryError> {
        let url = self.layout.descriptor_url(canonical_name, network);
        let body = self.client.get_bytes(&url).await?;

        if body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<') {
            return Err(RegistryError::Decode(format!("{url}: received HTML instead of JSON")));
        }

        let document: ChainDocument = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::Decode(format!("{url}: {e}")))?;

        let descriptor = document.into_descriptor(canonical_name, network);
        tracing::debug!(
            chain = %descriptor.name,
            network = %network,
            chain_id = %descriptor.chain_id,
            version = %descriptor.current_version,
            "chain descriptor fetched"
        );
        Ok(descriptor)
    }
}
