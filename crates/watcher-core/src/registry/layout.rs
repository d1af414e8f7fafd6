use crate::types::Network;

/// URL layout of the chain registry file hierarchy.
///
/// Mainnet chains live under `<base>/<mainnet_partition>/<name>/` and testnets under
/// `<base>/<testnet_partition>/<name>/`. An empty partition means the chain directory
/// sits directly under the base URL, which is how the Cosmos chain registry lays out
/// mainnets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLayout {
    base_url: String,
    mainnet_partition: String,
    testnet_partition: String,
}

impl RegistryLayout {
    #[must_use]
    pub fn new(base_url: &str, mainnet_partition: &str, testnet_partition: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            mainnet_partition: mainnet_partition.trim_matches('/').to_string(),
            testnet_partition: testnet_partition.trim_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chain_dir(&self, name: &str, network: Network) -> String {
        let partition = match network {
            Network::Mainnet => &self.mainnet_partition,
            Network::Testnet => &self.testnet_partition,
        };
        if partition.is_empty() {
            format!("{}/{name}", self.base_url)
        } else {
            format!("{}/{partition}/{name}", self.base_url)
        }
    }

    /// URL of the chain descriptor document.
    #[must_use]
    pub fn descriptor_url(&self, name: &str, network: Network) -> String {
        format!("{}/chain.json", self.chain_dir(name, network))
    }

    /// URL of the per-chain upgrade plan document.
    #[must_use]
    pub fn upgrade_plan_url(&self, name: &str, network: Network) -> String {
        format!("{}/upgrades.json", self.chain_dir(name, network))
    }
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self::new("https://raw.githubusercontent.com/cosmos/chain-registry/master", "", "testnets")
    }
}
