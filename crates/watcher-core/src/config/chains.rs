//! The monitored chain list.
//!
//! ```yaml
//! mainnet:
//!   - name: cosmoshub
//!     display_name: Cosmos Hub
//!     network: mainnet
//! testnet:
//!   - name: osmosistestnet
//!     display_name: Osmosis Testnet
//!     network: testnet
//! ```
//!
//! The file format follows the extension (YAML, TOML or JSON).

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainEntry {
    /// Registry name or any spelling the resolver accepts.
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Informational only. The resolver decides the actual network.
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainsConfig {
    #[serde(default)]
    pub mainnet: Vec<ChainEntry>,

    #[serde(default)]
    pub testnet: Vec<ChainEntry>,
}

impl ChainsConfig {
    /// Reads the chain list from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(&path.as_ref().to_string_lossy()))
            .build()?
            .try_deserialize()
    }

    /// All chain names, mainnet first, in file order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.mainnet.iter().chain(&self.testnet).map(|entry| entry.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mainnet.len() + self.testnet.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds an entry by exact name in either list.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ChainEntry> {
        self.mainnet.iter().chain(&self.testnet).find(|entry| entry.name == name)
    }
}
