//! Registry Mock Builder for chain-registry and upgrade-feed testing
//!
//! Wraps mockito so one server plays both the hierarchical chain registry
//! (`/<name>/chain.json`, `/testnets/<name>/chain.json`, `upgrades.json`) and the
//! shared upgrade feed.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use std::sync::Arc;
use watcher_core::{config::AppConfig, engine::ChainEngine, types::Network};

use super::test_helpers::chain_document;

/// Path the upgrade feed is served from.
pub const FEED_PATH: &str = "/api/v2/chain_upgrades";

/// Testnet partition directory used by [`RegistryMockBuilder::config`].
pub const TESTNET_PARTITION: &str = "testnets";

/// Builder for a mock chain registry.
pub struct RegistryMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
    counted: Vec<Mock>,
}

impl RegistryMockBuilder {
    /// Creates a builder with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new(), counted: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    #[must_use]
    pub fn feed_url(&self) -> String {
        format!("{}{FEED_PATH}", self.server.url())
    }

    /// Default configuration pointed at this server, with every periodic job disabled.
    #[must_use]
    pub fn config(&self) -> AppConfig {
        Self::config_for(&self.url())
    }

    /// Default configuration pointed at a registry served from `url`.
    #[must_use]
    pub fn config_for(url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.registry.base_url = url.to_string();
        config.registry.mainnet_partition = String::new();
        config.registry.testnet_partition = TESTNET_PARTITION.to_string();
        config.registry.upgrade_feed_url = Some(format!("{url}{FEED_PATH}"));
        for job in &mut config.jobs.predefined {
            job.enabled = false;
        }
        config
    }

    /// Engine built from [`Self::config`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn engine(&self) -> Arc<ChainEngine> {
        Self::engine_with(&self.config())
    }

    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn engine_with(config: &AppConfig) -> Arc<ChainEngine> {
        Arc::new(ChainEngine::from_config(config).expect("engine builds"))
    }

    fn keep(&mut self, mock: Mock, counted: bool) {
        if counted {
            self.counted.push(mock);
        } else {
            self.mocks.push(mock);
        }
    }

    fn chain_path(name: &str, network: Network, file: &str) -> String {
        match network {
            Network::Mainnet => format!("/{name}/{file}"),
            Network::Testnet => format!("/{TESTNET_PARTITION}/{name}/{file}"),
        }
    }

    /// Answers the existence probe for `name` under `network` with `status`.
    pub async fn mock_probe(
        &mut self,
        name: &str,
        network: Network,
        status: usize,
        expect: Option<usize>,
    ) -> &mut Self {
        let mut mock = self
            .server
            .mock("HEAD", Self::chain_path(name, network, "chain.json").as_str())
            .with_status(status);
        if let Some(n) = expect {
            mock = mock.expect(n);
        }
        let mock = mock.create_async().await;
        self.keep(mock, expect.is_some());
        self
    }

    /// Serves a descriptor document for `name` under `network`, probe included.
    pub async fn mock_chain(&mut self, name: &str, network: Network) -> &mut Self {
        self.mock_chain_document(name, network, &chain_document(name), None).await
    }

    /// Serves `document` for `name`, optionally asserting how often it is fetched.
    pub async fn mock_chain_document(
        &mut self,
        name: &str,
        network: Network,
        document: &Value,
        fetch_expect: Option<usize>,
    ) -> &mut Self {
        self.mock_probe(name, network, 200, fetch_expect).await;
        let mut mock = self
            .server
            .mock("GET", Self::chain_path(name, network, "chain.json").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(document.to_string());
        if let Some(n) = fetch_expect {
            mock = mock.expect(n);
        }
        let mock = mock.create_async().await;
        self.keep(mock, fetch_expect.is_some());
        self
    }

    /// Serves an `upgrades.json` document for `name`.
    pub async fn mock_upgrade_plan(&mut self, name: &str, network: Network, plan: &Value) -> &mut Self {
        let mock = self
            .server
            .mock("GET", Self::chain_path(name, network, "upgrades.json").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(plan.to_string())
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Answers `upgrades.json` for `name` with 404.
    pub async fn mock_no_upgrade_plan(&mut self, name: &str, network: Network) -> &mut Self {
        let mock = self
            .server
            .mock("GET", Self::chain_path(name, network, "upgrades.json").as_str())
            .with_status(404)
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Answers every `upgrades.json` request with 404.
    pub async fn mock_no_upgrade_plans(&mut self) -> &mut Self {
        let mock = self
            .server
            .mock("GET", Matcher::Regex(r"/upgrades\.json$".to_string()))
            .with_status(404)
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Serves the upgrade feed, optionally asserting how often it is fetched.
    pub async fn mock_feed(&mut self, entries: &[Value], expect: Option<usize>) -> &mut Self {
        let mut mock = self
            .server
            .mock("GET", FEED_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(Value::Array(entries.to_vec()).to_string());
        if let Some(n) = expect {
            mock = mock.expect(n);
        }
        let mock = mock.create_async().await;
        self.keep(mock, expect.is_some());
        self
    }

    /// Serves the upgrade feed with an arbitrary body, such as an HTML error page.
    pub async fn mock_feed_body(&mut self, content_type: &str, body: &str) -> &mut Self {
        let mock = self
            .server
            .mock("GET", FEED_PATH)
            .with_status(200)
            .with_header("content-type", content_type)
            .with_body(body)
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Checks every mock that was created with an expected hit count.
    pub async fn assert_all(&self) {
        for mock in &self.counted {
            mock.assert_async().await;
        }
    }
}
