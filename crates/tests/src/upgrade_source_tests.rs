//! Upgrade source merging: registry plan first, shared feed as fallback.

use watcher_core::types::{Network, UpgradeSource};

use crate::mock_infrastructure::{chain_document, feed_item, upgrade_plan, RegistryMockBuilder};

#[tokio::test]
async fn test_registry_plan_takes_priority_over_feed() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("osmosis", Network::Mainnet)
        .await
        .mock_upgrade_plan("osmosis", Network::Mainnet, &upgrade_plan("v26", 500, 48))
        .await
        .mock_feed(&[feed_item("osmosis", 999, 24)], Some(0))
        .await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("osmosis", false).await.unwrap().unwrap();

    assert_eq!(record.source, UpgradeSource::RegistryPlan);
    assert_eq!(record.target_height, 500);
    assert_eq!(record.upgrade_name, "v26");
    assert_eq!(record.version_label, "v26.0.0");
    assert_eq!(record.cosmovisor_folder.as_deref(), Some("upgrades/v26"));
    assert_eq!(
        record.block_explorer_link.as_deref(),
        Some("https://www.mintscan.io/osmosis/blocks/500")
    );
    assert_eq!(record.rpc_endpoint.as_deref(), Some("https://rpc.osmosis.example"));
    assert_eq!(record.api_endpoint.as_deref(), Some("https://api.osmosis.example"));
    assert!(record.estimated);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_feed_fills_in_when_registry_has_no_plan() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("juno", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("juno", Network::Mainnet)
        .await
        .mock_feed(&[feed_item("cosmoshub", 1, 1), feed_item("juno", 7_000_000, 30)], Some(1))
        .await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("juno", false).await.unwrap().unwrap();

    assert_eq!(record.source, UpgradeSource::UpgradeFeed);
    assert_eq!(record.chain_name, "juno");
    assert_eq!(record.target_height, 7_000_000);
    assert_eq!(record.upgrade_name, "v3.0.0");
    assert_eq!(record.version_label, "v3.0.0");
    assert_eq!(record.proposal_link.as_deref(), Some("17"));
    assert_eq!(record.git_hash.as_deref(), Some("0123abcd"));
    assert_eq!(record.cosmovisor_folder.as_deref(), Some("v3"));
    assert_eq!(record.guide, "https://docs.example/upgrade");
    registry.assert_all().await;
}

#[tokio::test]
async fn test_placeholder_plan_falls_through_to_feed() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("akash", Network::Mainnet)
        .await
        .mock_upgrade_plan("akash", Network::Mainnet, &upgrade_plan("v1", 0, 5))
        .await
        .mock_feed(&[feed_item("akash", 12_345, 5)], Some(1))
        .await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("akash", false).await.unwrap().unwrap();

    assert_eq!(record.source, UpgradeSource::UpgradeFeed);
    assert_eq!(record.target_height, 12_345);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_feed_match_ignores_case() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("stargaze", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("stargaze", Network::Mainnet)
        .await
        .mock_feed(&[feed_item("Stargaze", 42, 3)], None)
        .await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("stargaze", false).await.unwrap().unwrap();

    assert_eq!(record.target_height, 42);
    assert_eq!(record.chain_name, "stargaze");
}

#[tokio::test]
async fn test_feed_matches_pretty_name() {
    let mut registry = RegistryMockBuilder::new().await;
    let mut document = chain_document("persistence");
    document["pretty_name"] = "Persistence One".into();
    registry
        .mock_chain_document("persistence", Network::Mainnet, &document, None)
        .await
        .mock_no_upgrade_plan("persistence", Network::Mainnet)
        .await;
    let mut item = feed_item("core", 77, 3);
    item["chain_name"] = "Persistence One".into();
    registry.mock_feed(&[item], None).await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("persistence", false).await.unwrap().unwrap();

    assert_eq!(record.target_height, 77);
    assert_eq!(record.chain_name, "persistence");
}

#[tokio::test]
async fn test_html_feed_means_no_upgrade() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("evmos", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("evmos", Network::Mainnet)
        .await
        .mock_feed_body("text/html", "<html><body>Bad Gateway</body></html>")
        .await;
    let engine = registry.engine();

    assert!(engine.get_upgrade_info("evmos", false).await.unwrap().is_none());
    assert!(engine.is_upgrade_cached("evmos"));
}

#[tokio::test]
async fn test_testnet_upgrade_reports_testnet() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("osmosistestnet", Network::Mainnet, 404, None)
        .await
        .mock_chain("osmosistestnet", Network::Testnet)
        .await
        .mock_upgrade_plan("osmosistestnet", Network::Testnet, &upgrade_plan("v27", 1_000, 6))
        .await
        .mock_feed(&[], Some(0))
        .await;
    let engine = registry.engine();

    let record = engine.get_upgrade_info("osmosistestnet", false).await.unwrap().unwrap();

    assert_eq!(record.network, Network::Testnet);
    assert_eq!(record.chain_name, "osmosistestnet");
    assert_eq!(record.target_height, 1_000);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_missing_chain_has_no_upgrade_lookup() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("nochain", Network::Mainnet, 404, None)
        .await
        .mock_probe("nochain", Network::Testnet, 404, None)
        .await
        .mock_feed(&[], Some(0))
        .await;
    let engine = registry.engine();

    let err = engine.get_upgrade_info("nochain", false).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!engine.is_upgrade_cached("nochain"));
    registry.assert_all().await;
}
