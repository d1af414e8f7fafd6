//! Identity resolution against a mock registry.
//!
//! Covers partition assignment, name variations, path normalization and how failed
//! probes affect the outcome.

use crate::mock_infrastructure::RegistryMockBuilder;
use std::sync::Arc;
use watcher_core::{registry::RegistryError, types::Network};

#[tokio::test]
async fn test_mainnet_only_chain_resolves_as_mainnet() {
    let mut registry = RegistryMockBuilder::new().await;
    registry.mock_chain("cosmoshub", Network::Mainnet).await;
    let engine = registry.engine();

    let descriptor = engine.get_chain_info("cosmoshub", false).await.unwrap();

    assert_eq!(descriptor.name, "cosmoshub");
    assert_eq!(descriptor.network, Network::Mainnet);
    assert_eq!(descriptor.chain_id, "cosmoshub-1");
    assert_eq!(descriptor.primary_rpc(), Some("https://rpc.cosmoshub.example"));
    assert_eq!(descriptor.primary_rest(), Some("https://api.cosmoshub.example"));
}

#[tokio::test]
async fn test_numeric_suffix_resolves_to_same_chain() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("cosmoshub-1", Network::Mainnet, 404, None)
        .await
        .mock_probe("cosmoshub-1", Network::Testnet, 404, None)
        .await
        .mock_chain("cosmoshub", Network::Mainnet)
        .await;
    let engine = registry.engine();

    let plain = engine.get_chain_info("cosmoshub", false).await.unwrap();
    let suffixed = engine.get_chain_info("cosmoshub-1", false).await.unwrap();

    assert_eq!(suffixed.name, plain.name);
    assert_eq!(suffixed.network, Network::Mainnet);
    assert_eq!(suffixed.chain_id, plain.chain_id);
    assert_eq!(engine.store().identity("cosmoshub-1").unwrap().canonical_name, "cosmoshub");
}

#[tokio::test]
async fn test_name_variants_share_cache_entries() {
    let mut registry = RegistryMockBuilder::new().await;
    let document = crate::mock_infrastructure::chain_document("cosmoshub");
    registry
        .mock_probe("cosmoshub-1", Network::Mainnet, 404, Some(1))
        .await
        .mock_probe("cosmoshub-1", Network::Testnet, 404, Some(1))
        .await
        .mock_chain_document("cosmoshub", Network::Mainnet, &document, Some(1))
        .await
        .mock_no_upgrade_plan("cosmoshub", Network::Mainnet)
        .await
        .mock_feed(&[], Some(1))
        .await;
    let engine = registry.engine();

    let suffixed = engine.get_chain_info("cosmoshub-1", false).await.unwrap();
    let plain = engine.get_chain_info("cosmoshub", false).await.unwrap();
    let again = engine.get_chain_info("cosmoshub-1", false).await.unwrap();
    assert!(Arc::ptr_eq(&suffixed, &plain));
    assert!(Arc::ptr_eq(&suffixed, &again));

    assert!(engine.get_upgrade_info("cosmoshub-1", false).await.unwrap().is_none());
    assert!(engine.is_upgrade_cached("cosmoshub"));
    assert!(engine.get_upgrade_info("cosmoshub", false).await.unwrap().is_none());

    let stats = engine.store().stats();
    assert_eq!(stats.descriptors_present, 1);
    assert_eq!(stats.upgrades_absent, 1);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_testnet_only_chain_resolves_as_testnet() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("junotestnet", Network::Mainnet, 404, Some(1))
        .await
        .mock_chain("junotestnet", Network::Testnet)
        .await;
    let engine = registry.engine();

    let descriptor = engine.get_chain_info("junotestnet", false).await.unwrap();

    assert_eq!(descriptor.network, Network::Testnet);
    assert_eq!(descriptor.name, "junotestnet");
    registry.assert_all().await;
}

#[tokio::test]
async fn test_registry_urls_are_normalized() {
    let mut registry = RegistryMockBuilder::new().await;
    registry.mock_chain("osmosis", Network::Mainnet).await;
    let engine = registry.engine();

    let descriptor = engine
        .get_chain_info(
            "https://github.com/cosmos/chain-registry/blob/master/osmosis/chain.json",
            false,
        )
        .await
        .unwrap();

    assert_eq!(descriptor.name, "osmosis");
}

#[tokio::test]
async fn test_failed_mainnet_probe_still_finds_testnet() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("osmosistestnet", Network::Mainnet, 503, Some(1))
        .await
        .mock_chain("osmosistestnet", Network::Testnet)
        .await;
    let engine = registry.engine();

    let descriptor = engine.get_chain_info("osmosistestnet", false).await.unwrap();

    assert_eq!(descriptor.network, Network::Testnet);
    assert_eq!(descriptor.name, "osmosistestnet");
    registry.assert_all().await;
}

#[tokio::test]
async fn test_failed_probe_without_any_match_is_transient() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("akash", Network::Mainnet, 503, Some(1))
        .await
        .mock_probe("akash", Network::Testnet, 404, Some(1))
        .await;
    let engine = registry.engine();

    let err = engine.get_chain_info("akash", false).await.unwrap_err();

    assert!(matches!(err, RegistryError::UpstreamStatus(503, _)), "{err:?}");
    assert!(!err.is_not_found());
    assert_eq!(engine.store().stats().descriptors_absent, 0);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_blank_name_is_rejected_without_requests() {
    let registry = RegistryMockBuilder::new().await;
    let engine = registry.engine();

    for name in ["", "   ", "/chain.json"] {
        let err = engine.get_chain_info(name, false).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName(_)), "{name:?}: {err:?}");
    }
}

#[tokio::test]
async fn test_repeated_reads_are_identical() {
    let mut registry = RegistryMockBuilder::new().await;
    let document = crate::mock_infrastructure::chain_document("stargaze");
    registry.mock_chain_document("stargaze", Network::Mainnet, &document, Some(1)).await;
    let engine = registry.engine();

    let first = engine.get_chain_info("stargaze", false).await.unwrap();
    let first_json = serde_json::to_string(first.as_ref()).unwrap();
    for _ in 0..5 {
        let again = engine.get_chain_info("stargaze", false).await.unwrap();
        assert_eq!(serde_json::to_string(again.as_ref()).unwrap(), first_json);
    }
    registry.assert_all().await;
}
