//! Cache behavior: negative entries, uncached transient failures and coalescing of
//! concurrent resolutions for the same chain.

use futures::future::join_all;
use std::sync::Arc;
use watcher_core::{registry::RegistryError, types::Network};

use crate::mock_infrastructure::{chain_document, RegistryMockBuilder};

#[tokio::test]
async fn test_missing_chain_is_negatively_cached() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_probe("ghostchain", Network::Mainnet, 404, Some(1))
        .await
        .mock_probe("ghostchain", Network::Testnet, 404, Some(1))
        .await;
    let engine = registry.engine();

    for _ in 0..3 {
        let err = engine.get_chain_info("ghostchain", false).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)), "{err:?}");
    }

    let stats = engine.store().stats();
    assert_eq!(stats.descriptors_absent, 1);
    assert_eq!(stats.descriptors_present, 0);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mut registry = RegistryMockBuilder::new().await;
    registry.mock_probe("flaky", Network::Mainnet, 502, Some(2)).await;
    let engine = registry.engine();

    assert!(engine.get_chain_info("flaky", false).await.unwrap_err().is_transient());
    assert!(engine.get_chain_info("flaky", false).await.unwrap_err().is_transient());

    assert_eq!(engine.store().stats().descriptors_absent, 0);
    registry.assert_all().await;
}

#[tokio::test]
async fn test_concurrent_descriptor_reads_resolve_once() {
    let mut registry = RegistryMockBuilder::new().await;
    registry.mock_chain_document("juno", Network::Mainnet, &chain_document("juno"), Some(1)).await;
    let engine = registry.engine();

    let reads = (0..20).map(|_| {
        let engine = Arc::clone(&engine);
        async move { engine.get_chain_info("juno", false).await }
    });
    let results: Vec<_> = join_all(reads).await.into_iter().map(Result::unwrap).collect();

    assert!(results.iter().all(|d| Arc::ptr_eq(d, &results[0])));
    registry.assert_all().await;
}

#[tokio::test]
async fn test_concurrent_upgrade_reads_resolve_once() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain_document("evmos", Network::Mainnet, &chain_document("evmos"), Some(1))
        .await
        .mock_no_upgrade_plan("evmos", Network::Mainnet)
        .await
        .mock_feed(&[crate::mock_infrastructure::feed_item("evmos", 900, 12)], Some(1))
        .await;
    let engine = registry.engine();

    let reads = (0..10).map(|_| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.get_upgrade_info("evmos", false).await })
    });
    let records: Vec<_> = join_all(reads)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().unwrap())
        .collect();

    assert!(records.iter().all(|r| r.target_height == 900));
    assert!(records.iter().all(|r| Arc::ptr_eq(r, &records[0])));
    registry.assert_all().await;
}

#[tokio::test]
async fn test_forced_refresh_bypasses_cache() {
    let mut registry = RegistryMockBuilder::new().await;
    registry.mock_chain_document("akash", Network::Mainnet, &chain_document("akash"), Some(2)).await;
    let engine = registry.engine();

    let cached = engine.get_chain_info("akash", false).await.unwrap();
    let refreshed = engine.get_chain_info("akash", true).await.unwrap();
    let after = engine.get_chain_info("akash", false).await.unwrap();

    assert!(!Arc::ptr_eq(&cached, &refreshed));
    assert!(Arc::ptr_eq(&refreshed, &after));
    registry.assert_all().await;
}

#[tokio::test]
async fn test_no_upgrade_is_cached() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("stride", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("stride", Network::Mainnet)
        .await
        .mock_feed(&[], Some(1))
        .await;
    let engine = registry.engine();

    assert!(engine.get_upgrade_info("stride", false).await.unwrap().is_none());
    assert!(engine.is_upgrade_cached("stride"));
    assert!(engine.get_upgrade_info("stride", false).await.unwrap().is_none());
    registry.assert_all().await;
}
