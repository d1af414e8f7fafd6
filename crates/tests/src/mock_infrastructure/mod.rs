//! Mock Infrastructure for Testing the Upgrade Watcher
//!
//! This module provides reusable mock types for testing registry interactions
//! without requiring real network connections.
//!
//! ## Components
//!
//! - `RegistryMockBuilder`: Wraps mockito to serve chain descriptors, upgrade plans and
//!   the upgrade feed from one server
//! - Test helpers for documents, chain lists and a recording notification sink
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{RegistryMockBuilder, upgrade_plan};
//!
//! let mut registry = RegistryMockBuilder::new().await;
//! registry.mock_chain("juno", Network::Mainnet).await;
//! registry.mock_upgrade_plan("juno", Network::Mainnet, &upgrade_plan("v2", 100, 24)).await;
//!
//! let engine = registry.engine();
//! ```

pub mod registry_mock;
pub mod test_helpers;

pub use registry_mock::{RegistryMockBuilder, FEED_PATH, TESTNET_PARTITION};
pub use test_helpers::*;
