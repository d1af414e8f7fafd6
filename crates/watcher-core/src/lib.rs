//! # Watcher Core
//!
//! Chain identity resolution and upgrade tracking for Cosmos chain registries.
//!
//! - **[`registry`]**: name normalization, partition probing and descriptor fetching
//!   against a hierarchical chain registry.
//!
//! - **[`upgrades`]**: the two upgrade sources and the merger that reconciles them
//!   into one canonical [`UpgradeRecord`](types::UpgradeRecord).
//!
//! - **[`cache`]**: TTL caches with negative entries, the identity index and per-chain
//!   resolution locks.
//!
//! - **[`engine`]**: [`ChainEngine`](engine::ChainEngine), the single entry point for
//!   lookups, plus bounded fan-out over the monitored chain set.
//!
//! - **[`jobs`]** and **[`scheduler`]**: periodic chain loading, polling and upgrade
//!   checks.
//!
//! - **[`notify`]**: Slack notifications and calendar links.
//!
//! - **[`runtime`]**: assembles everything from [`config`] and handles shutdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ChainEngine                          │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────┐  │
//! │  │ IdentityResolver │  │ MetadataFetcher  │  │ ChainStore │  │
//! │  └────────┬─────────┘  └────────┬─────────┘  └────────────┘  │
//! │           │  HEAD probes        │  GET chain.json            │
//! │           └──────────┬──────────┘                            │
//! │                ┌─────▼──────────┐                            │
//! │                │ RegistryClient │◄──── UpgradeSourceMerger   │
//! │                └────────────────┘      (plan, then feed)     │
//! └──────────────────────────────────────────────────────────────┘
//!        ▲                    ▲                     ▲
//!   HTTP API (server)    Scheduler jobs       Startup notifier
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod jobs;
pub mod notify;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod types;
pub mod upgrades;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
