//! Watcher runtime initialization and lifecycle management.
//!
//! Wires the [`ChainEngine`](crate::engine::ChainEngine), the job scheduler, the cache
//! sweeper and the startup notifier together, for both the HTTP server and embedded
//! use.
//!
//! # Example
//!
//! ```no_run
//! use watcher_core::{config::AppConfig, runtime::WatcherRuntime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let runtime = WatcherRuntime::builder().with_config(config).build()?;
//!     runtime.start().await?;
//!
//!     let upgrades = runtime.engine().collect_upgrades(None).await?;
//!     println!("{} pending upgrades", upgrades.upgrades.len());
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod lifecycle;

pub use builder::{RuntimeError, WatcherRuntimeBuilder};
pub use lifecycle::WatcherRuntime;
