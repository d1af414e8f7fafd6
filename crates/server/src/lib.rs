//! HTTP API for the upgrade watcher.
//!
//! The binary in `main.rs` bootstraps logging and the [`WatcherRuntime`](watcher_core::runtime::WatcherRuntime);
//! this library holds the route table and handlers so they can be driven in tests.

pub mod handlers;
pub mod router;

pub use router::{create_app, create_router, AppState};
