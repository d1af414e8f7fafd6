//! Small parsing and formatting helpers shared across modules.
//!
//! - `flexible`: serde helpers for upstream fields that arrive as either numbers or
//!   strings (block heights in the registry and the upgrade feed)
//! - `duration`: human-readable "time until" formatting for notifications

pub mod duration;
pub mod flexible;

pub use duration::format_time_until;
pub use flexible::{deserialize_height, parse_height, parse_timestamp_or_now};
