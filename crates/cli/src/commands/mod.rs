pub mod chains;
pub mod config;
pub mod probe;
pub mod utils;

pub use chains::{list_upgrades, resolve_chain, show_upgrade};
pub use config::{handle_config_command, ConfigCommands};
pub use probe::probe_chain;
