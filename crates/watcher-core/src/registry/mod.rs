//! Chain registry access: identity resolution and descriptor fetching.
//!
//! - [`IdentityResolver`]: normalizes names and probes partitions with HEAD requests
//! - [`MetadataFetcher`]: fetches and decodes `chain.json` from a resolved location
//! - [`RegistryClient`]: shared HTTP client with request limiting
//! - [`RegistryLayout`]: URL scheme of the registry file hierarchy

pub mod errors;
pub mod fetcher;
pub mod http_client;
pub mod layout;
pub mod resolver;

pub use errors::RegistryError;
pub use fetcher::{ChainDocument, MetadataFetcher};
pub use http_client::{ProbeOutcome, RegistryClient, RegistryClientConfig};
pub use layout::RegistryLayout;
pub use resolver::{normalize_chain_name, IdentityResolver, ResolvedIdentity};
