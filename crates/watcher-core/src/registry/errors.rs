use thiserror::Error;

/// Errors produced while resolving or fetching chain registry documents.
///
/// The variants form the failure taxonomy used by the cache: some outcomes are
/// remembered as negative entries for a TTL window, others are left uncached so the
/// next cycle retries them. See [`RegistryError::is_cacheable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// The chain name was empty, or normalized down to nothing.
    #[error("Invalid chain name: {0:?}")]
    InvalidName(String),

    /// The name does not exist under any registry partition.
    #[error("Chain not found: {0}")]
    NotFound(String),

    /// DNS, connect, reset or timeout while talking to an upstream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    ///
    /// First field is the HTTP status code, second is the requested URL.
    #[error("Upstream returned HTTP {0} for {1}")]
    UpstreamStatus(u16, String),

    /// Upstream body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// More than one equally valid match was found. Currently unused: the first
    /// match wins.
    #[error("Ambiguous chain name: {0}")]
    Ambiguous(String),

    /// An aggregate operation exceeded its deadline.
    #[error("Request timeout")]
    Timeout,
}

impl RegistryError {
    /// Returns `true` if this outcome should be stored as a negative cache entry.
    ///
    /// Definitive answers (missing chain, 4xx, malformed body) are cached so a
    /// persistently broken chain is probed at most once per TTL window.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Decode(_) | Self::Ambiguous(_) => true,
            Self::UpstreamStatus(status, _) => (400..=499).contains(status) && *status != 429,
            _ => false,
        }
    }

    /// Returns `true` if the failure is likely to clear on its own and should be
    /// retried on the next refresh cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::UpstreamStatus(status, _) => (500..=599).contains(status) || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if the chain definitively does not resolve.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidName(_))
    }

    /// Returns a static label for logs and API error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "invalid_name",
            Self::NotFound(_) => "not_found",
            Self::Transport(_) => "transport",
            Self::UpstreamStatus(_, _) => "upstream_status",
            Self::Decode(_) => "decode",
            Self::Ambiguous(_) => "ambiguous",
            Self::Timeout => "timeout",
        }
    }
}
