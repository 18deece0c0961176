use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid store URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no storefront product feed at {url}")]
    NotAStorefront { url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("structuring failed for {context} after {attempts} attempts")]
    StructuringFailed { context: String, attempts: u32 },

    #[error("internal pipeline fault: {0}")]
    Internal(String),
}

impl ExtractError {
    /// `true` for transient network-class failures — the "Unreachable" class
    /// once retries are exhausted. Scoped to one sub-fetch, never fatal to
    /// the whole request outside the catalog gate.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ExtractError::Http(_)
                | ExtractError::RateLimited { .. }
                | ExtractError::UnexpectedStatus { .. }
        )
    }

    /// `true` for errors that abort the whole extraction.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidUrl { .. } | ExtractError::NotAStorefront { .. }
        )
    }
}
