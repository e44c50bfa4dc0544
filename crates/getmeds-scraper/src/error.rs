use thiserror::Error;

/// Failure of a single HTTP exchange, direct or through the relay.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("relay is disabled; stateful session searches require GETMEDS_USE_RELAY=true")]
    RelayDisabled,

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One retailer's contribution to an aggregate failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetailerFailure {
    pub retailer: String,
    pub reason: String,
}

impl std::fmt::Display for RetailerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.retailer, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must be at least {min_length} characters, got {actual}")]
    Validation { min_length: usize, actual: usize },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{retailer} search failed: {source}")]
    Upstream {
        retailer: String,
        #[source]
        source: TransportError,
    },

    #[error("all retailers failed: {}", join_failures(.failures))]
    AllRetailersFailed { failures: Vec<RetailerFailure> },
}

fn join_failures(failures: &[RetailerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SearchError {
    pub(crate) fn upstream(retailer: &str, source: TransportError) -> Self {
        Self::Upstream {
            retailer: retailer.to_string(),
            source,
        }
    }
}
