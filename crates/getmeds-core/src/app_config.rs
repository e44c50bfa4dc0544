use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub retailers_path: PathBuf,
    /// Base URL of the CORS/session relay. Required when `use_relay` is set.
    pub relay_url: Option<String>,
    /// Route retailer traffic through the relay. The stateful-session
    /// retailer cannot be searched without it.
    pub use_relay: bool,
    pub relay_bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub min_query_length: usize,
    /// Product references taken from the Sopharmacy search page.
    pub sopharmacy_max_products: usize,
    /// Leading product references eligible for detail-page image enrichment.
    pub sopharmacy_enrich_limit: usize,
    /// Product pages the relay enriches per VMClub search.
    pub vmclub_max_products: usize,
}
