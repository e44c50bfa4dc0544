pub mod app_config;
pub mod config;
pub mod ordering;
pub mod results;
pub mod retailers;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, load_relay_server_config};
pub use ordering::{compare_city_bg, sort_by_stock_then_city, sort_by_stock_then_price};
pub use results::{
    AvailabilityClass, CanonicalResult, Coordinates, Medicine, Pharmacy, Price, Stock, NO_DATA,
    NO_PRICE, NO_WORKING_HOURS,
};
pub use retailers::{load_retailers, RetailerConfig, RetailersFile, SearchStrategy};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "GETMEDS_RELAY_URL is required while GETMEDS_USE_RELAY is on; \
         set GETMEDS_USE_RELAY=false for direct requests and demo mode"
    )]
    RelayUrlRequired,

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read retailer registry {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retailer registry: {0}")]
    RetailersFileParse(#[from] serde_yaml::Error),

    #[error("retailer registry validation failed: {0}")]
    Validation(String),
}
