use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How a retailer's catalogue is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Search page markup scraped with CSS selectors, enriched per product.
    HtmlScrape,
    /// A JSON search endpoint fetched through the generic proxy.
    JsonEndpoint,
    /// Cookie + CSRF session bootstrapped by the relay on every search.
    StatefulSession,
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStrategy::HtmlScrape => write!(f, "html_scrape"),
            SearchStrategy::JsonEndpoint => write!(f, "json_endpoint"),
            SearchStrategy::StatefulSession => write!(f, "stateful_session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub strategy: SearchStrategy,
    /// Search endpoint; required for `json_endpoint` retailers.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl RetailerConfig {
    /// Lower-case key used on the relay's `pharmacy=` parameter.
    #[must_use]
    pub fn relay_key(&self) -> String {
        self.name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetailersFile {
    pub retailers: Vec<RetailerConfig>,
}

impl RetailersFile {
    /// Retailers with `enabled: true`, in registry order.
    pub fn enabled(&self) -> impl Iterator<Item = &RetailerConfig> {
        self.retailers.iter().filter(|r| r.enabled)
    }
}

/// Load and validate the retailer registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailers(path: &Path) -> Result<RetailersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_retailers(&content)
}

/// Parse and validate a retailer registry from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_retailers(content: &str) -> Result<RetailersFile, ConfigError> {
    let file: RetailersFile = serde_yaml::from_str(content)?;
    validate_retailers(&file)?;
    Ok(file)
}

fn validate_retailers(file: &RetailersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for retailer in &file.retailers {
        if retailer.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "retailer name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(retailer.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate retailer name: '{}'",
                retailer.name
            )));
        }

        if retailer.strategy == SearchStrategy::JsonEndpoint {
            let has_endpoint = retailer
                .endpoint
                .as_deref()
                .is_some_and(|e| e.starts_with("http://") || e.starts_with("https://"));
            if !has_endpoint {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' uses json_endpoint but has no http(s) endpoint",
                    retailer.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "retailers_test.rs"]
mod tests;
