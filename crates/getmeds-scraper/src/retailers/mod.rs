//! Retailer adapters, one per search strategy.

pub mod json_endpoint;
pub mod sopharmacy;
pub mod vmclub;

use getmeds_core::{AppConfig, CanonicalResult, RetailerConfig, SearchStrategy};

use crate::error::SearchError;
use crate::transport::Transport;

pub use json_endpoint::JsonEndpointAdapter;
pub use sopharmacy::SopharmacyAdapter;
pub use vmclub::VmClubAdapter;

/// Default product cap and enrichment limit for html-scrape retailers when
/// no application config is at hand.
const DEFAULT_MAX_PRODUCTS: usize = 5;
const DEFAULT_ENRICH_LIMIT: usize = 3;

/// A configured retailer adapter.
#[derive(Debug, Clone)]
pub enum Adapter {
    Sopharmacy(SopharmacyAdapter),
    VmClub(VmClubAdapter),
    JsonEndpoint(JsonEndpointAdapter),
}

impl Adapter {
    /// Builds the adapter for one registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] if a `json_endpoint` retailer
    /// has no endpoint.
    pub fn from_config(
        retailer: &RetailerConfig,
        app: Option<&AppConfig>,
    ) -> Result<Self, SearchError> {
        match retailer.strategy {
            SearchStrategy::HtmlScrape => {
                let (max_products, enrich_limit) = app.map_or(
                    (DEFAULT_MAX_PRODUCTS, DEFAULT_ENRICH_LIMIT),
                    |c| (c.sopharmacy_max_products, c.sopharmacy_enrich_limit),
                );
                Ok(Self::Sopharmacy(SopharmacyAdapter::new(
                    &retailer.name,
                    max_products,
                    enrich_limit,
                )))
            }
            SearchStrategy::StatefulSession => {
                Ok(Self::VmClub(VmClubAdapter::new(&retailer.name)))
            }
            SearchStrategy::JsonEndpoint => {
                let endpoint = retailer.endpoint.as_deref().ok_or_else(|| {
                    SearchError::Configuration(format!(
                        "retailer '{}' has no endpoint",
                        retailer.name
                    ))
                })?;
                Ok(Self::JsonEndpoint(JsonEndpointAdapter::new(
                    &retailer.name,
                    retailer.relay_key(),
                    endpoint,
                )))
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sopharmacy(a) => a.name(),
            Self::VmClub(a) => a.name(),
            Self::JsonEndpoint(a) => a.name(),
        }
    }

    /// Runs this retailer's search. The returned list is already ordered
    /// in-stock first, then by city.
    ///
    /// # Errors
    ///
    /// See the individual adapters; any error means this retailer
    /// contributed nothing.
    pub async fn search(
        &self,
        transport: &Transport,
        query: &str,
    ) -> Result<Vec<CanonicalResult>, SearchError> {
        match self {
            Self::Sopharmacy(a) => a.search(transport, query).await,
            Self::VmClub(a) => a.search(transport, query).await,
            Self::JsonEndpoint(a) => a.search(transport, query).await,
        }
    }
}
