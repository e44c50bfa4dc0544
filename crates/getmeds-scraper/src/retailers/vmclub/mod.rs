//! VMClub adapter. VMClub's search needs a cookie + CSRF session, which the
//! relay bootstraps per request, so this adapter only ever talks to the relay.

mod parse;
pub mod response;

use getmeds_core::{sort_by_stock_then_city, CanonicalResult};

use crate::error::SearchError;
use crate::transport::Transport;

use response::SessionSearchResponse;

pub(crate) const RELAY_KEY: &str = "vmclub";

#[derive(Debug, Clone)]
pub struct VmClubAdapter {
    name: String,
}

impl VmClubAdapter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// - [`SearchError::Configuration`] when the transport has no relay.
    /// - [`SearchError::Upstream`] when the relay call fails or returns
    ///   something other than JSON.
    pub async fn search(
        &self,
        transport: &Transport,
        query: &str,
    ) -> Result<Vec<CanonicalResult>, SearchError> {
        if !transport.uses_relay() {
            return Err(SearchError::Configuration(format!(
                "{} searches need the relay; set GETMEDS_USE_RELAY=true and GETMEDS_RELAY_URL",
                self.name
            )));
        }

        let response: SessionSearchResponse = transport
            .session_search(RELAY_KEY, query)
            .await
            .map_err(|e| SearchError::upstream(&self.name, e))?;

        let mut results = parse::response_to_results(&self.name, &response);
        tracing::debug!(
            retailer = %self.name,
            query,
            products = response.total_products,
            records = results.len(),
            "session search complete"
        );
        sort_by_stock_then_city(&mut results);
        Ok(results)
    }
}
