//! sopharmacy.bg adapter: search page scrape, optional image enrichment,
//! then a per-product availability lookup.

mod parse;

use futures::future::join_all;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use getmeds_core::{sort_by_stock_then_city, CanonicalResult};

use crate::error::SearchError;
use crate::transport::Transport;

use parse::{AvailabilityResponse, ProductRef};

/// Relay route key for this retailer.
pub(crate) const RELAY_KEY: &str = "sopharmacy";

pub(crate) const DEFAULT_ORIGIN: &str = "https://sopharmacy.bg";

#[derive(Debug, Clone)]
pub struct SopharmacyAdapter {
    name: String,
    origin: String,
    max_products: usize,
    enrich_limit: usize,
}

impl SopharmacyAdapter {
    /// `max_products` caps how many search hits get an availability lookup;
    /// `enrich_limit` caps how many of those may trigger a product-page fetch
    /// for a missing thumbnail.
    #[must_use]
    pub fn new(name: impl Into<String>, max_products: usize, enrich_limit: usize) -> Self {
        Self {
            name: name.into(),
            origin: DEFAULT_ORIGIN.to_string(),
            max_products,
            enrich_limit,
        }
    }

    /// Points the adapter at a different site origin (mirrors, local fixtures).
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/bg/sophSearch/?text={}",
            self.origin,
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        )
    }

    fn availability_url(&self, product_id: &str) -> String {
        format!(
            "{}/bg/mapbox/{product_id}/pdpProductAvailability.json",
            self.origin
        )
    }

    /// Searches the retailer and returns one record per (product, pharmacy).
    ///
    /// Only the search page request can fail the call. Availability and
    /// image lookups that fail drop the product or its image and are logged.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Upstream`] if the search page cannot be fetched.
    pub async fn search(
        &self,
        transport: &Transport,
        query: &str,
    ) -> Result<Vec<CanonicalResult>, SearchError> {
        let html = transport
            .fetch_text(RELAY_KEY, &self.search_url(query))
            .await
            .map_err(|e| SearchError::upstream(&self.name, e))?;

        let products = parse::parse_search_results(&html, &self.origin, self.max_products);
        tracing::debug!(
            retailer = %self.name,
            query,
            products = products.len(),
            "parsed search page"
        );

        let lookups = products
            .iter()
            .enumerate()
            .map(|(index, product)| self.product_records(transport, product, index < self.enrich_limit));

        let mut results: Vec<CanonicalResult> =
            join_all(lookups).await.into_iter().flatten().collect();
        sort_by_stock_then_city(&mut results);
        Ok(results)
    }

    async fn product_records(
        &self,
        transport: &Transport,
        product: &ProductRef,
        may_enrich: bool,
    ) -> Vec<CanonicalResult> {
        let url = self.availability_url(&product.external_id);
        let availability = match transport
            .fetch_json::<AvailabilityResponse>(RELAY_KEY, &url)
            .await
        {
            Ok(availability) => availability,
            Err(e) => {
                tracing::warn!(
                    retailer = %self.name,
                    product_id = %product.external_id,
                    error = %e,
                    "availability lookup failed; dropping product"
                );
                return Vec::new();
            }
        };

        let features = availability.into_features();
        if features.is_empty() {
            tracing::debug!(
                retailer = %self.name,
                product_id = %product.external_id,
                "no pharmacy locations for product"
            );
            return Vec::new();
        }

        let image_url = match &product.image_url {
            Some(url) => Some(url.clone()),
            None if may_enrich => self.product_page_image(transport, product).await,
            None => None,
        };

        features
            .iter()
            .map(|feature| {
                parse::feature_to_result(&self.name, product, image_url.as_deref(), feature)
            })
            .collect()
    }

    async fn product_page_image(&self, transport: &Transport, product: &ProductRef) -> Option<String> {
        match transport.fetch_text(RELAY_KEY, &product.detail_link).await {
            Ok(html) => parse::extract_product_image(&html, &self.origin),
            Err(e) => {
                tracing::debug!(
                    retailer = %self.name,
                    product_id = %product.external_id,
                    error = %e,
                    "product page fetch failed; leaving image empty"
                );
                None
            }
        }
    }
}
