//! Generic adapter for retailers that expose a JSON search endpoint.
//!
//! The payload format is not standardized, so the adapter accepts a bare
//! array or an object holding `products`, `results` or `items`, and reads
//! the handful of fields most catalogues share. Such endpoints never report
//! per-store stock, so every record is `unknown`.

use reqwest::Url;
use serde_json::Value;

use getmeds_core::{
    sort_by_stock_then_city, CanonicalResult, Medicine, Pharmacy, Price, Stock, NO_DATA,
    NO_WORKING_HOURS,
};

use crate::error::{SearchError, TransportError};
use crate::parse_helpers::{absolutize, clean_text, parse_price};
use crate::transport::Transport;

const CURRENCY: &str = "BGN";
const LIST_KEYS: &[&str] = &["products", "results", "items"];

#[derive(Debug, Clone)]
pub struct JsonEndpointAdapter {
    name: String,
    relay_key: String,
    endpoint: String,
}

impl JsonEndpointAdapter {
    #[must_use]
    pub fn new(name: impl Into<String>, relay_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relay_key: relay_key.into(),
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint URL with the query appended as `q`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the configured endpoint does
    /// not parse.
    pub fn search_url(&self, query: &str) -> Result<String, TransportError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| TransportError::InvalidUrl {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url.to_string())
    }

    /// # Errors
    ///
    /// Returns [`SearchError::Upstream`] on a non-2xx status, transport
    /// failure or a body that is not JSON.
    pub async fn search(
        &self,
        transport: &Transport,
        query: &str,
    ) -> Result<Vec<CanonicalResult>, SearchError> {
        let target = self
            .search_url(query)
            .map_err(|e| SearchError::upstream(&self.name, e))?;
        let payload: Value = transport
            .fetch_json(&self.relay_key, &target)
            .await
            .map_err(|e| SearchError::upstream(&self.name, e))?;

        let mut results = payload_to_results(&self.name, &target, &payload);
        sort_by_stock_then_city(&mut results);
        Ok(results)
    }
}

fn item_list(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    }
}

fn string_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn payload_to_results(retailer: &str, base: &str, payload: &Value) -> Vec<CanonicalResult> {
    item_list(payload)
        .iter()
        .filter_map(|item| {
            let name = string_field(item, &["name", "title"])?;
            let price = match item.get("price") {
                Some(Value::Number(n)) => parse_price(&n.to_string()),
                Some(Value::String(s)) => parse_price(s),
                _ => None,
            };
            let currency = string_field(item, &["currency"]).unwrap_or(CURRENCY);

            Some(CanonicalResult {
                retailer: retailer.to_string(),
                medicine: Medicine {
                    name: clean_text(name),
                    manufacturer: string_field(item, &["manufacturer", "brand"])
                        .unwrap_or(retailer)
                        .to_string(),
                    packaging: String::new(),
                    prescription_required: false,
                    image_url: string_field(item, &["image", "imageUrl"])
                        .and_then(|raw| absolutize(raw, base)),
                    product_link: string_field(item, &["url", "link"])
                        .and_then(|raw| absolutize(raw, base)),
                    sku: string_field(item, &["sku"]).map(str::to_string),
                    description: None,
                },
                pharmacy: Pharmacy {
                    name: retailer.to_string(),
                    address: NO_DATA.to_string(),
                    city: None,
                    phone: None,
                    working_hours: NO_WORKING_HOURS.to_string(),
                    coordinates: None,
                },
                stock: Stock::unknown(),
                price: Price::from_option(price, currency),
            })
        })
        .collect()
}
