//! HTTP transport shared by every retailer adapter.
//!
//! Requests either go straight to the retailer or through the relay, which
//! adds CORS headers and owns retailer sessions. The relay URL carries the
//! target as a query parameter: `?pharmacy=<retailer>&url=<target>` for
//! retailers with a dedicated relay route, `?url=<target>` otherwise.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use getmeds_core::AppConfig;

use crate::error::TransportError;

/// Retailer keys the relay serves on a dedicated `pharmacy=` route.
const DEDICATED_RELAY_ROUTES: &[&str] = &["sopharmacy"];

const ACCEPT_ANY: &str = "application/json,text/html;q=0.9,*/*;q=0.8";

pub struct Transport {
    client: Client,
    relay: Option<Url>,
}

impl Transport {
    /// Builds a transport with the given timeout and `User-Agent`.
    /// `relay_url` of `None` means every request goes direct.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `relay_url` does not parse,
    /// or [`TransportError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        relay_url: Option<&str>,
    ) -> Result<Self, TransportError> {
        let relay = relay_url.map(parse_url).transpose()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, relay })
    }

    /// Builds a transport from application config. The relay is only used
    /// when `use_relay` is set.
    ///
    /// # Errors
    ///
    /// Same as [`Transport::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let relay = if config.use_relay {
            config.relay_url.as_deref()
        } else {
            None
        };
        Self::new(config.request_timeout_secs, &config.user_agent, relay)
    }

    #[must_use]
    pub fn uses_relay(&self) -> bool {
        self.relay.is_some()
    }

    /// Resolves the URL actually requested for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `target` is not an absolute URL.
    pub fn request_url(&self, retailer: &str, target: &str) -> Result<Url, TransportError> {
        let target_url = parse_url(target)?;
        let Some(relay) = &self.relay else {
            return Ok(target_url);
        };

        let mut url = relay.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if DEDICATED_RELAY_ROUTES.contains(&retailer) {
                pairs.append_pair("pharmacy", retailer);
            }
            pairs.append_pair("url", target_url.as_str());
        }
        Ok(url)
    }

    /// Fetches `target` as text.
    ///
    /// # Errors
    ///
    /// - [`TransportError::UnexpectedStatus`] on any non-2xx response.
    /// - [`TransportError::Http`] on network or TLS failure.
    /// - [`TransportError::InvalidUrl`] if `target` does not parse.
    pub async fn fetch_text(&self, retailer: &str, target: &str) -> Result<String, TransportError> {
        let url = self.request_url(retailer, target)?;
        self.get_text(url).await
    }

    /// Fetches `target` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Transport::fetch_text`], plus [`TransportError::Deserialize`]
    /// when the body does not decode as `T`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        retailer: &str,
        target: &str,
    ) -> Result<T, TransportError> {
        let body = self.fetch_text(retailer, target).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Deserialize {
            context: format!("{retailer} response from {target}"),
            source: e,
        })
    }

    /// Runs a relay-side session search (`?pharmacy=<retailer>&q=<query>`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::RelayDisabled`] when no relay is configured,
    /// otherwise the same errors as [`Transport::fetch_json`].
    pub async fn session_search<T: DeserializeOwned>(
        &self,
        retailer: &str,
        query: &str,
    ) -> Result<T, TransportError> {
        let Some(relay) = &self.relay else {
            return Err(TransportError::RelayDisabled);
        };

        let mut url = relay.clone();
        url.query_pairs_mut()
            .append_pair("pharmacy", retailer)
            .append_pair("q", query);

        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Deserialize {
            context: format!("{retailer} session search for \"{query}\""),
            source: e,
        })
    }

    async fn get_text(&self, url: Url) -> Result<String, TransportError> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, ACCEPT_ANY)
            .header(reqwest::header::ACCEPT_LANGUAGE, "bg-BG,bg;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

fn parse_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
