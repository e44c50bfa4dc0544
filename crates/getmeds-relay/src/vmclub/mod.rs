//! VMClub session exchange.
//!
//! VMClub's fast search only answers same-origin XHR carrying the session
//! cookie and CSRF token of a freshly loaded landing page. Every relay
//! request bootstraps a new session; nothing is cached between requests.

mod extract;

use futures::future::join_all;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;

use getmeds_scraper::{SessionProduct, SessionSearchResponse};

use crate::proxy::BROWSER_USER_AGENT;

pub const DEFAULT_ORIGIN: &str = "https://sofia.vmclub.bg";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Failed to extract CSRF token")]
    MissingCsrfToken,

    #[error("fast search returned invalid JSON: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Fast-search reply. Only the markup is used.
#[derive(Debug, Deserialize)]
struct FastSearchReply {
    #[serde(default)]
    html: Option<String>,
}

/// One bootstrapped VMClub session.
struct Session<'a> {
    client: &'a reqwest::Client,
    origin: &'a str,
    cookies: String,
}

impl Session<'_> {
    async fn get_page(&self, url: &str) -> Result<String, SessionError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(COOKIE, &self.cookies)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SessionError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    async fn fast_search(
        &self,
        csrf_token: &str,
        query: &str,
    ) -> Result<FastSearchReply, SessionError> {
        let url = format!("{}/products/fast-search", self.origin);
        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(ACCEPT_LANGUAGE, "bg-BG,bg;q=0.9,en;q=0.8")
            .header("X-CSRF-TOKEN", csrf_token)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, &self.cookies)
            .header(ORIGIN, self.origin)
            .header(REFERER, format!("{}/", self.origin))
            .form(&[("q", query), ("field", "fast-search")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SessionError::UnexpectedStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Product page JSON-LD plus its store availability. `None` when the
    /// page cannot be fetched or carries no product block.
    async fn product(&self, slug: &str) -> Option<SessionProduct> {
        let url = format!("{}/pharmacy/{slug}", self.origin);
        let page = match self.get_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(slug, error = %e, "vmclub: product page failed");
                return None;
            }
        };

        let mut product = extract::extract_json_ld_product(&page, &url)?;
        if let Some(id) = product.id.as_deref() {
            let check_url = format!("{}/store-locations?check={id}", self.origin);
            match self.get_page(&check_url).await {
                Ok(html) => product.locations = extract::extract_store_locations(&html),
                Err(e) => {
                    tracing::warn!(slug, error = %e, "vmclub: store locations failed");
                    return None;
                }
            }
        }
        Some(product)
    }
}

/// Runs a full VMClub search: session bootstrap, fast search, then product
/// and store-location enrichment for at most `max_products` products.
///
/// # Errors
///
/// Returns [`SessionError`] when the landing page or fast search fails or
/// no CSRF token can be found. Individual product failures are skipped.
pub async fn search(
    client: &reqwest::Client,
    origin: &str,
    query: &str,
    max_products: usize,
) -> Result<SessionSearchResponse, SessionError> {
    let landing_url = format!("{origin}/");
    let landing = client
        .get(&landing_url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        )
        .header(ACCEPT_LANGUAGE, "bg-BG,bg;q=0.9,en;q=0.8")
        .send()
        .await?;
    if !landing.status().is_success() {
        return Err(SessionError::UnexpectedStatus {
            status: landing.status().as_u16(),
            url: landing_url,
        });
    }

    let cookies = extract::cookie_header(
        landing
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );
    let html = landing.text().await?;
    let csrf_token = extract::extract_csrf_token(&html).ok_or(SessionError::MissingCsrfToken)?;

    let session = Session {
        client,
        origin,
        cookies,
    };
    let reply = session.fast_search(&csrf_token, query).await?;

    let slugs = reply
        .html
        .as_deref()
        .map(|markup| extract::extract_product_slugs(markup, max_products))
        .unwrap_or_default();
    tracing::debug!(query, slugs = slugs.len(), "vmclub: fast search done");

    let products: Vec<SessionProduct> = join_all(slugs.iter().map(|slug| session.product(slug)))
        .await
        .into_iter()
        .flatten()
        .collect();

    Ok(SessionSearchResponse {
        success: true,
        query: query.to_string(),
        total_products: products.len(),
        products: Some(products),
        html: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LANDING: &str =
        r#"<html><head><meta name="csrf-token" content="tok-123"></head><body></body></html>"#;

    async fn mount_landing(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "XSRF-TOKEN=x1; path=/")
                    .append_header("set-cookie", "vmclub_session=s1; path=/; httponly")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn missing_csrf_token_fails_before_search() {
        let server = MockServer::start().await;
        mount_landing(&server, "<html></html>").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = search(&reqwest::Client::new(), &server.uri(), "aspirin", 10).await;
        assert!(matches!(result, Err(SessionError::MissingCsrfToken)));
    }

    #[tokio::test]
    async fn fast_search_sends_session_headers_and_form() {
        let server = MockServer::start().await;
        mount_landing(&server, LANDING).await;
        Mock::given(method("POST"))
            .and(path("/products/fast-search"))
            .and(header("x-csrf-token", "tok-123"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .and(header("cookie", "XSRF-TOKEN=x1; vmclub_session=s1"))
            .and(body_string_contains("field=fast-search"))
            .and(body_string_contains("q=aspirin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"html":""}"#))
            .expect(1)
            .mount(&server)
            .await;

        let response = search(&reqwest::Client::new(), &server.uri(), "aspirin", 10)
            .await
            .expect("search should succeed");
        assert!(response.success);
        assert_eq!(response.query, "aspirin");
        assert_eq!(response.total_products, 0);
        assert_eq!(response.products, Some(Vec::new()));
    }

    #[tokio::test]
    async fn products_are_enriched_and_failures_skipped() {
        let server = MockServer::start().await;
        mount_landing(&server, LANDING).await;
        Mock::given(method("POST"))
            .and(path("/products/fast-search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"html":"<a href=\"/pharmacy/aspirin-protect\"></a><a href=\"/pharmacy/gone\"></a>"}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pharmacy/aspirin-protect"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script type="application/ld+json">{"@type":"Product","productID":"77","name":"Аспирин Протект","offers":{"price":"6.35","priceCurrency":"EUR"}}</script>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pharmacy/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/store-locations"))
            .and(query_param("check", "77"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<li data-text='{"id":5,"name":"VMClub Лозенец","city":"София","status":0}'></li>"#,
            ))
            .mount(&server)
            .await;

        let response = search(&reqwest::Client::new(), &server.uri(), "aspirin", 10)
            .await
            .expect("search should succeed");
        let products = response.products.expect("products");
        assert_eq!(response.total_products, 1);
        assert_eq!(products[0].name, "Аспирин Протект");
        assert_eq!(products[0].locations.len(), 1);
        assert_eq!(products[0].locations[0].status, Some(0));
    }

    #[tokio::test]
    async fn landing_page_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = search(&reqwest::Client::new(), &server.uri(), "aspirin", 10).await;
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedStatus { status: 503, .. })
        ));
    }
}
