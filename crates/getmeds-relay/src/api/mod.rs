mod relay;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
        },
        HeaderValue,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use getmeds_core::AppConfig;

use crate::{
    middleware::{preflight, request_id},
    proxy::DEFAULT_ALLOWED_DOMAINS,
    vmclub,
};

#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub vmclub_origin: Arc<str>,
    pub vmclub_max_products: usize,
    pub allowed_domains: Arc<Vec<String>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl RelayState {
    /// Builds relay state from application config with the production
    /// VMClub origin and host allow-list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            vmclub_origin: Arc::from(vmclub::DEFAULT_ORIGIN),
            vmclub_max_products: config.vmclub_max_products,
            allowed_domains: Arc::new(
                DEFAULT_ALLOWED_DOMAINS
                    .iter()
                    .map(|d| (*d).to_string())
                    .collect(),
            ),
        })
    }

    #[must_use]
    pub fn with_vmclub_origin(mut self, origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        self.vmclub_origin = Arc::from(origin.trim_end_matches('/'));
        self
    }

    #[must_use]
    pub fn with_allowed_domain(mut self, domain: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.allowed_domains).push(domain.into());
        self
    }
}

pub fn build_app(state: RelayState) -> Router {
    Router::new()
        .route("/", get(relay::relay))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, OPTIONS"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type, X-CSRF-TOKEN, Authorization"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_MAX_AGE,
                    HeaderValue::from_static("86400"),
                ))
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn(preflight)),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthData { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state() -> RelayState {
        RelayState {
            client: reqwest::Client::new(),
            vmclub_origin: Arc::from("http://127.0.0.1:9"),
            vmclub_max_products: 10,
            allowed_domains: Arc::new(
                DEFAULT_ALLOWED_DOMAINS
                    .iter()
                    .map(|d| (*d).to_string())
                    .collect(),
            ),
        }
    }

    async fn send(state: RelayState, method: Method, uri: &str) -> Response {
        build_app(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    fn encode(url: &str) -> String {
        url.replace(':', "%3A").replace('/', "%2F").replace('?', "%3F").replace('=', "%3D")
    }

    #[tokio::test]
    async fn options_is_empty_ok_with_cors_headers() {
        let response = send(test_state(), Method::OPTIONS, "/?pharmacy=vmclub").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, X-CSRF-TOKEN, Authorization"
        );
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn missing_parameters_is_400_with_usage() {
        let response = send(test_state(), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let json = json_body(response).await;
        assert_eq!(json["error"], "Missing parameters");
        assert!(json["usage"].as_str().unwrap().contains("pharmacy=vmclub"));
    }

    #[tokio::test]
    async fn vmclub_without_query_is_400() {
        let response = send(test_state(), Method::GET, "/?pharmacy=vmclub&q=%20").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing query parameter");
    }

    #[tokio::test]
    async fn unparseable_url_is_400() {
        let response = send(test_state(), Method::GET, "/?url=not-a-url").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid url parameter");
    }

    #[tokio::test]
    async fn disallowed_domain_is_403() {
        let uri = format!("/?url={}", encode("https://example.com/page"));
        let response = send(test_state(), Method::GET, &uri).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Domain not allowed");
    }

    #[tokio::test]
    async fn sopharmacy_route_rejects_other_hosts() {
        let uri = format!(
            "/?pharmacy=sopharmacy&url={}",
            encode("https://vmclub.bg/")
        );
        let response = send(test_state(), Method::GET, &uri).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Invalid SOpharmacy URL");
    }

    #[tokio::test]
    async fn sopharmacy_route_without_url_is_400() {
        let response = send(test_state(), Method::GET, "/?pharmacy=sopharmacy").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing url parameter");
    }

    #[tokio::test]
    async fn health_reports_ok_and_request_id() {
        let response = build_app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-42");
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn generic_proxy_mirrors_upstream_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .respond_with(
                ResponseTemplate::new(202).set_body_raw(r#"{"results":[]}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let state = test_state().with_allowed_domain("127.0.0.1");
        let uri = format!("/?url={}", encode(&format!("{}/api/search", server.uri())));
        let response = send(state, Method::GET, &uri).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(json_body(response).await["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn vmclub_search_runs_session_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "vmclub_session=abc; path=/")
                    .set_body_string(r#"<meta name="csrf-token" content="t0k">"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/products/fast-search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"html":"<a href=\"/pharmacy/aspirin\">Аспирин</a>"}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pharmacy/aspirin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script type="application/ld+json">{"@type":"Product","productID":"12","name":"Аспирин","brand":"Bayer"}</script>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/store-locations"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<li data-text='{"id":3,"name":"VMClub Младост","city":"София","status":1}'></li>"#,
            ))
            .mount(&server)
            .await;

        let state = test_state().with_vmclub_origin(server.uri());
        let response = send(state, Method::GET, "/?pharmacy=vmclub&q=aspirin").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["query"], "aspirin");
        assert_eq!(json["totalProducts"], 1);
        assert_eq!(json["products"][0]["name"], "Аспирин");
        assert_eq!(json["products"][0]["brand"], "Bayer");
        assert_eq!(json["products"][0]["locations"][0]["status"], 1);
    }

    #[tokio::test]
    async fn vmclub_session_failure_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let state = test_state().with_vmclub_origin(server.uri());
        let response = send(state, Method::GET, "/?pharmacy=vmclub&q=aspirin").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "VMClub fetch failed");
        assert_eq!(json["message"], "Failed to extract CSRF token");
    }
}
