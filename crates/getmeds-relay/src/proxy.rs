//! Host allow-listed GET forwarding.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::{
    header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT},
    Url,
};

use crate::error::RelayError;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "sopharmacy.bg",
    "vmclub.bg",
    "remedium.bg",
    "subra.bg",
    "apteka.bg",
];

/// Which relay route a forward request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Sopharmacy,
    Generic,
}

impl Route {
    fn default_content_type(self) -> &'static str {
        match self {
            Self::Sopharmacy => "text/html",
            Self::Generic => "text/plain",
        }
    }
}

/// Parses `raw` and requires a host.
///
/// # Errors
///
/// Returns [`RelayError::InvalidUrl`] when the URL does not parse or has no host.
pub fn parse_target(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw).map_err(|_| RelayError::InvalidUrl)?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(RelayError::InvalidUrl);
    }
    Ok(url)
}

/// `true` when `host` equals one of `allowed` or is a subdomain of it.
pub fn host_allowed<S: AsRef<str>>(host: &str, allowed: &[S]) -> bool {
    let host = host.to_ascii_lowercase();
    allowed.iter().any(|domain| {
        let domain = domain.as_ref();
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Applies the route's host rule to `target`.
///
/// # Errors
///
/// Returns [`RelayError::InvalidSopharmacyUrl`] or
/// [`RelayError::DomainNotAllowed`] when the host is rejected.
pub fn authorize<S: AsRef<str>>(
    route: Route,
    target: &Url,
    allowed: &[S],
) -> Result<(), RelayError> {
    let host = target.host_str().unwrap_or_default();
    match route {
        Route::Sopharmacy if host.contains("sopharmacy.bg") => Ok(()),
        Route::Sopharmacy => Err(RelayError::InvalidSopharmacyUrl),
        Route::Generic if host_allowed(host, allowed) => Ok(()),
        Route::Generic => Err(RelayError::DomainNotAllowed),
    }
}

/// Forwards a GET to `target` with browser headers and mirrors the upstream
/// status, content type and body.
///
/// # Errors
///
/// Returns [`RelayError::Upstream`] when the request cannot be completed.
pub async fn forward(
    client: &reqwest::Client,
    route: Route,
    target: Url,
) -> Result<Response, RelayError> {
    let mut request = client
        .get(target.clone())
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT_LANGUAGE, "bg,en;q=0.9");
    request = match route {
        Route::Sopharmacy => request
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(REFERER, "https://sopharmacy.bg/"),
        Route::Generic => request.header(ACCEPT, "*/*"),
    };

    let upstream = request.send().await?;
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(route.default_content_type()));
    let body = upstream.bytes().await?;

    tracing::debug!(
        target_url = %target,
        status = status.as_u16(),
        bytes = body.len(),
        "forwarded request"
    );

    Ok((status, [(CONTENT_TYPE, content_type)], Body::from(body)).into_response())
}
