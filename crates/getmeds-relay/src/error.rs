use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::vmclub::SessionError;

pub const USAGE: &str = "?pharmacy=vmclub&q=query OR ?pharmacy=sopharmacy&url=... OR ?url=...";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing query parameter")]
    MissingQuery,

    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Missing parameters")]
    MissingParameters,

    #[error("Invalid url parameter")]
    InvalidUrl,

    #[error("Invalid SOpharmacy URL")]
    InvalidSopharmacyUrl,

    #[error("Domain not allowed")]
    DomainNotAllowed,

    #[error("VMClub fetch failed")]
    VmClub(#[source] SessionError),

    #[error("Failed to fetch from target URL")]
    Upstream(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<&'static str>,
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingQuery | Self::MissingUrl | Self::MissingParameters | Self::InvalidUrl => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidSopharmacyUrl | Self::DomainNotAllowed => StatusCode::FORBIDDEN,
            Self::VmClub(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::VmClub(e) => Some(e.to_string()),
            Self::Upstream(e) => Some(e.to_string()),
            _ => None,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self, message = message.as_deref().unwrap_or_default(), "relay request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            message,
            usage: matches!(self, Self::MissingParameters).then_some(USAGE),
        };
        (status, Json(body)).into_response()
    }
}
