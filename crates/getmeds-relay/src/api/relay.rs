use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use super::RelayState;
use crate::{
    error::RelayError,
    middleware::RequestId,
    proxy::{self, Route},
    vmclub,
};

#[derive(Debug, Default, Deserialize)]
pub(super) struct RelayParams {
    pharmacy: Option<String>,
    q: Option<String>,
    url: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `/` dispatch: `pharmacy=vmclub` runs a session search, `pharmacy=sopharmacy`
/// forwards to sopharmacy.bg, a bare `url` goes through the generic proxy.
pub(super) async fn relay(
    State(state): State<RelayState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RelayParams>,
) -> Result<Response, RelayError> {
    let url = non_empty(params.url.as_deref());

    match params.pharmacy.as_deref() {
        Some("vmclub") => {
            let query = non_empty(params.q.as_deref()).ok_or(RelayError::MissingQuery)?;
            tracing::info!(request_id = %req_id.0, query, "vmclub session search");
            let response = vmclub::search(
                &state.client,
                &state.vmclub_origin,
                query,
                state.vmclub_max_products,
            )
            .await
            .map_err(RelayError::VmClub)?;
            Ok(Json(response).into_response())
        }
        Some("sopharmacy") => {
            let target = proxy::parse_target(url.ok_or(RelayError::MissingUrl)?)?;
            tracing::debug!(request_id = %req_id.0, target_url = %target, "sopharmacy forward");
            proxy::authorize(Route::Sopharmacy, &target, state.allowed_domains.as_slice())?;
            proxy::forward(&state.client, Route::Sopharmacy, target).await
        }
        _ => {
            let target = proxy::parse_target(url.ok_or(RelayError::MissingParameters)?)?;
            proxy::authorize(Route::Generic, &target, state.allowed_domains.as_slice())?;
            proxy::forward(&state.client, Route::Generic, target).await
        }
    }
}
