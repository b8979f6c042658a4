//! Bearer token check shared by every node route

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

/// Rejects the request with 401 unless it carries `Authorization: Bearer
/// <api key>`. Taken as the first handler argument so the node lookup and
/// body parsing never run for unauthenticated callers.
///
/// ```ignore
/// pub async fn get_node_status(
///     _auth: ApiKeyAuth,
///     State(state): State<Arc<AppState>>,
///     Json(request): Json<NodeRequest>,
/// ) -> Result<ResponseJson<ApiResponse<NodeStatus>>, StatusCode> {
///     let node = state.node(&request.node_id).ok_or(StatusCode::NOT_FOUND)?;
///     Ok(ResponseJson(ApiResponse::success_with_data(node.status().await)))
/// }
/// ```
pub struct ApiKeyAuth;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<Arc<AppState>> for ApiKeyAuth {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) if token == state.api_key => Ok(ApiKeyAuth),
            Some(_) => {
                warn!("Rejected request to {} with a wrong API key", parts.uri.path());
                Err(StatusCode::UNAUTHORIZED)
            }
            None => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
