// handlers/protected/tickets/delete.rs - DELETE /api/tickets/:id handler

use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use tracing::info;

use crate::api::PathParams;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Irreversible. 204 on success, 404 when the ticket does not exist.
pub async fn ticket_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<StatusCode> {
    if !state.tickets.delete(id).await? {
        return Err(ApiError::not_found("No ticket found"));
    }
    info!("{} deleted ticket {}", auth.username(), id);
    Ok(StatusCode::NO_CONTENT)
}
