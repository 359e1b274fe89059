// handlers/protected/tickets/show.rs - GET /api/tickets/:id handler

use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde_json::Value;

use super::load_ticket;
use crate::api::{populate_ticket, PathParams};
use crate::auth::gate::can_read_ticket;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Fetches one ticket with `createdBy` and `technicians` resolved to user
/// records.
pub async fn ticket_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Json<Value>> {
    let ticket = load_ticket(&state, id).await?;
    if !can_read_ticket(&auth, auth.id(), &ticket) {
        return Err(ApiError::forbidden("Access Denied"));
    }
    Ok(Json(populate_ticket(state.users.as_ref(), ticket).await?))
}
