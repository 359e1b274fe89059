// handlers/protected/tickets/updates.rs - POST /api/tickets/:id/updates handler

use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{commit, load_ticket};
use crate::api::{JsonBody, PathParams};
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::Ticket;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(default)]
    details: String,
}

pub async fn updates_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
    JsonBody(body): JsonBody<UpdateBody>,
) -> ApiResult<Json<Ticket>> {
    let mut ticket = load_ticket(&state, id).await?;
    let update = ticket.post_update(&body.details, &auth.actor(), Utc::now())?;

    info!("{} posted an update to ticket {}", auth.username(), id);
    commit(&state, &auth, ticket, update).await
}
