// handlers/protected/tickets/technicians.rs - technician assignment

use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{commit, load_ticket};
use crate::api::{JsonBody, PathParams};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{HasRoles, Ticket, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TechniciansBody {
    technicians: Vec<i64>,
}

/**
 * PUT /api/tickets/:id/technicians - replace the technician set
 *
 * Input: `{ "technicians": [4, 5] }`. The list is authoritative: anyone
 * omitted is unassigned, an empty list clears the set. Every id must be an
 * existing technician-tier user.
 */
pub async fn technicians_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
    JsonBody(body): JsonBody<TechniciansBody>,
) -> ApiResult<Json<Ticket>> {
    let mut ticket = load_ticket(&state, id).await?;

    let found = state.users.find_many(&body.technicians).await?;
    let mut technicians: Vec<User> = Vec::with_capacity(body.technicians.len());
    for tech_id in &body.technicians {
        match found.iter().find(|u| u.id == *tech_id) {
            Some(user) if user.is_technician() => technicians.push(user.clone()),
            _ => {
                return Err(ApiError::field_error(
                    "technicians",
                    format!("User {} is not a technician", tech_id),
                ))
            }
        }
    }

    let update = ticket.assign_technicians(&technicians, &auth.actor(), Utc::now());
    info!(
        "{} assigned technicians {:?} to ticket {}",
        auth.username(),
        ticket.technicians,
        id
    );
    commit(&state, &auth, ticket, update).await
}

/// DELETE /api/tickets/:id/technicians/:userId - unassign one technician
pub async fn technician_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams((id, user_id)): PathParams<(i64, i64)>,
) -> ApiResult<Json<Ticket>> {
    let mut ticket = load_ticket(&state, id).await?;
    let name = state
        .users
        .find(user_id)
        .await?
        .map(|user| user.full_name())
        .unwrap_or_else(|| format!("#{}", user_id));

    let update = ticket.remove_technician(user_id, &name, &auth.actor(), Utc::now())?;
    info!(
        "{} removed technician {} from ticket {}",
        auth.username(),
        user_id,
        id
    );
    commit(&state, &auth, ticket, update).await
}
