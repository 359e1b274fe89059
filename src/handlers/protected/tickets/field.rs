// handlers/protected/tickets/field.rs - PUT /api/tickets/:id/status/:value
//                                       PUT /api/tickets/:id/priority/:value

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
use crate::models::{FieldValue, Ticket, TicketField};
use crate::state::AppState;

/// Optional body; `comments` replaces the generated update text.
#[derive(Debug, Default, Deserialize)]
pub struct FieldComments {
    comments: Option<String>,
}

pub async fn status_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams((id, value)): PathParams<(i64, String)>,
    body: Option<JsonBody<FieldComments>>,
) -> ApiResult<Json<Ticket>> {
    set_field(&state, &auth, id, TicketField::Status, &value, body).await
}

pub async fn priority_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams((id, value)): PathParams<(i64, String)>,
    body: Option<JsonBody<FieldComments>>,
) -> ApiResult<Json<Ticket>> {
    set_field(&state, &auth, id, TicketField::Priority, &value, body).await
}

/// Shared transition: unknown value is 400, the value already held is 409
/// and leaves the ticket untouched.
async fn set_field(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
    field: TicketField,
    raw: &str,
    body: Option<JsonBody<FieldComments>>,
) -> ApiResult<Json<Ticket>> {
    let value = FieldValue::parse(field, &raw.to_uppercase())?;
    let comments = body.and_then(|JsonBody(b)| b.comments);

    let mut ticket = load_ticket(state, id).await?;
    let update = ticket.set_field(value, comments.as_deref(), &auth.actor(), Utc::now())?;

    info!("{} set {} of ticket {} to {}", auth.username(), field, id, value);
    commit(state, auth, ticket, update).await
}
