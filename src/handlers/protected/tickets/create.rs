// handlers/protected/tickets/create.rs - POST /api/tickets handler

use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::api::JsonBody;
use crate::database::TICKET_ID_SEQUENCE;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::{NewTicket, Ticket};
use crate::notify::TicketEvent;
use crate::state::AppState;

/**
 * POST /api/tickets - open a ticket as the caller
 *
 * Only subject, details, location and the createdFor* contact fields are
 * taken from the body. Id, submitter, status (OPEN), priority (MEDIUM),
 * technicians and updates are set here.
 */
pub async fn ticket_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(draft): JsonBody<NewTicket>,
) -> ApiResult<Json<Ticket>> {
    draft.validate(&auth.user)?;
    let id = state.sequences.next_value(TICKET_ID_SEQUENCE).await?;
    let ticket = Ticket::open(id, &auth.user, draft, Utc::now())?;
    state.tickets.insert(&ticket).await?;

    info!("{} created ticket {}", auth.username(), ticket.id);
    state.notifier.notify(TicketEvent::Created {
        ticket: ticket.clone(),
        actor: auth.user.clone(),
    });
    Ok(Json(ticket))
}
