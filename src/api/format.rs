use futures::try_join;
use serde_json::{json, Value};

use crate::database::UserStore;
use crate::error::ApiError;
use crate::models::Ticket;

/// Ticket as returned by `GET /api/tickets/:id`: `createdBy` and
/// `technicians` are replaced by the referenced user records (hash excluded
/// by `User`'s serializer). Users that no longer exist come out as `null`
/// for the submitter and are skipped in the technician list.
pub async fn populate_ticket(users: &dyn UserStore, ticket: Ticket) -> Result<Value, ApiError> {
    let (submitter, mut technicians) =
        try_join!(users.find(ticket.created_by), users.find_many(&ticket.technicians))?;

    // find_many has no ordering guarantee; keep assignment order
    technicians.sort_by_key(|user| {
        ticket
            .technicians
            .iter()
            .position(|id| *id == user.id)
            .unwrap_or(usize::MAX)
    });

    let mut value = serde_json::to_value(&ticket).map_err(|e| {
        tracing::error!("Failed to serialize ticket {}: {}", ticket.id, e);
        ApiError::internal_server_error("Failed to format response")
    })?;
    value["createdBy"] = json!(submitter);
    value["technicians"] = json!(technicians);
    Ok(value)
}
