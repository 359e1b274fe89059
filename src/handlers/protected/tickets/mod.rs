// handlers/protected/tickets/mod.rs - /api/tickets

pub mod create; //      POST   /api/tickets                            (any user)
pub mod delete; //      DELETE /api/tickets/:id                        (ADMIN)
pub mod field; //       PUT    /api/tickets/:id/{status,priority}/:value (SUPERVISOR)
pub mod list; //        GET    /api/tickets (TECHNICIAN), /submitted, /assigned, /search
pub mod show; //        GET    /api/tickets/:id                        (submitter or TECHNICIAN)
pub mod technicians; // PUT    /api/tickets/:id/technicians, DELETE .../technicians/:userId (SUPERVISOR)
pub mod updates; //     POST   /api/tickets/:id/updates                (TECHNICIAN)

pub use create::ticket_post;
pub use delete::ticket_delete;
pub use field::{priority_put, status_put};
pub use list::{assigned_get, search_get, submitted_get, tickets_get};
pub use show::ticket_get;
pub use technicians::{technician_delete, technicians_put};
pub use updates::updates_post;

use axum::response::Json;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{Ticket, Update};
use crate::notify::TicketEvent;
use crate::state::AppState;

async fn load_ticket(state: &AppState, id: i64) -> ApiResult<Ticket> {
    state
        .tickets
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No ticket found"))
}

/// Persists a mutated ticket, then queues the update notification. The
/// response never waits on mail delivery.
async fn commit(
    state: &AppState,
    auth: &AuthUser,
    ticket: Ticket,
    update: Update,
) -> ApiResult<Json<Ticket>> {
    state.tickets.save(&ticket).await?;
    state.notifier.notify(TicketEvent::Updated {
        ticket: ticket.clone(),
        actor: auth.user.clone(),
        update,
    });
    Ok(Json(ticket))
}
