//! Per-resource checks layered on top of the route tier guard.

use crate::models::{HasRoles, Ticket};

/// Submitters can read their own tickets; technician tier reads all.
pub fn can_read_ticket(user: &impl HasRoles, user_id: i64, ticket: &Ticket) -> bool {
    ticket.created_by == user_id || user.is_technician()
}

/// Profiles are readable and editable by their owner or an admin.
pub fn can_access_profile(user: &impl HasRoles, user_id: i64, profile_id: i64) -> bool {
    user_id == profile_id || user.is_admin()
}
