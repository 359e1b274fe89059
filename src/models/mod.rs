pub mod role;
pub mod ticket;
pub mod user;

pub use role::{HasRoles, Role};
pub use ticket::{
    Actor, FieldValue, NewTicket, Priority, Status, Ticket, TicketError, TicketField, Update,
};
pub use user::{NewUser, User, UserError, UserPatch};
