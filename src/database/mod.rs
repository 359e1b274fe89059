pub mod fixture;
pub mod manager;
pub mod memory;
pub mod repository;
pub mod schema;
pub mod sequence;
pub mod tickets;
pub mod users;

use async_trait::async_trait;

use crate::models::{Role, Ticket, User};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::PgStore;

pub const USER_ID_SEQUENCE: &str = "user-id-sequence";
pub const TICKET_ID_SEQUENCE: &str = "ticket-id-sequence";

/// Named integer counters handing out user and ticket ids.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Atomically increments the counter and returns the new value.
    /// Fails with `SequenceMissing` when the counter was never seeded.
    async fn next_value(&self, name: &str) -> Result<i64, DatabaseError>;

    async fn exists(&self, name: &str) -> Result<bool, DatabaseError>;

    /// Sets the counter to `value`, creating it when absent. The next id
    /// handed out is `value + 1`.
    async fn seed(&self, name: &str, value: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, DatabaseError>;

    /// Users whose role set satisfies `tier`.
    async fn list_at_least(&self, tier: Role) -> Result<Vec<User>, DatabaseError>;

    async fn find(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Lookup by lower-cased username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, DatabaseError>;

    /// Fails with `Conflict` on a duplicate username or email.
    async fn insert(&self, user: &User) -> Result<(), DatabaseError>;

    async fn save(&self, user: &User) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Ticket>, DatabaseError>;

    async fn list_submitted_by(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError>;

    async fn list_assigned_to(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError>;

    /// Ranked text search over subject, details and update details,
    /// optionally limited to one submitter's tickets.
    async fn search(
        &self,
        query: &str,
        submitted_by: Option<i64>,
    ) -> Result<Vec<Ticket>, DatabaseError>;

    async fn find(&self, id: i64) -> Result<Option<Ticket>, DatabaseError>;

    async fn insert(&self, ticket: &Ticket) -> Result<(), DatabaseError>;

    /// Overwrites the stored ticket. Last writer wins.
    async fn save(&self, ticket: &Ticket) -> Result<(), DatabaseError>;

    /// Returns false when no such ticket existed.
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Refuses to proceed unless both id counters are seeded.
pub async fn ensure_sequences(sequences: &dyn SequenceStore) -> Result<(), DatabaseError> {
    for name in [USER_ID_SEQUENCE, TICKET_ID_SEQUENCE] {
        if !sequences.exists(name).await? {
            return Err(DatabaseError::SequenceMissing(name.to_string()));
        }
    }
    Ok(())
}
