use sqlx::PgPool;

/// Postgres-backed implementation of the user, ticket and sequence stores.
/// The trait impls live next to their SQL in `users.rs`, `tickets.rs` and
/// `sequence.rs`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
