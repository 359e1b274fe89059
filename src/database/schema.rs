use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Tables backing the helpdesk. Each statement is idempotent so `apply` can
/// run against an already-initialized database.
const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sequences (
        name TEXT PRIMARY KEY,
        value BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        hash TEXT,
        roles TEXT[] NOT NULL DEFAULT '{}',
        local BOOLEAN NOT NULL DEFAULT TRUE,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        first_name TEXT,
        last_name TEXT,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        department TEXT
    )",
    "CREATE TABLE IF NOT EXISTS tickets (
        id BIGINT PRIMARY KEY,
        created_by BIGINT NOT NULL REFERENCES users (id),
        created_for_name TEXT NOT NULL,
        created_for_email TEXT NOT NULL,
        created_for_phone TEXT,
        created_for_department TEXT,
        subject TEXT NOT NULL,
        details TEXT,
        location TEXT,
        date_created TIMESTAMPTZ NOT NULL DEFAULT now(),
        date_assigned TIMESTAMPTZ,
        date_updated TIMESTAMPTZ,
        date_closed TIMESTAMPTZ,
        priority TEXT NOT NULL DEFAULT 'MEDIUM',
        status TEXT NOT NULL DEFAULT 'OPEN',
        technicians BIGINT[] NOT NULL DEFAULT '{}',
        updates JSONB NOT NULL DEFAULT '[]'
    )",
    "CREATE INDEX IF NOT EXISTS tickets_created_by_idx ON tickets (created_by)",
    "CREATE INDEX IF NOT EXISTS tickets_technicians_idx ON tickets USING GIN (technicians)",
];

const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS tickets",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS sequences",
];

async fn run_all(pool: &PgPool, statements: &[&str]) -> Result<(), DatabaseError> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Creates any missing tables and indexes.
pub async fn apply(pool: &PgPool) -> Result<(), DatabaseError> {
    run_all(pool, CREATE_STATEMENTS).await?;
    info!("Schema applied ({} statements)", CREATE_STATEMENTS.len());
    Ok(())
}

/// Drops every table and recreates the schema empty.
pub async fn reset(pool: &PgPool) -> Result<(), DatabaseError> {
    run_all(pool, DROP_STATEMENTS).await?;
    info!("Dropped existing tables");
    apply(pool).await
}
