use sqlx::PgPool;

use crate::auth::password;
use crate::database::{fixture, schema, PgStore};

/// Drops every table, recreates the schema and loads the sample dataset.
pub async fn handle(pool: &PgPool) -> anyhow::Result<()> {
    schema::reset(pool).await?;

    let store = PgStore::new(pool.clone());
    let hash = password::hash_blocking(fixture::FIXTURE_PASSWORD.to_string()).await?;
    fixture::load(&store, &store, &store, &hash).await?;

    println!(
        "Fixture loaded; every account uses password '{}'",
        fixture::FIXTURE_PASSWORD
    );
    Ok(())
}
