use sqlx::PgPool;

use crate::auth::password;
use crate::database::{
    schema, PgStore, SequenceStore, UserStore, TICKET_ID_SEQUENCE, USER_ID_SEQUENCE,
};
use crate::models::{NewUser, Role};

/// Sequences start here on a fresh install.
pub const SEQUENCE_START: i64 = 10000;

/// Id of the bootstrap administrator.
pub const ADMIN_ID: i64 = 1000;

/// Idempotent: existing sequences and an existing admin are left alone.
pub async fn handle(pool: &PgPool, admin_username: &str, admin_password: String) -> anyhow::Result<()> {
    schema::apply(pool).await?;
    let store = PgStore::new(pool.clone());

    for name in [USER_ID_SEQUENCE, TICKET_ID_SEQUENCE] {
        if store.exists(name).await? {
            println!("Sequence {} already initialized", name);
        } else {
            store.seed(name, SEQUENCE_START).await?;
            println!("Sequence {} seeded at {}", name, SEQUENCE_START);
        }
    }

    if store.find(ADMIN_ID).await?.is_some() {
        println!("Admin account {} already exists", ADMIN_ID);
        return Ok(());
    }

    let mut admin = NewUser {
        username: admin_username.to_string(),
        email: format!("{}@localhost.localdomain", admin_username),
        password: Some(admin_password.clone()),
        local: true,
        enabled: true,
        roles: vec![Role::Admin],
        first_name: Some("System".to_string()),
        last_name: Some("Administrator".to_string()),
        phone: None,
        department: None,
    };
    admin.validate()?;
    let hash = password::hash_blocking(admin_password).await?;
    let admin = admin.into_user(ADMIN_ID, Some(hash));
    UserStore::insert(&store, &admin).await?;

    println!("Created admin account '{}' (id {})", admin.username, admin.id);
    Ok(())
}
