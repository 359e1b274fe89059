use async_trait::async_trait;
use sqlx::FromRow;

use super::manager::DatabaseError;
use super::repository::PgStore;
use super::UserStore;
use crate::models::{Role, User};

const USER_COLUMNS: &str =
    "id, username, hash, roles, local, enabled, first_name, last_name, email, phone, department";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    hash: Option<String>,
    roles: Vec<String>,
    local: bool,
    enabled: bool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    department: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|role| role.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::Corrupt(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            hash: row.hash.filter(|h| !h.is_empty()),
            roles,
            local: row.local,
            enabled: row.enabled,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            department: row.department,
        })
    }
}

fn role_names(user: &User) -> Vec<String> {
    user.roles.iter().map(|r| r.as_str().to_string()).collect()
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>, DatabaseError> {
    rows.into_iter().map(User::try_from).collect()
}

#[async_trait]
impl UserStore for PgStore {
    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool())
            .await?;
        into_users(rows)
    }

    async fn list_at_least(&self, tier: Role) -> Result<Vec<User>, DatabaseError> {
        let qualifying: Vec<String> = Role::ALL
            .iter()
            .filter(|role| role.rank() >= tier.rank())
            .map(|role| role.as_str().to_string())
            .collect();

        let sql = format!("SELECT {} FROM users WHERE roles && $1 ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(qualifying)
            .fetch_all(self.pool())
            .await?;
        into_users(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await?;
        into_users(rows)
    }

    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            USER_COLUMNS
        );
        sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.hash)
            .bind(role_names(user))
            .bind(user.local)
            .bind(user.enabled)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.department)
            .execute(self.pool())
            .await
            .map_err(DatabaseError::from_write)?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, hash = $3, roles = $4, local = $5, enabled = $6,
                first_name = $7, last_name = $8, email = $9, phone = $10, department = $11
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.hash)
        .bind(role_names(user))
        .bind(user.local)
        .bind(user.enabled)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.department)
        .execute(self.pool())
        .await
        .map_err(DatabaseError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {}", user.id)));
        }
        Ok(())
    }
}
