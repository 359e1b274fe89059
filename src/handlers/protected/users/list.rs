// handlers/protected/users/list.rs - user listings

use axum::{extract::State, response::Json};

use crate::error::ApiResult;
use crate::models::{Role, User};
use crate::state::AppState;

/// GET /api/users - every account, hashes excluded
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

/// GET /api/users/technicians - every technician-tier account
pub async fn technicians_get(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_at_least(Role::Technician).await?))
}
