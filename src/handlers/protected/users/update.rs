// handlers/protected/users/update.rs - PATCH /api/users/:id handler

use axum::{
    extract::{Extension, State},
    response::Json,
};
use tracing::info;

use crate::api::{JsonBody, PathParams};
use crate::auth::gate::can_access_profile;
use crate::auth::password;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{HasRoles, User, UserPatch};
use crate::state::AppState;

/// Partial update. Owners may change profile fields and their password;
/// admins may change everything but the id.
pub async fn user_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
    JsonBody(mut patch): JsonBody<UserPatch>,
) -> ApiResult<Json<User>> {
    if !can_access_profile(&auth, auth.id(), id) {
        return Err(ApiError::forbidden("Access Denied"));
    }
    if !auth.is_admin() {
        patch.restrict_to_profile();
    }

    let mut user = state
        .users
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user found"))?;

    let new_password = patch.password.take().filter(|p| !p.is_empty());
    patch.apply(&mut user)?;
    if let Some(plain) = new_password {
        if user.local {
            user.hash = Some(password::hash_blocking(plain).await?);
        }
    }

    state.users.save(&user).await?;
    info!("{} edited user {}", auth.username(), id);
    Ok(Json(user))
}
