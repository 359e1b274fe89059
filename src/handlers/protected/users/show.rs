// handlers/protected/users/show.rs - GET /api/users/:id handler

use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::api::PathParams;
use crate::auth::gate::can_access_profile;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::state::AppState;

pub async fn user_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Json<User>> {
    if !can_access_profile(&auth, auth.id(), id) {
        return Err(ApiError::forbidden("Access Denied"));
    }

    state
        .users
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No user found"))
}
