// handlers/protected/users/create.rs - POST /api/users handler

use axum::{
    extract::{Extension, State},
    response::Json,
};
use tracing::info;

use crate::api::JsonBody;
use crate::auth::password;
use crate::database::USER_ID_SEQUENCE;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::{NewUser, User};
use crate::state::AppState;

/// Creates an account. Local accounts get their password hashed; directory
/// accounts are stored without a hash. Duplicate username or email is 409.
pub async fn user_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(mut new_user): JsonBody<NewUser>,
) -> ApiResult<Json<User>> {
    new_user.validate()?;

    let hash = match (new_user.local, new_user.password.clone()) {
        (true, Some(plain)) => Some(password::hash_blocking(plain).await?),
        _ => None,
    };

    let id = state.sequences.next_value(USER_ID_SEQUENCE).await?;
    let user = new_user.into_user(id, hash);
    state.users.insert(&user).await?;

    info!("{} created user {}", auth.username(), user.id);
    Ok(Json(user))
}
