use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::models::{Actor, HasRoles, Role, User};
use crate::state::AppState;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Identity snapshot recorded on ticket updates.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user.id,
            username: self.user.username.clone(),
        }
    }
}

impl HasRoles for AuthUser {
    fn roles(&self) -> &[Role] {
        &self.user.roles
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user: claims.user }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
/// Server errors raised further down are logged against the caller.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)?;

    // Validate and decode JWT
    let claims = validate_jwt(&token, &state.config.security)?;

    // Convert claims to AuthUser and inject into request
    let auth_user = AuthUser::from(claims);
    let username = auth_user.user.username.clone();
    request.extensions_mut().insert(auth_user);

    let response = next.run(request).await;
    if response.status().is_server_error() {
        tracing::error!("Exception caused by {}", username);
    }
    Ok(response)
}

/// Tier guard: rejects callers whose roles do not satisfy `required`.
/// Mount with `middleware::from_fn_with_state(Role::X, require_role)` inside
/// the JWT layer.
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !auth_user.satisfies(required) {
        tracing::info!(
            "{} denied: requires {} privileges",
            auth_user.username(),
            required
        );
        return Err(ApiError::forbidden("Access Denied"));
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
