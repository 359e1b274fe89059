// handlers/public/login.rs - POST /api/login handler

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{generate_jwt, password};
use crate::auth::directory::DirectoryError;
use crate::error::{ApiError, ApiResult};
use crate::models::user::normalize_identifier;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct LoginParams {
    username: Option<String>,
    password: Option<String>,
}

fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<LoginParams, ApiError> {
    if body.is_empty() {
        return Ok(LoginParams::default());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| ApiError::bad_request(format!("Invalid form body: {}", e)))
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/**
 * POST /api/login - exchange credentials for a JWT
 *
 * `username` and `password` come from the query string or from a JSON or
 * form-encoded body. Query parameters win, and the body is only read when
 * the query string leaves one of them out.
 *
 * Output: `{ "token": "eyJhbGciOiJIUzI1NiI..." }`
 *
 * 400 when either credential is missing, 401 `Login failed` for an unknown
 * user, a disabled account, a wrong password or a refused directory bind.
 */
pub async fn login_post(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let from_query: LoginParams = match query.as_deref() {
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?,
        None => LoginParams::default(),
    };
    let mut username = non_empty(from_query.username);
    let mut password = non_empty(from_query.password);
    if username.is_none() || password.is_none() {
        let from_body = parse_body(&headers, &body)?;
        username = username.or(non_empty(from_body.username));
        password = password.or(non_empty(from_body.password));
    }
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::bad_request("Missing username/password"));
    };
    let username = normalize_identifier(&username);

    let login_failed = || {
        info!("{} login failed", username);
        ApiError::unauthorized("Login failed")
    };

    let user = match state.users.find_by_username(&username).await? {
        Some(user) if user.enabled => user,
        _ => return Err(login_failed()),
    };

    if user.local {
        let Some(hash) = user.hash.clone() else {
            return Err(login_failed());
        };
        if !password::verify_blocking(password, hash).await? {
            return Err(login_failed());
        }
    } else {
        match state.directory.bind(&user.username, &password).await {
            Ok(()) => {}
            Err(DirectoryError::Rejected) => return Err(login_failed()),
            Err(e) => return Err(e.into()),
        }
    }

    let token = generate_jwt(user, &state.config.security)?;
    info!("{} login successful", username);
    Ok(Json(json!({ "token": token })))
}
