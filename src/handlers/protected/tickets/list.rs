// handlers/protected/tickets/list.rs - ticket listings and search

use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;

use crate::api::QueryParams;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{HasRoles, Ticket};
use crate::state::AppState;

/// GET /api/tickets - all tickets
pub async fn tickets_get(State(state): State<AppState>) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list().await?))
}

/// GET /api/tickets/submitted - tickets the caller opened
pub async fn submitted_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_submitted_by(auth.id()).await?))
}

/// GET /api/tickets/assigned - tickets the caller works on
pub async fn assigned_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_assigned_to(auth.id()).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

/// GET /api/tickets/search?q= - ranked text search. Callers below the
/// technician tier only search their own submissions.
pub async fn search_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::field_error("q", "Search query cannot be empty"));
    }

    let scope = (!auth.is_technician()).then(|| auth.id());
    Ok(Json(state.tickets.search(query, scope).await?))
}
