pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod shutdown;
pub mod state;

use std::path::PathBuf;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::middleware::{jwt_auth_middleware, require_role};
use crate::models::Role;
use crate::state::AppState;

/// The full HTTP surface: `/api/*` plus the single-page app shell for every
/// other path.
pub fn app(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.server.static_dir);
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api_routes(state.clone()))
        .fallback_service(spa)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
}

fn api_routes(state: AppState) -> Router {
    use handlers::protected::{tickets, users};

    let protected = Router::new()
        // Users
        .route(
            "/users",
            get(users::users_get)
                .post(users::user_post)
                .route_layer(from_fn_with_state(Role::Admin, require_role)),
        )
        .route("/users/technicians", get(users::technicians_get))
        .route("/users/:id", get(users::user_get).patch(users::user_patch))
        // Tickets
        .route(
            "/tickets",
            get(tickets::tickets_get)
                .route_layer(from_fn_with_state(Role::Technician, require_role)),
        )
        .route("/tickets", post(tickets::ticket_post))
        .route("/tickets/submitted", get(tickets::submitted_get))
        .route("/tickets/assigned", get(tickets::assigned_get))
        .route("/tickets/search", get(tickets::search_get))
        .route("/tickets/:id", get(tickets::ticket_get))
        .route(
            "/tickets/:id",
            delete(tickets::ticket_delete)
                .route_layer(from_fn_with_state(Role::Admin, require_role)),
        )
        .route(
            "/tickets/:id/technicians",
            put(tickets::technicians_put)
                .route_layer(from_fn_with_state(Role::Supervisor, require_role)),
        )
        .route(
            "/tickets/:id/technicians/:user_id",
            delete(tickets::technician_delete)
                .route_layer(from_fn_with_state(Role::Supervisor, require_role)),
        )
        .route(
            "/tickets/:id/updates",
            post(tickets::updates_post)
                .route_layer(from_fn_with_state(Role::Technician, require_role)),
        )
        .route(
            "/tickets/:id/status/:value",
            put(tickets::status_put)
                .route_layer(from_fn_with_state(Role::Supervisor, require_role)),
        )
        .route(
            "/tickets/:id/priority/:value",
            put(tickets::priority_put)
                .route_layer(from_fn_with_state(Role::Supervisor, require_role)),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/login", post(handlers::public::login_post))
        .merge(protected)
        // Unknown API paths get a bare 404, never the SPA shell
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if config.is_development() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
