use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth_gateway::AuthGateway;
use crate::db::RecordStore;
use crate::handlers::{self, startups, users};
use crate::middleware::auth::{RequiredRole, require_identity, require_role};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub gateway: Arc<dyn AuthGateway>,
}

impl AppState {
    pub fn new(store: RecordStore, gateway: Arc<dyn AuthGateway>) -> Self {
        Self { store, gateway }
    }
}

pub fn registry_router(state: AppState) -> Router {
    // Guard order: identity first (outer), then the per-route role check.
    let records = Router::new()
        .route(
            "/api/v1/startups/",
            get(startups::list_startups).post(startups::create_startup),
        )
        .route(
            "/api/v1/startups",
            get(startups::list_startups).post(startups::create_startup),
        )
        .route(
            "/api/v1/startups/{startup_id}",
            put(startups::update_startup).merge(
                delete(startups::delete_startup)
                    .route_layer(from_fn_with_state(RequiredRole::ADMIN, require_role)),
            ),
        )
        .route_layer(from_fn_with_state(state.clone(), require_identity));

    let accounts = Router::new()
        .route("/api/v1/users/signup", post(users::signup))
        .route("/api/v1/users/login", post(users::login))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(accounts)
        .merge(records)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
