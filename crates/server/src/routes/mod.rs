use axum::{
    Router, middleware,
    routing::{IntoMakeService, get},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, middleware as app_middleware};

pub mod chat;
pub mod health;

pub fn api_router(state: AppState) -> Router {
    let chat_routes = chat::router().layer(middleware::from_fn(app_middleware::require_owner));

    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(chat_routes)
        .with_state(state);

    Router::new()
        .nest("/api", base_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(app_middleware::request_id_middleware))
}

pub fn router(state: AppState) -> IntoMakeService<Router> {
    api_router(state).into_make_service()
}
