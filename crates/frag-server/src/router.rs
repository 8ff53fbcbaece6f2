use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all fragment endpoints.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let v1 = Router::new()
        .route(
            "/fragments",
            get(handler::list_fragments).post(handler::create_fragment),
        )
        .route(
            "/fragments/:id",
            get(handler::get_fragment)
                .put(handler::update_fragment)
                .delete(handler::delete_fragment),
        )
        .route("/fragments/:id/info", get(handler::get_fragment_info))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(handler::health_handler))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
