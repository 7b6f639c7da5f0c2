use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

/// Application routes shared by the binary and the integration tests.
/// Middleware (CORS, tracing, metrics) is layered on in `main`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Mind map CRUD
        .route(
            "/api/mindmaps",
            post(handlers::mindmaps::create_mindmap).get(handlers::mindmaps::list_mindmaps),
        )
        .route(
            "/api/mindmaps/:id",
            get(handlers::mindmaps::get_mindmap)
                .put(handlers::mindmaps::replace_mindmap)
                .patch(handlers::mindmaps::update_mindmap)
                .delete(handlers::mindmaps::delete_mindmap),
        )
        // Link preview
        .route(
            "/api/link-preview",
            get(handlers::link_preview::get_link_preview),
        )
        .with_state(state)
}
