use sqlx::SqlitePool;

use crate::preview::LinkPreviewResolver;

/// Shared application state passed to all handlers.
/// The resolver wraps a pooled HTTP client and is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub preview: LinkPreviewResolver,
}
