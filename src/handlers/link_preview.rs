use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::PreviewResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkPreviewQuery {
    pub url: Option<String>,
}

/// GET /api/link-preview?url=<encoded-url>
///
/// 400 for a missing url or non-http(s) scheme. Anything that goes wrong
/// while fetching is still a 200 with a minimal `{"type": "link", "url"}` body.
pub async fn get_link_preview(
    State(state): State<AppState>,
    Query(params): Query<LinkPreviewQuery>,
) -> AppResult<Json<PreviewResult>> {
    let result = state.preview.resolve(params.url.as_deref()).await?;
    Ok(Json(result))
}
