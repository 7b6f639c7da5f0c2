use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{types::Json as DbJson, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{default_mindmap_data, MindMap},
    state::AppState,
};

const MINDMAP_COLUMNS: &str = "id, title, description, data, created_at, updated_at";

// ============================================================================
// Input validation
// ============================================================================

#[derive(Debug, serde::Deserialize, Validate)]
pub struct CreateMindMapRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be 1–200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpdateMindMapRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1–200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub data: Option<Value>,
}

fn require_non_blank(title: Option<&str>) -> AppResult<()> {
    match title {
        Some(t) if t.trim().is_empty() => {
            Err(AppError::Validation("Title must not be blank".into()))
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Private helpers
// ============================================================================

async fn fetch_mindmap(pool: &SqlitePool, id: i64) -> AppResult<MindMap> {
    sqlx::query_as::<_, MindMap>(&format!(
        "SELECT {MINDMAP_COLUMNS} FROM mindmaps WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Mind map not found".into()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/mindmaps — list all mind maps, oldest first.
pub async fn list_mindmaps(State(state): State<AppState>) -> AppResult<Json<Vec<MindMap>>> {
    let maps = sqlx::query_as::<_, MindMap>(&format!(
        "SELECT {MINDMAP_COLUMNS} FROM mindmaps ORDER BY id ASC"
    ))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(maps))
}

/// POST /api/mindmaps — create a mind map. `data` defaults to a lone root node.
pub async fn create_mindmap(
    State(state): State<AppState>,
    Json(req): Json<CreateMindMapRequest>,
) -> AppResult<(StatusCode, Json<MindMap>)> {
    req.validate()?;
    require_non_blank(Some(&req.title))?;

    let data = req.data.unwrap_or_else(default_mindmap_data);
    let now = Utc::now();

    let map = sqlx::query_as::<_, MindMap>(&format!(
        "INSERT INTO mindmaps (title, description, data, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {MINDMAP_COLUMNS}"
    ))
    .bind(&req.title)
    .bind(&req.description)
    .bind(DbJson(data))
    .bind(now)
    .bind(now)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(id = map.id, "Mind map created");
    Ok((StatusCode::CREATED, Json(map)))
}

/// GET /api/mindmaps/:id — fetch a single mind map.
pub async fn get_mindmap(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MindMap>> {
    let map = fetch_mindmap(&state.pool, id).await?;
    Ok(Json(map))
}

/// PUT /api/mindmaps/:id — replace title, description and data.
/// Omitted optional fields are cleared.
pub async fn replace_mindmap(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateMindMapRequest>,
) -> AppResult<Json<MindMap>> {
    req.validate()?;
    require_non_blank(Some(&req.title))?;
    fetch_mindmap(&state.pool, id).await?;

    let map = sqlx::query_as::<_, MindMap>(&format!(
        "UPDATE mindmaps
         SET title       = ?,
             description = ?,
             data        = ?,
             updated_at  = ?
         WHERE id = ?
         RETURNING {MINDMAP_COLUMNS}"
    ))
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.data.map(DbJson))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(map))
}

/// PATCH /api/mindmaps/:id — update only the supplied fields.
pub async fn update_mindmap(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMindMapRequest>,
) -> AppResult<Json<MindMap>> {
    req.validate()?;
    require_non_blank(req.title.as_deref())?;
    fetch_mindmap(&state.pool, id).await?;

    let map = sqlx::query_as::<_, MindMap>(&format!(
        "UPDATE mindmaps
         SET title       = COALESCE(?, title),
             description = COALESCE(?, description),
             data        = COALESCE(?, data),
             updated_at  = ?
         WHERE id = ?
         RETURNING {MINDMAP_COLUMNS}"
    ))
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.data.map(DbJson))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(map))
}

/// DELETE /api/mindmaps/:id
pub async fn delete_mindmap(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM mindmaps WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Mind map not found".into()));
    }

    tracing::info!(id, "Mind map deleted");
    Ok(StatusCode::NO_CONTENT)
}
