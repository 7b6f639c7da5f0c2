use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{types::Json, FromRow};

mod link_preview;
pub use link_preview::{LinkPreview, PreviewResult};

// ============================================================================
// Mind Map Models
// ============================================================================

/// A stored mind map. `data` is an opaque JSON document owned by the editor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MindMap {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub data: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document given to new mind maps created without `data`.
pub fn default_mindmap_data() -> Value {
    json!({ "name": "root", "HTML": "" })
}
