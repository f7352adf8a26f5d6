//! Per-user progress endpoints
//!
//! Progress is keyed by an opaque client-generated user id; the id format is
//! checked on every route.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use verse_common::model::{PoemProgress, UserProgress};
use verse_common::validation::{validate_poem_id, validate_progress, validate_user_id, ValidationError};

use super::ApiError;
use crate::AppState;

/// GET /api/progress/:user_id
pub async fn get_user_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgress>, ApiError> {
    validate_user_id(&user_id)?;
    Ok(Json(state.store.get_user_progress(&user_id).await?))
}

/// GET /api/progress/:user_id/:poem_id
///
/// Responds with JSON `null` when nothing is stored.
pub async fn get_progress(
    State(state): State<AppState>,
    Path((user_id, poem_id)): Path<(String, String)>,
) -> Result<Json<Option<PoemProgress>>, ApiError> {
    validate_user_id(&user_id)?;
    validate_poem_id(&poem_id)?;
    Ok(Json(state.store.get_progress(&user_id, &poem_id).await?))
}

/// PUT /api/progress/:user_id/:poem_id
pub async fn put_progress(
    State(state): State<AppState>,
    Path((user_id, poem_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PoemProgress>, ApiError> {
    validate_user_id(&user_id)?;
    validate_poem_id(&poem_id)?;
    let Json(raw) = body.map_err(|e| ValidationError::new(e.body_text()))?;
    let entry = validate_progress(&raw)?;
    Ok(Json(state.store.put_progress(&user_id, &poem_id, entry).await?))
}

/// DELETE /api/progress/:user_id/:poem_id
pub async fn delete_progress(
    State(state): State<AppState>,
    Path((user_id, poem_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    validate_user_id(&user_id)?;
    validate_poem_id(&poem_id)?;
    state.store.delete_progress(&user_id, &poem_id).await?;
    Ok(Json(json!({ "message": "Progress deleted" })))
}

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress/:user_id", get(get_user_progress))
        .route(
            "/progress/:user_id/:poem_id",
            get(get_progress).put(put_progress).delete(delete_progress),
        )
}
