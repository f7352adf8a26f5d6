//! Poem collection endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use verse_common::model::{NewPoem, Poem};
use verse_common::validation::{validate_poem_id, ValidationError};

use super::ApiError;
use crate::AppState;

/// GET /api/poems
pub async fn list_poems(State(state): State<AppState>) -> Result<Json<Vec<Poem>>, ApiError> {
    Ok(Json(state.store.list_poems().await?))
}

/// POST /api/poems
///
/// Body decoding failures are reported as 400 with the same `{error}` shape
/// as field validation, rather than axum's plain-text rejection.
pub async fn create_poem(
    State(state): State<AppState>,
    body: Result<Json<NewPoem>, JsonRejection>,
) -> Result<(StatusCode, Json<Poem>), ApiError> {
    let Json(draft) = body.map_err(|e| ValidationError::new(e.body_text()))?;
    let poem = state.store.insert_poem(draft).await?;
    Ok((StatusCode::CREATED, Json(poem)))
}

/// DELETE /api/poems/:poem_id
pub async fn delete_poem(
    State(state): State<AppState>,
    Path(poem_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    validate_poem_id(&poem_id)?;
    state.store.delete_poem(&poem_id).await?;
    Ok(Json(json!({ "message": "Poem deleted" })))
}

pub fn poem_routes() -> Router<AppState> {
    Router::new()
        .route("/poems", get(list_poems).post(create_poem))
        .route("/poems/:poem_id", delete(delete_poem))
}
