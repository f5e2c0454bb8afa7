//! Progress sync route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use shelfsync_sync::SyncRequest;

use crate::routes::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
struct SyncBody {
    user_id: Option<String>,
    books_id: Option<Vec<String>>,
    books_progress: Option<Vec<f64>>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/syncBooks", post(sync_books))
}

async fn sync_books(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SyncBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = SyncRequest {
        user_id: body.user_id.unwrap_or_default(),
        book_ids: body.books_id.unwrap_or_default(),
        progress: body.books_progress.unwrap_or_default(),
    };

    // Connect keys its lock on the login username, so sync must resolve the
    // same key to serialize against it. Unknown ids fall back to the raw id
    // and fail the store lookup inside the syncer.
    let lock_key = match state.store.get(&request.user_id)? {
        Some(identity) => identity.username,
        None => request.user_id.clone(),
    };
    let _guard = state.locks.acquire(&lock_key).await;

    let outcome = state.syncer.sync_progress(&request).await?;
    info!(
        "synced {}/{} books for {}",
        outcome.success_count,
        request.book_ids.len(),
        request.user_id,
    );
    Ok(Json(serde_json::json!({ "message": outcome.message() })))
}
