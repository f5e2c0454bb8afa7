//! Book listing route.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use shelfsync_feed::Book;

use crate::routes::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
struct BooksResponse {
    books: Vec<Book>,
    shelves: Vec<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/getBooks/{user_id}", get(get_books))
}

async fn get_books(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<BooksResponse>, ApiError> {
    let (books, shelves) = state.feed.fetch_all_books(&user_id).await?;
    info!("fetched {} books for {}", books.len(), user_id);
    Ok(Json(BooksResponse { books, shelves }))
}
