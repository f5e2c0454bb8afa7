//! Account connection route.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
struct ConnectParams {
    user: Option<String>,
    pass: Option<String>,
    force: Option<bool>,
}

#[derive(Serialize)]
struct ConnectResponse {
    user_id: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/connect", get(connect))
}

async fn connect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let user = params.user.unwrap_or_default();
    let pass = params.pass.unwrap_or_default();
    let force = params.force.unwrap_or(true);

    // Connect keys its lock on the username; the external id is not known yet.
    let _guard = state.locks.acquire(&user).await;

    let user_id = state.sessions.authenticate(&user, &pass, force).await?;
    info!("connected {} as {}", user, user_id);
    Ok(Json(ConnectResponse { user_id }))
}
