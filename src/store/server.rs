//! Store server: plain HTTP routes over a [`MemoryStore`].
//!
//! The server validates nothing about record contents — it is a dumb
//! last-writer-wins key-value space, exactly the contract the session
//! synchronizer is written against.

use super::{GameStore, MemoryStore};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{debug, info};

/// Builds the store router over the given backing store.
pub fn router(store: MemoryStore) -> Router {
    Router::new()
        .route(
            "/games/{code}",
            get(get_game).put(put_game).delete(delete_game),
        )
        .with_state(store)
}

/// Binds and serves the store until the process exits.
pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(host, port, "store server listening");
    axum::serve(listener, router(MemoryStore::new())).await?;
    Ok(())
}

async fn get_game(State(store): State<MemoryStore>, Path(code): Path<String>) -> impl IntoResponse {
    debug!(code = %code, "get record");
    match store.get(&code).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn put_game(
    State(store): State<MemoryStore>,
    Path(code): Path<String>,
    Json(record): Json<Value>,
) -> impl IntoResponse {
    debug!(code = %code, "put record");
    match store.put(&code, record).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn delete_game(
    State(store): State<MemoryStore>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    debug!(code = %code, "delete record");
    match store.remove(&code).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
