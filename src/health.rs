//! Liveness endpoint.
//!
//! A tiny HTTP listener answering every `GET`/`HEAD` with `200` and a fixed
//! plaintext body, so a hosting platform sees an open port. It shares nothing
//! with the Discord connection and keeps answering whether or not that is up.

use crate::config::HealthConfig;
use crate::error::{NotifierError, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

#[derive(Clone)]
struct HealthState {
    body: Arc<str>,
}

/// Router answering any path.
pub fn router(body: &str) -> Router {
    let state = HealthState {
        body: Arc::from(body),
    };
    Router::new().fallback(liveness).with_state(state)
}

async fn liveness(State(state): State<HealthState>, method: Method) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.body.to_string(),
    )
        .into_response()
}

/// Bind the listener and serve until the process exits.
///
/// # Errors
///
/// Returns [`NotifierError::HealthBind`] when the port cannot be bound.
pub async fn serve(config: &HealthConfig) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| NotifierError::HealthBind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    tracing::info!("health check listening on http://{local_addr}");
    axum::serve(listener, router(&config.body)).await?;
    Ok(())
}

/// Run [`serve`] on its own task. Failures are logged and never propagate.
pub fn spawn(config: HealthConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = serve(&config).await {
            tracing::error!("health check unavailable, continuing without it: {err}");
        }
    })
}
