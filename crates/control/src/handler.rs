//! Request handling.
//!
//! One route, `/`, accepting any HTTP method. The body is decoded here
//! rather than through the `Json` extractor so malformed documents get the
//! same structured error as every other failure.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::time::timeout;
use tracing::{debug, info_span, warn, Instrument, Span};

use corelib::DhtEngine;

use crate::error::{ApiError, Result};
use crate::request::{Command, ControlRequest};

/// Shared state for the control-plane handlers.
///
/// The engine is shared with the bootstrap manager; no extra locking is
/// added here.
#[derive(Clone)]
pub struct ControlState {
    engine: Arc<dyn DhtEngine>,
    request_timeout: Duration,
    span: Span,
}

impl ControlState {
    pub fn new(engine: Arc<dyn DhtEngine>, request_timeout: Duration) -> Self {
        Self {
            engine,
            request_timeout,
            span: info_span!("control"),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

pub fn build_router(state: ControlState) -> Router {
    // Values are opaque and unbounded; axum would otherwise answer oversized
    // bodies with a plain-text 413.
    Router::new()
        .route("/", any(handle))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn handle(State(state): State<ControlState>, body: Bytes) -> Response {
    let span = state.span.clone();
    async move {
        match dispatch(&state, &body).await {
            Ok(response) => response,
            Err(err) => {
                if err.status().is_server_error() {
                    warn!(code = err.code(), error = %err, "request failed");
                } else {
                    debug!(code = err.code(), error = %err, "request rejected");
                }
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn dispatch(state: &ControlState, body: &[u8]) -> Result<Response> {
    let command = ControlRequest::from_body(body)?.into_command()?;
    debug!(method = command.method(), key = %command.key(), "request");

    match command {
        Command::Put { key, value } => {
            run(state, state.engine.put(&key, value)).await?;
            Ok(StatusCode::OK.into_response())
        }
        Command::Get { key } => {
            let value = run(state, state.engine.get(&key)).await?;
            Ok((
                [(header::CONTENT_TYPE, "application/octet-stream")],
                value,
            )
                .into_response())
        }
    }
}

/// Apply the per-request deadline to an engine call.
async fn run<T>(
    state: &ControlState,
    call: impl std::future::Future<Output = corelib::Result<T>>,
) -> Result<T> {
    match timeout(state.request_timeout, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout(state.request_timeout)),
    }
}
