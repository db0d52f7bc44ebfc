//! Route execution with failure containment.
//!
//! Whatever a handler does, the sender gets exactly one response back: the
//! handler's own response when it succeeds, or a failure response carrying
//! the request's data key and the failure text when it returns an error or
//! panics.  Nothing a handler does can tear down the pipeline.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use hub_core::{Config, Response};
use thiserror::Error;

use crate::application::handler::RouteHandler;

/// Text used when a panic payload carries no message.
const OPAQUE_PANIC: &str = "handler panicked";

/// Ways a handler can fail.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned `Err`.
    #[error("{0}")]
    Error(anyhow::Error),

    /// The handler panicked while running.
    #[error("{0}")]
    Panic(String),
}

impl HandlerFailure {
    /// `"error"` or `"panic"`; logged instead of the text, which may echo
    /// request data.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Panic(_) => "panic",
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            OPAQUE_PANIC.to_string()
        };
        Self::Panic(text)
    }
}

/// Runs `handler` for one request and always produces a [`Response`].
pub async fn execute_route(handler: &dyn RouteHandler, data_key: &str, config: Config) -> Response {
    let outcome = match AssertUnwindSafe(handler.handle(data_key.to_string(), config))
        .catch_unwind()
        .await
    {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(error)) => Err(HandlerFailure::Error(error)),
        Err(payload) => Err(HandlerFailure::from_panic(payload)),
    };
    into_response(data_key, outcome)
}

/// The single conversion from a handler outcome to the response posted back.
///
/// A successful handler response is forwarded untouched; the handler is
/// trusted to have shaped it.
pub fn into_response(data_key: &str, outcome: Result<Response, HandlerFailure>) -> Response {
    match outcome {
        Ok(response) => response,
        Err(failure) => {
            tracing::debug!(data_key, failure = failure.label(), "handler failed");
            Response::failure(data_key, failure.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
