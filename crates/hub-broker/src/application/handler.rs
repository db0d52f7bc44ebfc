//! The route handler seam.
//!
//! A handler is the collaborator that actually reads or writes the stored
//! value.  The broker treats it as an opaque async function: it is given the
//! request's data key and its decoded [`Config`], and returns either a
//! [`Response`] it shaped itself or an error.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use hub_core::{Config, Response};

/// An async request handler.
///
/// Returning `Err` is how a handler reports failure; the broker turns the
/// error's message into a failure response carrying the request's data key.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, data_key: String, config: Config) -> anyhow::Result<Response>;
}

/// Handlers are shared between every in-flight pipeline.
pub type SharedHandler = Arc<dyn RouteHandler>;

/// Adapts a plain async closure into a [`RouteHandler`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(String, Config) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
    async fn handle(&self, data_key: String, config: Config) -> anyhow::Result<Response> {
        (self.f)(data_key, config).await
    }
}

/// Wraps an async closure as a [`SharedHandler`].
///
/// # Example
///
/// ```rust
/// use hub_broker::application::handler_fn;
/// use hub_core::Response;
///
/// let echo = handler_fn(|data_key, config| async move {
///     Ok(Response::success(data_key, Some(config.cookie_name().to_string())))
/// });
/// # let _ = echo;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(String, Config) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
