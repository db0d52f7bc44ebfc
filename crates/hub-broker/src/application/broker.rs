//! The broker: one long-lived component with a single entry point.
//!
//! [`Broker::handle_message`] runs the whole pipeline for one inbound
//! message.  The allow-list and route table are injected at construction and
//! never change afterwards, so any number of pipelines can run at once
//! without locking.
//!
//! # Failure policy
//!
//! | Condition              | Reply                                   |
//! |------------------------|-----------------------------------------|
//! | origin not allowed     | generic failure, empty `dataKey`        |
//! | payload not a request  | none (silent drop)                      |
//! | no route for request   | none (silent drop)                      |
//! | handler error/panic    | failure with request `dataKey` and text |
//!
//! The asymmetry is intentional.  The message channel is shared with
//! unrelated scripts (ads, extensions, dev tooling), so undecodable or
//! unroutable traffic is treated as noise.  A sender that is recognisably
//! talking to the hub but is not trusted gets an explicit denial.

use std::sync::Arc;

use hub_core::{decode_request, AllowList, Response};
use tracing::{debug, trace, warn, Instrument};
use uuid::Uuid;

use crate::application::emitter::{emit_response, PostMessage};
use crate::application::executor::execute_route;
use crate::application::router::RouteTable;

/// One message received on the cross-document channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Serialized origin of the sending window, as labelled by the transport.
    pub origin: String,
    /// Raw payload; a JSON-encoded request when it is meant for the hub.
    pub data: String,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Terminal state reached by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The sender is not allow-listed; the generic denial was posted.
    Rejected,
    /// The payload was not a hub request; nothing was posted.
    DecodeFailed,
    /// No route serves the request; nothing was posted.
    NoHandler,
    /// A handler ran and this response was posted.
    Responded(Response),
    /// A response was produced but the port did not deliver it.
    Undelivered(Response),
}

impl DispatchOutcome {
    /// Variant name, for logs.  Unlike `Debug`, never includes response data.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::DecodeFailed => "decode_failed",
            Self::NoHandler => "no_handler",
            Self::Responded(_) => "responded",
            Self::Undelivered(_) => "undelivered",
        }
    }
}

/// The message broker.
///
/// Cloning is cheap: the allow-list and route table sit behind `Arc`s and
/// are shared by every clone.
#[derive(Debug, Clone)]
pub struct Broker {
    allow_list: Arc<AllowList>,
    routes: Arc<RouteTable>,
}

impl Broker {
    pub fn new(allow_list: AllowList, routes: RouteTable) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
            routes: Arc::new(routes),
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Runs the dispatch pipeline for one inbound message.
    ///
    /// Posts at most one message, and only to `message.origin` through
    /// `port`.  Never fails: every error is contained and reflected in the
    /// returned [`DispatchOutcome`].  If the matched handler never completes,
    /// neither does this future.
    pub async fn handle_message(&self, message: InboundMessage, port: &dyn PostMessage) -> DispatchOutcome {
        let span = tracing::debug_span!(
            "dispatch",
            id = %Uuid::new_v4(),
            origin = %message.origin,
        );
        self.dispatch(message, port).instrument(span).await
    }

    async fn dispatch(&self, message: InboundMessage, port: &dyn PostMessage) -> DispatchOutcome {
        let InboundMessage { origin, data } = message;

        if !self.allow_list.approves(&origin) {
            warn!("rejected message from origin not on the allow-list");
            return match emit(port, &origin, Response::not_allowed()) {
                Ok(_) => DispatchOutcome::Rejected,
                Err(response) => DispatchOutcome::Undelivered(response),
            };
        }

        let request = match decode_request(&data) {
            Ok(request) => request,
            Err(e) => {
                // `ProtocolError` messages carry positions, not payload text.
                trace!("dropping undecodable message: {e}");
                return DispatchOutcome::DecodeFailed;
            }
        };

        let Some((route, handler)) = self.routes.resolve(&request.kind, &request.data_key) else {
            trace!(kind = %request.kind, data_key = %request.data_key, "dropping unroutable request");
            return DispatchOutcome::NoHandler;
        };

        debug!(%route, data_key = %request.data_key, "executing route");
        let response = execute_route(handler.as_ref(), &request.data_key, request.config).await;

        match emit(port, &origin, response) {
            Ok(response) => DispatchOutcome::Responded(response),
            Err(response) => DispatchOutcome::Undelivered(response),
        }
    }
}

/// Emits `response`, handing it back in whichever variant says whether it
/// was delivered.
fn emit(port: &dyn PostMessage, origin: &str, response: Response) -> Result<Response, Response> {
    match emit_response(port, origin, &response) {
        Ok(()) => {
            debug!(data_key = %response.data_key(), failure = response.is_failure(), "response emitted");
            Ok(response)
        }
        Err(e) => {
            warn!("response not delivered: {e}");
            Err(response)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::emitter::{EmitError, MockPostMessage};
    use crate::application::handler::handler_fn;
    use hub_core::{DomainSpec, NOT_ALLOWED_MESSAGE};
    use mockall::predicate::{always, eq};

    const TRUSTED: &str = "https://app.example.com";

    fn broker() -> Broker {
        let routes = RouteTable::new()
            .with_getter(handler_fn(|key, _| async move {
                Ok(Response::success(key, Some("generic".into())))
            }))
            .with_setter(handler_fn(|key, _| async move {
                Ok(Response::success(key, Some("stored".into())))
            }));
        Broker::new(
            AllowList::new(vec![DomainSpec::any_port("app.example.com")]),
            routes,
        )
    }

    fn get_payload(key: &str) -> String {
        format!(
            r#"{{"dataKey":"{key}","kind":"get","config":{{"cookieName":"c","iframeUrl":"u"}}}}"#
        )
    }

    #[tokio::test]
    async fn test_untrusted_origin_gets_generic_denial() {
        let mut port = MockPostMessage::new();
        port.expect_post_message()
            .with(
                eq(format!(r#"{{"dataKey":"","error":"{NOT_ALLOWED_MESSAGE}"}}"#)),
                eq("https://evil.example.net"),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = broker()
            .handle_message(InboundMessage::new("https://evil.example.net", get_payload("k")), &port)
            .await;

        assert_eq!(outcome, DispatchOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_untrusted_origin_with_garbage_payload_still_gets_denial() {
        // The origin check comes before decoding.
        let mut port = MockPostMessage::new();
        port.expect_post_message().times(1).returning(|_, _| Ok(()));

        let outcome = broker()
            .handle_message(InboundMessage::new("null", "not json"), &port)
            .await;

        assert_eq!(outcome, DispatchOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_decode_failure_posts_nothing() {
        let mut port = MockPostMessage::new();
        port.expect_post_message().times(0);

        let outcome = broker()
            .handle_message(InboundMessage::new(TRUSTED, "{\"type\":\"webpackOk\"}"), &port)
            .await;

        assert_eq!(outcome, DispatchOutcome::DecodeFailed);
    }

    #[tokio::test]
    async fn test_trusted_get_is_answered_on_sender_origin() {
        let mut port = MockPostMessage::new();
        port.expect_post_message()
            .with(always(), eq(TRUSTED))
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = broker()
            .handle_message(InboundMessage::new(TRUSTED, get_payload("prefs")), &port)
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Responded(Response::success("prefs", Some("generic".into())))
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported_not_raised() {
        let mut port = MockPostMessage::new();
        port.expect_post_message().times(1).returning(|_, origin| {
            Err(EmitError::Delivery {
                origin: origin.to_string(),
                reason: "peer gone".into(),
            })
        });

        let outcome = broker()
            .handle_message(InboundMessage::new(TRUSTED, get_payload("prefs")), &port)
            .await;

        assert!(matches!(outcome, DispatchOutcome::Undelivered(_)));
    }

    #[tokio::test]
    async fn test_clones_share_configuration() {
        let original = broker();
        let clone = original.clone();
        assert!(Arc::ptr_eq(&original.allow_list, &clone.allow_list));
        assert!(Arc::ptr_eq(&original.routes, &clone.routes));
    }
}
