//! Application layer for hub-broker.
//!
//! The application layer is the dispatch pipeline itself.  It knows *what*
//! to do with an inbound message, and delegates *how* replies are delivered
//! and *how* values are stored to traits implemented by the infrastructure
//! layer.
//!
//! # Pipeline
//!
//! ```text
//! Received → OriginChecked ─┬─ Rejected ───────────────────────────┐
//!                           └─ Decoding ─┬─ DecodeFailed (drop)     │
//!                                        └─ Routed ─┬─ NoHandler (drop)
//!                                                   └─ Executed ────┴→ Emitted
//! ```

pub mod broker;
pub mod emitter;
pub mod executor;
pub mod handler;
pub mod router;

pub use broker::{Broker, DispatchOutcome, InboundMessage};
pub use emitter::{emit_response, EmitError, PostMessage};
pub use executor::{execute_route, HandlerFailure};
pub use handler::{handler_fn, RouteHandler, SharedHandler};
pub use router::{RouteName, RouteTable};
