//! # hub-core
//!
//! Shared library for the cross-origin cookie hub containing the origin
//! allow-list, the typed request/response model, and the JSON wire codec.
//!
//! This crate is used by the broker and by anything that needs to speak the
//! hub's protocol (test harnesses, parent-page shims).  It has zero
//! dependencies on async runtimes, sockets, or the browser environment.
//!
//! # Architecture overview (for beginners)
//!
//! The hub is a small document embedded as an iframe by several unrelated
//! parent sites ("dependent apps").  Those parents cannot read the hub's
//! cookies directly, so they post JSON messages to the iframe and the hub
//! answers with JSON messages of its own.
//!
//! This crate defines:
//!
//! - **`domain`** – The trust boundary (which parent origins are allowed to
//!   talk to the hub) and the typed shape of requests and responses.
//!
//! - **`protocol`** – How those typed values travel as JSON text: decoding an
//!   inbound payload into a [`Request`] and encoding a [`Response`].

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `hub_core::Request` instead of `hub_core::domain::request::Request`.
pub use domain::origin::{AllowList, DomainSpec, OriginError, OriginParts};
pub use domain::request::{Config, Expiry, GetterOptions, Request, RequestKind, SetterOptions};
pub use domain::response::{Response, NOT_ALLOWED_MESSAGE};
pub use protocol::codec::{decode_request, encode_request, encode_response, ProtocolError};
