//! hub-broker library crate.
//!
//! This crate is the message broker that runs inside the hub document.
//! Parent sites post JSON requests to it; it checks the sender's origin,
//! decodes the request, runs the matching route handler and posts a
//! correlated JSON response back to the exact sender origin.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Parent page (JSON text, labelled with its origin)
//!         ↕
//! [hub-broker]
//!   ├── application/      Dispatch pipeline: origin check → decode → route
//!   │                     → execute → emit
//!   └── infrastructure/
//!         ├── listener/     Persistent listener, one task per message
//!         ├── port/         Reply channel bound to one sender origin
//!         ├── cookie_jar/   Reference cookie storage + get/set handlers
//!         ├── config_file/  TOML configuration and allow-list wiring
//!         └── ws_server/    WebSocket host adapter
//! ```
//!
//! # Layer rules
//!
//! - `hub-core` owns the wire types and has no I/O.
//! - `application` depends on `hub-core` and on the traits it declares
//!   ([`application::RouteHandler`], [`application::PostMessage`]) only.
//! - `infrastructure` provides implementations of those traits plus the
//!   runtime plumbing (`tokio`, `tungstenite`, config files).

/// Application layer: the dispatch pipeline.
pub mod application;

/// Infrastructure layer: listener, transports, storage and configuration.
pub mod infrastructure;
