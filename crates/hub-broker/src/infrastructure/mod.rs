//! Infrastructure layer for hub-broker.
//!
//! The infrastructure layer handles everything the dispatch pipeline treats
//! as an external collaborator.
//!
//! # Responsibilities
//!
//! - Keeping one persistent listener alive and spawning a pipeline task per
//!   inbound message (`listener`)
//! - Binding reply ports to a single sender origin (`port`)
//! - Storing cookie values and serving the standard get/set routes
//!   (`cookie_jar`)
//! - Loading the TOML configuration and turning it into an allow-list
//!   (`config_file`)
//! - Hosting the broker behind a WebSocket endpoint (`ws_server`)
//!
//! # What does NOT belong here?
//!
//! - Origin matching, routing precedence or failure containment (that is
//!   the application layer)
//! - Wire type definitions (that is `hub-core`)

pub mod config_file;
pub mod cookie_jar;
pub mod listener;
pub mod port;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use listener::{listen, Envelope};
pub use port::ChannelPort;
pub use ws_server::run_server;
