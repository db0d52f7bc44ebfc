//! Domain types for the cookie hub.
//!
//! Everything here is pure data plus pure functions: no I/O, no async, no
//! global state.  The allow-list and the request/response model are the
//! vocabulary shared by every other layer.

pub mod origin;
pub mod request;
pub mod response;
