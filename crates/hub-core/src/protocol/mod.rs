//! JSON wire protocol between dependent apps and the hub.
//!
//! Inbound messages carry a JSON-encoded [`Request`](crate::Request) as their
//! `data` string; outbound messages are a JSON-encoded
//! [`Response`](crate::Response).

pub mod codec;
