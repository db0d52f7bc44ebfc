//! JSON codec for hub requests and responses.
//!
//! Wire format of an inbound request (the `data` string of a posted message):
//!
//! ```json
//! {"dataKey":"visitor","kind":"get","config":{"cookieName":"uid","iframeUrl":"https://hub.example.com"}}
//! ```
//!
//! Decoding runs in two steps.  The envelope (`dataKey`, `kind`, `config`) is
//! parsed first; the `config` object is then decoded as a setter for `set`
//! and as a getter for everything else.  Either step failing means the
//! payload is not a hub request.

use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;

use crate::domain::request::{Config, GetterOptions, Request, RequestKind, SetterOptions};
use crate::domain::response::Response;

/// Errors that can occur while decoding a request or encoding a response.
///
/// Decode errors describe where and how the payload failed, never what it
/// contained: the messages are safe to log.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The payload is not JSON, or the envelope is missing a field.
    #[error("malformed request envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope parsed but `config` does not fit the request kind.
    #[error("malformed {kind} config: {reason}")]
    MalformedConfig { kind: String, reason: String },

    /// A response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "dataKey")]
    data_key: String,
    kind: String,
    config: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes a raw message payload into a [`Request`].
///
/// Unknown extra fields are ignored.  A `kind` other than `get`/`set` is not
/// an error here; it decodes to [`RequestKind::Unrecognized`] with getter
/// options, and routing decides whether anything serves it.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedEnvelope`] when the payload is not JSON
/// or lacks `dataKey`, `kind` or `config`, and
/// [`ProtocolError::MalformedConfig`] when `config` lacks a field its kind
/// requires.
///
/// # Examples
///
/// ```rust
/// use hub_core::{decode_request, RequestKind};
///
/// let payload = r#"{"dataKey":"k","kind":"get","config":{"cookieName":"c","iframeUrl":"u"}}"#;
/// let request = decode_request(payload).unwrap();
/// assert_eq!(request.kind, RequestKind::Get);
/// assert_eq!(request.data_key, "k");
/// ```
pub fn decode_request(payload: &str) -> Result<Request, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(payload)
        .map_err(|e| ProtocolError::MalformedEnvelope(describe(&e)))?;

    let kind = RequestKind::from_wire(&envelope.kind);
    let config = decode_config(&kind, envelope.config).map_err(|e| {
        ProtocolError::MalformedConfig {
            kind: kind.to_string(),
            reason: describe(&e),
        }
    })?;

    Ok(Request {
        data_key: envelope.data_key,
        kind,
        config,
    })
}

/// Encodes a [`Response`] as the JSON text posted back to the parent.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_response(response: &Response) -> Result<String, ProtocolError> {
    serde_json::to_string(response).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Encodes a [`Request`] the way a dependent app posts it.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_request(request: &Request) -> Result<String, ProtocolError> {
    serde_json::to_string(request).map_err(|e| ProtocolError::Encode(e.to_string()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Summarises a serde error without quoting any part of the payload.
fn describe(e: &serde_json::Error) -> String {
    let category = match e.classify() {
        Category::Io => "I/O error",
        Category::Syntax => "syntax error",
        Category::Data => "unexpected value or missing field",
        Category::Eof => "unexpected end of input",
    };
    // Errors from `from_value` carry no position.
    if e.line() == 0 {
        category.to_string()
    } else {
        format!("{category} at line {} column {}", e.line(), e.column())
    }
}

fn decode_config(kind: &RequestKind, config: Value) -> Result<Config, serde_json::Error> {
    match kind {
        RequestKind::Set => serde_json::from_value::<SetterOptions>(config).map(Config::Setter),
        RequestKind::Get | RequestKind::Unrecognized(_) => {
            serde_json::from_value::<GetterOptions>(config).map(Config::Getter)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
