//! Response emission: the only stage that talks back across the trust
//! boundary.
//!
//! A response is serialized once and handed to the sender's [`PostMessage`]
//! port together with the exact origin the request arrived from.  The
//! broker never broadcasts and never targets a different origin.

use hub_core::{encode_response, ProtocolError, Response};
use thiserror::Error;

/// Errors raised while emitting a response.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The response could not be serialized.
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    /// The port refused the message (peer gone, or origin mismatch).
    #[error("delivery to '{origin}' failed: {reason}")]
    Delivery { origin: String, reason: String },
}

/// The reply half of the transport, as seen from the hub.
///
/// Mirrors the browser's `postMessage(message, targetOrigin)`: the message is
/// delivered only if the receiving window's origin is `target_origin`.
#[cfg_attr(test, mockall::automock)]
pub trait PostMessage: Send + Sync {
    /// Posts one serialized message.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Delivery`] if the message could not be handed to
    /// the receiver.
    fn post_message(&self, message: &str, target_origin: &str) -> Result<(), EmitError>;
}

/// Serializes `response` and posts it to `origin` through `port`.
///
/// # Errors
///
/// Returns [`EmitError::Encode`] if serialization fails, or whatever
/// delivery error the port reports.
pub fn emit_response(
    port: &dyn PostMessage,
    origin: &str,
    response: &Response,
) -> Result<(), EmitError> {
    let message = encode_response(response)?;
    port.post_message(&message, origin)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
