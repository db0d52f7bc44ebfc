//! Reply port bound to one peer window.
//!
//! [`ChannelPort`] stands in for `window.parent`: it knows the origin of the
//! window on the other side and forwards serialized messages to it over a
//! tokio channel.  Like `postMessage`, a message whose target origin does not
//! match the peer's origin is not delivered.

use tokio::sync::mpsc::UnboundedSender;

use crate::application::emitter::{EmitError, PostMessage};

/// A [`PostMessage`] implementation backed by an unbounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    peer_origin: String,
    tx: UnboundedSender<String>,
}

impl ChannelPort {
    pub fn new(peer_origin: impl Into<String>, tx: UnboundedSender<String>) -> Self {
        Self {
            peer_origin: peer_origin.into(),
            tx,
        }
    }

    pub fn peer_origin(&self) -> &str {
        &self.peer_origin
    }
}

impl PostMessage for ChannelPort {
    fn post_message(&self, message: &str, target_origin: &str) -> Result<(), EmitError> {
        if target_origin != self.peer_origin {
            return Err(EmitError::Delivery {
                origin: target_origin.to_string(),
                reason: format!("peer origin is '{}'", self.peer_origin),
            });
        }
        self.tx
            .send(message.to_string())
            .map_err(|_| EmitError::Delivery {
                origin: target_origin.to_string(),
                reason: "peer window is gone".to_string(),
            })
    }
}
