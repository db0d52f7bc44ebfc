//! The persistent message listener.
//!
//! The hub registers exactly one listener for its lifetime.  Every inbound
//! message is handed to its own Tokio task, so a slow (or never-finishing)
//! handler only holds up its own pipeline; the listener keeps accepting and
//! every other pipeline keeps running.
//!
//! The queue is unbounded and there is no per-message timeout or
//! cancellation.  The listener stops only when every sender handle has been
//! dropped.

use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::broker::{Broker, InboundMessage};
use crate::application::emitter::PostMessage;

/// An inbound message together with the port its reply goes through.
pub struct Envelope {
    pub message: InboundMessage,
    pub reply: Arc<dyn PostMessage>,
}

impl Envelope {
    pub fn new(message: InboundMessage, reply: Arc<dyn PostMessage>) -> Self {
        Self { message, reply }
    }
}

/// Starts the listener and returns the handle transports post messages to.
///
/// The returned `JoinHandle` resolves once every clone of the sender is
/// dropped; pipelines already spawned keep running independently.
pub fn listen(broker: Broker) -> (UnboundedSender<Envelope>, JoinHandle<()>) {
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(run_listener(broker, rx));
    (tx, handle)
}

async fn run_listener(broker: Broker, mut rx: UnboundedReceiver<Envelope>) {
    info!("message listener started");
    while let Some(Envelope { message, reply }) = rx.recv().await {
        let broker = broker.clone();
        tokio::spawn(async move {
            let outcome = broker.handle_message(message, reply.as_ref()).await;
            debug!(outcome = outcome.label(), "pipeline finished");
        });
    }
    info!("message listener stopped: all senders dropped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
