//! WebSocket host adapter: accept loop and per-connection sessions.
//!
//! Outside a browser there is no `window.postMessage`, so this adapter
//! exposes the broker over WebSocket instead.  Each connection plays the
//! role of one embedding parent window:
//!
//! - The `Origin` header of the upgrade request is the origin of every
//!   message on that connection (no header means an empty origin, which the
//!   allow-list never approves).
//! - Each text frame is one inbound message.
//! - Replies go through a [`ChannelPort`] bound to the connection's origin
//!   and are written back as text frames.
//!
//! All sessions feed one persistent [`listen`]er, which runs every text
//! frame's pipeline in its own Tokio task, so replies may be written in a
//! different order than the requests arrived.  The accept loop stops when the
//! shared `running` flag is cleared.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};

use crate::application::broker::{Broker, InboundMessage};
use crate::application::emitter::PostMessage;
use crate::infrastructure::listener::{listen, Envelope};
use crate::infrastructure::port::ChannelPort;

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// How long a closing session keeps writing replies of in-flight pipelines.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves the broker until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_server(
    bind_addr: SocketAddr,
    broker: Broker,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;
    info!("hub broker listening on {bind_addr}");
    serve(listener, broker, running).await
}

/// Runs the accept loop on an already-bound listener.
///
/// Starts the message listener once; every session posts its frames to it.
///
/// # Errors
///
/// Currently never fails; transient accept errors are logged and skipped.
pub async fn serve(
    listener: TcpListener,
    broker: Broker,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let (inbox, _listener_task) = listen(broker);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let inbox = inbox.clone();
                tokio::spawn(async move {
                    match run_session(stream, peer_addr, inbox).await {
                        Ok(()) => debug!("session {peer_addr} closed normally"),
                        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
                    }
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    inbox: UnboundedSender<Envelope>,
) -> anyhow::Result<()> {
    let mut origin = String::new();
    let ws_stream = accept_hdr_async(stream, |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        if let Some(value) = request.headers().get("origin").and_then(|v| v.to_str().ok()) {
            origin = value.to_string();
        }
        Ok(response)
    })
    .await
    .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    info!(%origin, "session {peer_addr} established");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = unbounded_channel::<String>();
    let port: Arc<dyn PostMessage> = Arc::new(ChannelPort::new(origin.clone(), out_tx));

    // Writer: drains replies posted by in-flight pipelines.  Ends once every
    // clone of `port` is gone.
    let writer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                debug!("session {peer_addr}: peer went away while writing");
                break;
            }
        }
    });

    // Reader: each text frame goes to the listener as one inbound message.
    loop {
        let frame = match ws_rx.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) | None => break,
            Some(Err(e)) => {
                warn!("session {peer_addr}: WebSocket error: {e}");
                break;
            }
        };

        match frame {
            WsMessage::Text(data) => {
                let message = InboundMessage::new(origin.clone(), data);
                if inbox.send(Envelope::new(message, Arc::clone(&port))).is_err() {
                    warn!("session {peer_addr}: message listener has stopped");
                    break;
                }
            }
            WsMessage::Close(_) => break,
            // The hub protocol is text-only; control frames are answered by tungstenite.
            WsMessage::Binary(_) | WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    drop(port);
    if !drain_writer(writer, DRAIN_GRACE).await {
        debug!("session {peer_addr}: dropped replies of pipelines still running");
    }
    Ok(())
}

/// Lets `writer` finish flushing for up to `grace`, then aborts it.
///
/// Returns `true` if the writer finished on its own.
async fn drain_writer(mut writer: JoinHandle<()>, grace: Duration) -> bool {
    match timeout(grace, &mut writer).await {
        Ok(_) => true,
        Err(_) => {
            writer.abort();
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_pending_replies() {
        // Arrange: a writer that still has a reply to flush when the reader stops.
        let (tx, mut rx) = unbounded_channel::<String>();
        let (done_tx, mut done_rx) = unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done_tx.send(text).unwrap();
            }
        });
        let in_flight = tx.clone();
        drop(tx);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            in_flight.send("late reply".to_string()).unwrap();
        });

        // Act
        let finished = drain_writer(writer, Duration::from_secs(2)).await;

        // Assert
        assert!(finished);
        assert_eq!(done_rx.try_recv().unwrap(), "late reply");
    }

    #[tokio::test]
    async fn test_drain_gives_up_on_stuck_pipelines() {
        let (tx, mut rx) = unbounded_channel::<String>();
        let writer = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let finished = drain_writer(writer, Duration::from_millis(50)).await;

        assert!(!finished);
        drop(tx);
    }
}
