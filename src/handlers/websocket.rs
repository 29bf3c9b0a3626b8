use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, warn};
use tokio::sync::mpsc;
use warp::ws::WebSocket;

use crate::core::relay::{FrameDisposition, SharedRelay};

// Handle a WebSocket connection from upgrade to close
pub async fn handle_ws_client(ws: WebSocket, relay: SharedRelay) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // Forward queued messages to the socket; the queue ends once the relay
    // drops this connection's session, and the socket is then closed
    tokio::task::spawn(async move {
        let mut rx = rx;
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
        if let Err(e) = ws_tx.close().await {
            debug!("WebSocket close after drain failed: {}", e);
        }
    });

    let client_id = match relay.open(tx) {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to register client: {}", e);
            return;
        }
    };

    // Frames are handled strictly in arrival order
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                if !(msg.is_text() || msg.is_binary()) {
                    continue;
                }
                if relay.handle_frame(&client_id, msg.as_bytes()) == FrameDisposition::Close {
                    break;
                }
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    // Client disconnected or was closed by the relay
    if let Err(e) = relay.close(&client_id) {
        warn!("Error unregistering client {}: {}", client_id, e);
    }
}
