use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{Subscriber, SubscriberRegistry};

/// WebSocket connection state
pub struct WsState {
    pub registry: SubscriberRegistry,
    /// Frames buffered per connection
    pub subscriber_buffer: usize,
    pub heartbeat: Duration,
    pub shutdown: CancellationToken,
}

/// Handle WebSocket upgrade request
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<Arc<WsState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Handle WebSocket connection
///
/// The connection is a subscriber from upgrade until close. Enriched records
/// arrive through the subscriber's frame buffer and are written out as text
/// frames; inbound traffic is only watched for close and ping.
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: Arc<WsState>) {
    let (mut sender, mut receiver) = socket.split();

    let (subscriber, mut frames) = Subscriber::channel(state.subscriber_buffer);
    let subscriber = subscriber.with_label(peer.to_string());
    let id = subscriber.id();
    state.registry.add(subscriber);

    let mut heartbeat = interval_at(Instant::now() + state.heartbeat, state.heartbeat);

    info!(subscriber = %id, %peer, "WebSocket client connected");

    loop {
        select! {
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        if sender.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                    }
                    // every handle dropped: the broadcaster deregistered us
                    None => break,
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        info!(subscriber = %id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        debug!(subscriber = %id, "Ignoring inbound frame");
                    }
                    Some(Err(e)) => {
                        warn!(subscriber = %id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            _ = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.registry.remove(&id);
    info!(subscriber = %id, "WebSocket connection closed");
}
