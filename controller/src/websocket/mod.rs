//! # WebSocket Module
//!
//! Pushes status events and state changes to the page in real time. This
//! is the toast channel: every [`StatusEvent`] the controller emits and
//! every [`StateChange`] it makes is broadcast to all connected clients.
//!
//! ## Connection Flow
//!
//! ```text
//! 1. Client connects to /ws
//!              ↓
//! 2. Server sends a health_update greeting with the current snapshot
//!              ↓
//! 3. Events are pushed as they occur:
//!    - status
//!    - state_changed
//! ```
//!
//! ## Message Format
//!
//! ```json
//! {
//!     "event": "status",
//!     "data": {
//!         "id": "550e8400-e29b-41d4-a716-446655440000",
//!         "message": "Deposit successful!",
//!         "severity": "success",
//!         "timestamp": "2024-01-15T12:00:00Z"
//!     },
//!     "timestamp": "2024-01-15T12:00:00Z"
//! }
//! ```

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::status::{StateChange, StatusEvent, StatusReporter};
use crate::AppState;

/// Messages buffered per client before it starts lagging.
const CHANNEL_CAPACITY: usize = 100;

/// WebSocket event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsEventType {
    /// A status event (toast).
    Status,
    /// Displayed state changed.
    StateChanged,
    /// Connection greeting / health.
    HealthUpdate,
    /// Ping/pong for keepalive.
    Ping,
}

/// WebSocket message wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsMessage<T> {
    pub event: WsEventType,
    pub data: T,
    pub timestamp: chrono::DateTime<Utc>,
}

impl<T: Serialize> WsMessage<T> {
    pub fn new(event: WsEventType, data: T) -> Self {
        Self {
            event,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fan-out of controller events to every open WebSocket.
///
/// Also the controller's [`StatusReporter`]: reporting an event means
/// broadcasting it. With nobody connected, events are logged and dropped.
#[derive(Clone)]
pub struct WsRegistry {
    sender: broadcast::Sender<String>,
}

impl WsRegistry {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe a new connection.
    pub fn register(&self) -> broadcast::Receiver<String> {
        let rx = self.sender.subscribe();
        info!(
            "Registered WebSocket (total connections: {})",
            self.sender.receiver_count()
        );
        rx
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Returns the number of clients reached.
    pub fn broadcast<T: Serialize>(&self, event: WsEventType, data: T) -> usize {
        let json = match WsMessage::new(event, data).to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {:?} message: {}", event, e);
                return 0;
            }
        };

        match self.sender.send(json) {
            Ok(count) => {
                debug!("Broadcasted {:?} to {} connections", event, count);
                count
            }
            Err(_) => {
                debug!("No WebSocket clients for {:?}", event);
                0
            }
        }
    }

    /// Number of open connections.
    pub fn total_connections(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter for WsRegistry {
    fn report(&self, event: &StatusEvent) {
        info!("📣 [{:?}] {}", event.severity, event.message);
        self.broadcast(WsEventType::Status, event);
    }

    fn state_changed(&self, change: &StateChange) {
        self.broadcast(WsEventType::StateChanged, change);
    }
}

/// Configure WebSocket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(websocket_handler));
}

/// WebSocket connection handler.
///
/// ## Endpoint
///
/// `GET /ws`
///
/// ## Example (JavaScript)
///
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8080/ws');
///
/// ws.onmessage = (event) => {
///     const message = JSON.parse(event.data);
///     if (message.event === 'status') toast(message.data);
/// };
/// ```
pub async fn websocket_handler(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut rx = state.ws_registry.register();
    let snapshot = state.orchestrator.snapshot().await;

    actix_rt::spawn(async move {
        let welcome = WsMessage::new(
            WsEventType::HealthUpdate,
            serde_json::json!({
                "status": "connected",
                "state": snapshot,
            }),
        );

        if let Ok(json) = welcome.to_json() {
            if let Err(e) = session.text(json).await {
                error!("Failed to send welcome message: {}", e);
            }
        }

        // Forward broadcast events to this client
        let mut forward_session = session.clone();
        actix_rt::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(msg) => {
                        if let Err(e) = forward_session.text(msg).await {
                            debug!("WebSocket session closed: {}. Stopping forwarding.", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("WebSocket client lagged, skipped {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                Message::Ping(bytes) => {
                    let _ = session.pong(&bytes).await;
                }
                Message::Pong(_) => {}
                Message::Text(text) => {
                    debug!("Received text: {}", text);

                    let response = WsMessage::new(
                        WsEventType::Ping,
                        serde_json::json!({ "received": text.to_string() }),
                    );

                    if let Ok(json) = response.to_json() {
                        let _ = session.text(json).await;
                    }
                }
                Message::Binary(_) => {
                    warn!("Received unexpected binary message");
                }
                Message::Close(reason) => {
                    info!("WebSocket closed: {:?}", reason);
                    break;
                }
                _ => {}
            }
        }

        info!("WebSocket disconnected");
    });

    Ok(response)
}
