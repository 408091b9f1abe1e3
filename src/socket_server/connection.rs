//! WebSocket connection handler
//!
//! Manages individual client connections and message routing.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use crate::error::EngineError;
use crate::socket_server::multiplexer::StreamMultiplexer;
use crate::socket_server::protocol::{ClientMessage, ServerMessage};

/// Handle a single WebSocket connection
pub async fn handle_connection(stream: TcpStream, mux: Arc<StreamMultiplexer>) {
    let addr = stream.peer_addr().ok();
    tracing::info!("New connection from {:?}", addr);

    // Accept WebSocket handshake
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::error!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let mut conn = ConnectionState::new(ws_stream, mux);
    conn.run().await;

    tracing::info!("Connection closed from {:?}", addr);
}

/// State for a single connection
struct ConnectionState {
    ws: WebSocketStream<TcpStream>,
    mux: Arc<StreamMultiplexer>,
    client_id: String,
}

impl ConnectionState {
    fn new(ws: WebSocketStream<TcpStream>, mux: Arc<StreamMultiplexer>) -> Self {
        let client_id = format!("cli_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        Self { ws, mux, client_id }
    }

    /// Messages are handled one at a time, so frames of the bound session
    /// are applied in arrival order.
    async fn run(&mut self) {
        while let Some(msg) = self.ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = self.handle_message(&text).await {
                        tracing::error!("Error sending to {}: {}", self.client_id, e);
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Client {} requested close", self.client_id);
                    break;
                }
                Ok(Message::Ping(data)) => {
                    let _ = self.ws.send(Message::Pong(data)).await;
                }
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Cleanup on disconnect
        self.mux.disconnect(&self.client_id);
    }

    async fn handle_message(&mut self, text: &str) -> anyhow::Result<()> {
        let reply = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.mux.handle(&self.client_id, msg).await,
            Err(e) => {
                tracing::debug!("Rejected message from {}: {}", self.client_id, e);
                ServerMessage::error(None, &EngineError::invalid_message(e.to_string()))
            }
        };
        self.send(&reply).await
    }

    async fn send(&mut self, msg: &ServerMessage) -> anyhow::Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(json)).await?;
        Ok(())
    }
}
