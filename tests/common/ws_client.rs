//! WebSocket test client and in-process server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use repcount_engine::socket_server::{serve, StreamMultiplexer};

use super::fixtures::test_engine;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a streaming server on an ephemeral port
pub async fn spawn_server() -> (SocketAddr, Arc<StreamMultiplexer>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mux = Arc::new(StreamMultiplexer::new(test_engine()));
    tokio::spawn(serve(listener, Arc::clone(&mux)));
    (addr, mux)
}

pub struct WsClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        Self { ws }
    }

    pub async fn send_json(&mut self, msg: &Value) {
        self.send_text(msg.to_string()).await;
    }

    pub async fn send_text(&mut self, text: String) {
        self.ws.send(Message::Text(text)).await.unwrap();
    }

    /// Next text message as JSON, failing the test after a timeout
    pub async fn recv_json(&mut self) -> Value {
        let next = tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str::<Value>(&text).unwrap()
                    }
                    Some(Ok(_)) => continue,
                    other => panic!("Connection ended while waiting: {:?}", other),
                }
            }
        })
        .await;
        next.expect("Timed out waiting for a server message")
    }

    /// Send a message and wait for its reply
    pub async fn request(&mut self, msg: &Value) -> Value {
        self.send_json(msg).await;
        self.recv_json().await
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
