use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientFrame, ParticipantId, ServerFrame};
use meshcall_server::{RelayService, serve_on};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub async fn start_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, RelayService::new()));
    addr
}

/// Raw WebSocket client speaking the relay's JSON frames.
pub struct WsClient {
    pub id: ParticipantId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (socket, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .expect("Failed to connect");
        let mut client = Self {
            id: ParticipantId::from(""),
            socket,
        };
        match client.recv().await {
            ServerFrame::Connect { id } => client.id = id,
            other => panic!("expected connect, got {:?}", other),
        }
        client
    }

    pub async fn send(&mut self, frame: ClientFrame) {
        let json = serde_json::to_string(&frame).unwrap();
        self.socket.send(Message::Text(json.into())).await.unwrap();
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.to_owned().into()))
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> ServerFrame {
        loop {
            let msg = timeout(Duration::from_secs(5), self.socket.next())
                .await
                .expect("timed out waiting for frame")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}
