use crate::signaling::{SignalingTransport, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientFrame, ServerFrame};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket connection to a relay server.
pub struct WsTransport {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsTransport {
    /// Connects and returns the transport plus the stream of inbound frames.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerFrame>)> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        info!("Connected to signaling server {}", url);

        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let (frame_tx, frame_rx) = mpsc::channel(256);

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerFrame>(text.as_str()) {
                        Ok(frame) => {
                            if frame_tx.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid frame from signaling server: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Signaling read loop finished");
        });

        Ok((Self { tx }, frame_rx))
    }
}

#[async_trait]
impl SignalingTransport for WsTransport {
    async fn emit(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let json = serde_json::to_string(&frame)?;
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| TransportError::Closed)
    }
}
