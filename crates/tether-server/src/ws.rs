//! `Master` adapter over an accepted WebSocket connection.

use std::io;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tether_bridge::Master;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// One client connection. Binary frames carry protocol messages; text
/// frames are tolerated and read as raw bytes. Transport-level ping/pong
/// and close handling stay below the protocol.
pub struct WsMaster {
    reader: Mutex<SplitStream<WebSocketStream<TcpStream>>>,
    writer: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
}

impl WsMaster {
    pub fn new(socket: WebSocketStream<TcpStream>) -> Self {
        let (writer, reader) = socket.split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    /// Start the close handshake. The peer's close reply is what unblocks
    /// a recv still parked in the bridge's dispatch loop.
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(err) = writer.send(Message::Close(None)).await {
            tracing::debug!(error = %err, "websocket close failed");
        }
    }
}

#[async_trait]
impl Master for WsMaster {
    async fn recv(&self) -> io::Result<Vec<u8>> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(Message::Text(text))) => return Ok(text.to_string().into_bytes()),
                Some(Ok(Message::Close(_))) | None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "websocket closed",
                    ))
                }
                // Transport keepalive, not ours.
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(io::Error::other(err)),
            }
        }
    }

    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Binary(frame.to_vec().into()))
            .await
            .map_err(io::Error::other)
    }
}
