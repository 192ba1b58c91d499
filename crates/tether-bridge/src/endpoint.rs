//! Endpoint capabilities for the two sides of a bridged session.
//!
//! Methods take `&self` so the session's two relay loops can share one
//! endpoint; adapters synchronize internally. Production adapters wrap a
//! WebSocket connection and an OS pseudo-terminal; tests use in-memory
//! channel-backed doubles.

use std::io;

use async_trait::async_trait;

/// Remote-facing duplex channel, typically the client connection.
///
/// The transport must be message-oriented: `recv` yields exactly one frame
/// as the peer sent it and `send` emits exactly one frame. Protocol
/// message boundaries rely on this; there is no length prefix on the wire.
#[async_trait]
pub trait Master: Send + Sync {
    /// Receive the next frame from the peer.
    async fn recv(&self) -> io::Result<Vec<u8>>;

    /// Send one frame to the peer.
    async fn send(&self, frame: &[u8]) -> io::Result<()>;
}

/// Terminal-facing duplex byte stream with a resize control.
#[async_trait]
pub trait Slave: Send + Sync {
    /// Read available terminal output into `buf`, returning the byte
    /// count. A return of 0 means the terminal side has closed.
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write keystroke bytes to the terminal.
    async fn write(&self, data: &[u8]) -> io::Result<()>;

    /// Resize the terminal.
    async fn resize(&self, columns: u16, rows: u16) -> io::Result<()>;
}
