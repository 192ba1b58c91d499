//! Protocol bridge between a pseudo-terminal shell and a remote client.
//!
//! A session couples a `Master` (the remote-facing channel, typically a
//! WebSocket connection) with a `Slave` (the terminal-facing byte stream)
//! and relays between them over a tagged-frame protocol: terminal output
//! flows out verbatim, and inbound frames carry keystrokes, keepalives,
//! resize requests, and file write/remove commands. At session start the
//! bridge sends a one-shot snapshot of the working directory.
//!
//! Transports and endpoint lifecycles live outside this crate: the bridge
//! never connects, spawns, or closes anything.

pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod protocol;

pub use bridge::{Bridge, BridgeOptions, FileErrorPolicy};
pub use endpoint::{Master, Slave};
pub use error::BridgeError;
