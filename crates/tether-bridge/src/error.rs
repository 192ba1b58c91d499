//! Session-terminating errors.
//!
//! One of these surfaces per session; there are no retries and no
//! partial-success reporting to the peer.

use tether_files::FileError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A read on the slave endpoint failed; the terminal side is gone.
    #[error("slave endpoint closed")]
    SlaveClosed,

    /// A read on the master endpoint failed; the remote side is gone.
    #[error("master endpoint closed")]
    MasterClosed,

    /// The caller's cancellation token fired.
    #[error("session cancelled")]
    Cancelled,

    #[error("unexpected zero-length read from master")]
    ZeroLengthRead,

    #[error("received empty payload for {0}")]
    EmptyPayload(&'static str),

    #[error("received malformed payload for {what}: {source}")]
    MalformedPayload {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("remove path is not valid utf-8: {0}")]
    InvalidPath(#[source] std::string::FromUtf8Error),

    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),

    #[error("failed to build directory snapshot: {0}")]
    Snapshot(#[source] FileError),

    #[error("failed to encode directory snapshot: {0}")]
    SnapshotEncode(#[source] serde_json::Error),

    #[error("failed to write to master: {0}")]
    MasterWrite(#[source] std::io::Error),

    #[error("failed to write to slave: {0}")]
    SlaveWrite(#[source] std::io::Error),

    #[error("failed to resize terminal: {0}")]
    Resize(#[source] std::io::Error),

    #[error(transparent)]
    File(#[from] FileError),
}
