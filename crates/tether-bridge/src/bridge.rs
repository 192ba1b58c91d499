//! The protocol bridge: one master, one slave, two relay loops.
//!
//! `Bridge::run` sends the directory snapshot, then relays until either
//! endpoint closes, a protocol or filesystem error turns terminal, or the
//! caller cancels. Every master write (snapshot, output, pong) goes
//! through one lock so frames never interleave on the wire.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Master, Slave};
use crate::error::BridgeError;
use crate::protocol::{self, ClientTag, ResizeRequest, WriteRequest};

/// What to do when a remote file write or remove fails.
///
/// Deployed behavior ends the session; `Report` keeps it alive and logs
/// the failure instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileErrorPolicy {
    #[default]
    Fatal,
    Report,
}

/// Immutable per-session configuration.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Whether the peer may affect this host at all. Keystrokes, resizes,
    /// keepalive replies, and file mutations are all gated on this; a
    /// read-only session answers nothing.
    pub permit_write: bool,
    /// Fixed terminal columns; 0 lets the client negotiate.
    pub columns: u16,
    /// Fixed terminal rows; 0 lets the client negotiate.
    pub rows: u16,
    /// Slave read buffer size in bytes.
    pub buffer_size: usize,
    /// Root of the directory snapshot sent at session start.
    pub root: PathBuf,
    /// Policy for remote file operation failures.
    pub file_errors: FileErrorPolicy,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            permit_write: false,
            columns: 0,
            rows: 0,
            buffer_size: 1024,
            root: PathBuf::from("."),
            file_errors: FileErrorPolicy::Fatal,
        }
    }
}

/// A bridged master/slave pairing.
///
/// Clones share the session: the same endpoints, options, and master
/// write lock.
#[derive(Clone)]
pub struct Bridge {
    master: Arc<dyn Master>,
    slave: Arc<dyn Slave>,
    options: Arc<BridgeOptions>,
    /// Serializes every master write so frames never interleave.
    write_lock: Arc<Mutex<()>>,
}

impl Bridge {
    pub fn new(master: Arc<dyn Master>, slave: Arc<dyn Slave>, options: BridgeOptions) -> Self {
        Self {
            master,
            slave,
            options: Arc::new(options),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run the session to completion.
    ///
    /// Returns when a read fails on either endpoint (`SlaveClosed` /
    /// `MasterClosed`), when a control handler reports a terminal error,
    /// or when `cancel` fires (`Cancelled`). Neither endpoint is closed on
    /// return: that is the caller's job, and closing them is what unblocks
    /// whichever relay loop is still parked on its read.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BridgeError> {
        self.send_file_tree().await?;

        let (err_tx, mut err_rx) = mpsc::channel::<BridgeError>(2);

        let this = self.clone();
        let tx = err_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(this.relay_slave_output().await).await;
        });

        let this = self.clone();
        tokio::spawn(async move {
            let _ = err_tx.send(this.dispatch_master_frames().await).await;
        });

        tokio::select! {
            _ = cancel.cancelled() => Err(BridgeError::Cancelled),
            Some(err) = err_rx.recv() => Err(err),
        }
    }

    /// Build the working-directory snapshot and send it as the first
    /// frame of the session. Failure aborts the session before the relay
    /// loops ever start.
    async fn send_file_tree(&self) -> Result<(), BridgeError> {
        let tree = tether_files::build_tree(&self.options.root).map_err(BridgeError::Snapshot)?;
        let payload = serde_json::to_vec(&tree).map_err(BridgeError::SnapshotEncode)?;
        self.master_write(protocol::outgoing::LIST_OF_FILE, &payload)
            .await
    }

    /// Slave → master loop: every chunk of terminal output becomes one
    /// `Output` frame, forwarded verbatim.
    async fn relay_slave_output(&self) -> BridgeError {
        let mut buf = vec![0u8; self.options.buffer_size];
        loop {
            let n = match self.slave.read(&mut buf).await {
                Ok(0) | Err(_) => return BridgeError::SlaveClosed,
                Ok(n) => n,
            };
            if let Err(err) = self.master_write(protocol::outgoing::OUTPUT, &buf[..n]).await {
                return err;
            }
        }
    }

    /// Master → bridge loop: demultiplex each received frame by its tag.
    async fn dispatch_master_frames(&self) -> BridgeError {
        loop {
            let frame = match self.master.recv().await {
                Ok(frame) => frame,
                Err(_) => return BridgeError::MasterClosed,
            };
            if let Err(err) = self.handle_frame(&frame).await {
                return err;
            }
        }
    }

    async fn handle_frame(&self, data: &[u8]) -> Result<(), BridgeError> {
        if data.is_empty() {
            return Err(BridgeError::ZeroLengthRead);
        }

        // Read-only sessions discard every command, keepalives included.
        if !self.options.permit_write {
            return Ok(());
        }

        let payload = &data[1..];
        match ClientTag::from_byte(data[0]) {
            ClientTag::Input => {
                if payload.is_empty() {
                    return Err(BridgeError::EmptyPayload("input"));
                }
                self.slave
                    .write(payload)
                    .await
                    .map_err(BridgeError::SlaveWrite)
            }
            ClientTag::Ping => self.master_write(protocol::outgoing::PONG, &[]).await,
            ClientTag::ResizeTerminal => self.handle_resize(payload).await,
            ClientTag::WriteFile => {
                if payload.is_empty() {
                    return Err(BridgeError::EmptyPayload("file write"));
                }
                let request = WriteRequest::decode(payload)?;
                self.apply_file_result(tether_files::write_file(
                    Path::new(&request.path),
                    &request.content,
                ))
            }
            ClientTag::RemoveFile => {
                if payload.is_empty() {
                    return Err(BridgeError::EmptyPayload("file removal"));
                }
                let path =
                    String::from_utf8(payload.to_vec()).map_err(BridgeError::InvalidPath)?;
                self.apply_file_result(tether_files::remove_path(Path::new(&path)))
            }
            ClientTag::Unrecognized(tag) => Err(BridgeError::UnknownTag(tag)),
        }
    }

    /// Resolve effective geometry against the fixed configuration and
    /// resize the slave. With both axes pinned the payload is not even
    /// decoded; the client cannot override either way.
    async fn handle_resize(&self, payload: &[u8]) -> Result<(), BridgeError> {
        let fixed = (self.options.columns, self.options.rows);
        let (columns, rows) = if fixed.0 != 0 && fixed.1 != 0 {
            fixed
        } else {
            if payload.is_empty() {
                return Err(BridgeError::EmptyPayload("terminal resize"));
            }
            let request = ResizeRequest::decode(payload)?;
            let columns = if fixed.0 != 0 { fixed.0 } else { request.columns as u16 };
            let rows = if fixed.1 != 0 { fixed.1 } else { request.rows as u16 };
            (columns, rows)
        };
        self.slave
            .resize(columns, rows)
            .await
            .map_err(BridgeError::Resize)
    }

    fn apply_file_result(&self, result: Result<(), tether_files::FileError>) -> Result<(), BridgeError> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => match self.options.file_errors {
                FileErrorPolicy::Fatal => Err(err.into()),
                FileErrorPolicy::Report => {
                    tracing::warn!(error = %err, "file operation failed, session continues");
                    Ok(())
                }
            },
        }
    }

    /// Write one tagged frame to the master under the session write lock.
    async fn master_write(&self, tag: u8, payload: &[u8]) -> Result<(), BridgeError> {
        let frame = protocol::frame(tag, payload);
        let _guard = self.write_lock.lock().await;
        self.master
            .send(&frame)
            .await
            .map_err(BridgeError::MasterWrite)
    }
}
