//! The `Slave` implementation backed by a portable-pty shell process.

use std::io::{self, Read as _, Write};
use std::sync::Mutex as StdMutex;
use std::thread;

use async_trait::async_trait;
use portable_pty::{native_pty_system, Child, MasterPty, PtySize};
use tether_bridge::Slave;
use tokio::sync::{mpsc, Mutex};

use crate::error::PtyError;
use crate::spawn::{build_shell_command, default_shell};

/// Bytes per read on the PTY reader thread.
const READ_CHUNK: usize = 8_192;

/// Reader-side state: the output channel plus carry-over for reads into
/// buffers smaller than the last chunk.
struct OutputState {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
}

/// The user's shell on an OS pseudo-terminal, usable as a session slave.
///
/// A background thread owns the blocking PTY reads and forwards chunks
/// into an async channel; writes and resizes go straight to the PTY
/// handles. The bridge never closes its endpoints, so the owner calls
/// `kill` / `wait` once the session is over.
pub struct PtySlave {
    writer: StdMutex<Box<dyn Write + Send>>,
    output: Mutex<OutputState>,
    master: StdMutex<Box<dyn MasterPty + Send>>,
    child: StdMutex<Box<dyn Child + Send + Sync>>,
}

impl PtySlave {
    /// Open a PTY with the given geometry and spawn the default shell on
    /// its slave side.
    pub fn spawn(columns: u16, rows: u16) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let size = PtySize {
            rows,
            cols: columns,
            pixel_width: 0,
            pixel_height: 0,
        };
        let pair = pty_system.openpty(size).map_err(PtyError::Open)?;

        let shell = default_shell();
        let command = build_shell_command(&shell);
        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|source| PtyError::Spawn { shell, source })?;

        // Only the master side is needed from here on.
        drop(pair.slave);

        let writer = pair.master.take_writer().map_err(PtyError::Writer)?;
        let mut reader = pair.master.try_clone_reader().map_err(PtyError::Reader)?;

        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        thread::Builder::new()
            .name("pty-reader".into())
            .spawn(move || {
                let mut buf = [0u8; READ_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break, // EOF, shell exited
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break; // receiver dropped
                            }
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "pty reader stopped");
                            break;
                        }
                    }
                }
            })
            .map_err(PtyError::Thread)?;

        Ok(Self {
            writer: StdMutex::new(writer),
            output: Mutex::new(OutputState {
                rx,
                pending: Vec::new(),
            }),
            master: StdMutex::new(pair.master),
            child: StdMutex::new(child),
        })
    }

    /// Kill the shell process. Safe to call more than once.
    pub fn kill(&self) {
        let Ok(mut child) = self.child.lock() else {
            return;
        };
        if let Err(err) = child.kill() {
            tracing::debug!(error = %err, "pty kill failed (may already be dead)");
        }
    }

    /// Wait for the shell to exit, returning its exit code if available.
    pub fn wait(&self) -> Option<u32> {
        let Ok(mut child) = self.child.lock() else {
            return None;
        };
        match child.wait() {
            Ok(status) => Some(status.exit_code()),
            Err(err) => {
                tracing::debug!(error = %err, "pty wait failed");
                None
            }
        }
    }
}

/// Lock a std mutex, surfacing poisoning as an I/O error.
fn lock_io<T>(mutex: &StdMutex<T>) -> io::Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::other("pty mutex poisoned"))
}

#[async_trait]
impl Slave for PtySlave {
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut output = self.output.lock().await;
        if output.pending.is_empty() {
            match output.rx.recv().await {
                Some(chunk) => output.pending = chunk,
                // Reader thread gone: the shell exited.
                None => return Ok(0),
            }
        }
        let n = output.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&output.pending[..n]);
        output.pending.drain(..n);
        Ok(n)
    }

    async fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = lock_io(&self.writer)?;
        writer.write_all(data)?;
        writer.flush()
    }

    async fn resize(&self, columns: u16, rows: u16) -> io::Result<()> {
        let master = lock_io(&self.master)?;
        master
            .resize(PtySize {
                rows,
                cols: columns,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(io::Error::other)
    }
}
