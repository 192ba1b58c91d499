//! Production slave endpoint: the user's shell on an OS pseudo-terminal.
//!
//! Uses `portable-pty` for cross-platform PTY handling. A background
//! thread owns the blocking PTY reads and feeds chunks into an async
//! channel so the bridge's relay loop can await output.

pub mod error;
pub mod slave;
pub mod spawn;

pub use error::PtyError;
pub use slave::PtySlave;
pub use spawn::default_shell;
