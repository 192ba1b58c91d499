//! Directory snapshots and remote-driven file mutations.
//!
//! A session sends the peer one immutable tree of the working directory at
//! startup (`build_tree`), and applies the peer's write/remove commands
//! (`write_file`, `remove_path`) for the rest of its life. The snapshot is
//! never resynchronized with the live filesystem.

pub mod error;
pub mod ops;
pub mod tree;

pub use error::FileError;
pub use ops::{remove_path, write_file};
pub use tree::{build_tree, ContentKind, Node, NodeKind, LARGE_FILE_LIMIT};
