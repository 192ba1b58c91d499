//! Remote-driven file mutations.
//!
//! Paths come straight off the wire and are not confined to the snapshot
//! root; deployments that need a jail must wrap these calls.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::FileError;

/// Create or overwrite `path` with `content`.
///
/// Parent directories are not created. On Unix the file is opened with
/// permissive 0o666 mode, matching what deployed peers expect.
pub fn write_file(path: &Path, content: &[u8]) -> Result<(), FileError> {
    let result = {
        #[cfg(unix)]
        {
            use std::io::Write as _;
            use std::os::unix::fs::OpenOptionsExt as _;
            fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o666)
                .open(path)
                .and_then(|mut file| file.write_all(content))
        }
        #[cfg(not(unix))]
        {
            fs::write(path, content)
        }
    };
    result.map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the file at `path`, or the directory and everything under it.
/// A path that does not exist is not an error.
pub fn remove_path(path: &Path) -> Result<(), FileError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "remove of missing path ignored");
            return Ok(());
        }
        Err(source) => {
            return Err(FileError::Remove {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| FileError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn write_then_read_back_exact_bytes() {
        let dir = scratch();
        let path = dir.path().join("x");
        write_file(&path, &[1, 2, 3]).expect("write");
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn write_truncates_existing_content() {
        let dir = scratch();
        let path = dir.path().join("x");
        write_file(&path, b"a much longer original body").unwrap();
        write_file(&path, b"short").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn write_does_not_create_parents() {
        let dir = scratch();
        let path = dir.path().join("missing/sub/x");
        let err = write_file(&path, b"data").unwrap_err();
        assert!(matches!(err, FileError::Write { .. }));
    }

    #[test]
    fn remove_file_then_path_is_gone() {
        let dir = scratch();
        let path = dir.path().join("x");
        write_file(&path, &[1, 2, 3]).unwrap();
        remove_path(&path).expect("remove");
        assert!(!path.exists());
    }

    #[test]
    fn remove_directory_is_recursive() {
        let dir = scratch();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("f"), "x").unwrap();

        remove_path(&dir.path().join("a")).expect("remove");
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn remove_missing_path_is_ok() {
        let dir = scratch();
        assert!(remove_path(&dir.path().join("never-was")).is_ok());
    }
}
