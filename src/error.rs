//! Typed errors for store operations.
//!
//! - `NotFound`: the source file chosen at open time does not exist.
//! - `Io`: a filesystem or engine step failed (copy, delete, flush, create)
//!   or reported a dirty status. Always carries the offending path(s).
//! - `Logic`: a caller broke a precondition (save/remove on a read-only store,
//!   release of an unknown handle). Never retried.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("file \"{}\" does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("{context}: {}", DisplayPaths(.paths))]
    Io {
        context: String,
        paths: Vec<PathBuf>,
        #[source]
        source: Option<io::Error>,
    },

    #[error("logic error: {0}")]
    Logic(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(path: &Path) -> Self {
        StoreError::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// I/O failure on a single path with the underlying OS error.
    pub fn io(context: impl Into<String>, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            paths: vec![path.to_path_buf()],
            source: Some(source),
        }
    }

    /// Copy-like failure between two paths.
    pub fn io_pair(context: impl Into<String>, from: &Path, to: &Path, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            paths: vec![from.to_path_buf(), to.to_path_buf()],
            source: Some(source),
        }
    }

    /// Failure without an OS error (dirty engine status, missing target after publish).
    pub fn io_status(context: impl Into<String>, path: &Path) -> Self {
        StoreError::Io {
            context: context.into(),
            paths: vec![path.to_path_buf()],
            source: None,
        }
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        StoreError::Logic(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, StoreError::Logic(_))
    }

    /// Paths named by the error (empty for `Logic`).
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            StoreError::NotFound { path } => vec![path.as_path()],
            StoreError::Io { paths, .. } => paths.iter().map(|p| p.as_path()).collect(),
            StoreError::Logic(_) => Vec::new(),
        }
    }
}

struct DisplayPaths<'a>(&'a [PathBuf]);

impl fmt::Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "\"{}\"", p.display())?;
        }
        Ok(())
    }
}
