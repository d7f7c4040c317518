//! Durable snapshot storage for whole-collection records.
//!
//! # Responsibility
//! - Read and write JSON snapshot files as single units.
//! - Map IO and serialization failures into one storage error type.
//!
//! # Invariants
//! - A reader observes either the previous or the next complete snapshot,
//!   never a partially written file.
//! - Storage code never interprets record contents beyond (de)serialization.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod snapshot;

pub use snapshot::{SnapshotFile, SnapshotLock};

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
    /// Another writer holds the file's lock.
    Locked {
        path: PathBuf,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot io failed for `{}`: {source}", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "snapshot `{}` is not valid: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "snapshot encoding failed: {err}"),
            Self::Locked { path } => {
                write!(f, "snapshot lock `{}` is held by another writer", path.display())
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Locked { .. } => None,
        }
    }
}
