//! Topicstore is a minimal, synchronous key-value store backed by plain files.
//!
//! Keys are two-level: a *topic* maps to a directory under the base directory and
//! an *id* maps to one file inside it, so a record lives at
//! `<base>/<topic>/<id>.json`.
//!
//! Topic directories are created on the first write and removed again once a
//! delete, move or clean leaves them empty.
//!
//! ## Core Components
//! - [`engine::Store`]: the facade providing every operation.
//! - [`engine::fs`]: the filesystem capability the store runs on.
//! - [`engine::codec`]: the record encoding (JSON by default).

pub mod engine;

use std::path::PathBuf;
use thiserror::Error;

pub use engine::{Store, TopicScope};

/// Boxed error produced by a [`engine::Codec`].
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the store.
#[derive(Error, Debug)]
pub enum Error {
    /// The call was malformed: empty or unsafe names, relative base directory, etc.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A filesystem operation failed for a reason other than the ones the
    /// operation tolerates.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A stored file could not be decoded.
    #[error("corrupt data in {}: {source}", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    /// A value could not be encoded, or converted to/from a typed value.
    #[error("Serialization error: {0}")]
    Serialization(#[source] CodecError),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(Box::new(e))
    }
}

/// A specialized Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Selects the ids an operation applies to.
///
/// `move` and `delete` accept either a single id or a list; both forms return
/// the list of ids actually affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ids {
    One(String),
    Many(Vec<String>),
}

impl Ids {
    /// Iterates over the selected ids in input order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Ids::One(id) => std::slice::from_ref(id),
            Ids::Many(ids) => ids,
        };
        slice.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            Ids::One(_) => 1,
            Ids::Many(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Ids {
    fn from(id: &str) -> Self {
        Ids::One(id.to_string())
    }
}

impl From<String> for Ids {
    fn from(id: String) -> Self {
        Ids::One(id)
    }
}

impl From<&String> for Ids {
    fn from(id: &String) -> Self {
        Ids::One(id.clone())
    }
}

impl From<Vec<String>> for Ids {
    fn from(ids: Vec<String>) -> Self {
        Ids::Many(ids)
    }
}

impl From<Vec<&str>> for Ids {
    fn from(ids: Vec<&str>) -> Self {
        Ids::Many(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Ids {
    fn from(ids: &[&str]) -> Self {
        Ids::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Ids {
    fn from(ids: &[String]) -> Self {
        Ids::Many(ids.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Ids {
    fn from(ids: [&str; N]) -> Self {
        Ids::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}
