use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Outcome of a failed [`Filesystem`] call.
///
/// The store branches on `NotFound` and `NotEmpty` and surfaces everything
/// else to the caller.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("directory not empty")]
    NotEmpty,
    #[error(transparent)]
    Io(io::Error),
}

impl FsError {
    /// Turns the error back into an [`io::Error`] for reporting.
    pub fn into_io(self) -> io::Error {
        match self {
            FsError::NotFound => io::Error::from(ErrorKind::NotFound),
            FsError::NotEmpty => io::Error::from(ErrorKind::DirectoryNotEmpty),
            FsError::Io(e) => e,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            ErrorKind::DirectoryNotEmpty => FsError::NotEmpty,
            _ => FsError::Io(e),
        }
    }
}

pub type FsResult<T> = std::result::Result<T, FsError>;

/// The blocking filesystem operations the store is built on.
pub trait Filesystem: Send + Sync {
    /// Returns the names of the entries in `path`. Names that are not valid
    /// UTF-8 are skipped.
    fn list_dir(&self, path: &Path) -> FsResult<Vec<String>>;
    /// Returns the raw contents of the file at `path`.
    fn read_file(&self, path: &Path) -> FsResult<Vec<u8>>;
    /// Creates or replaces the file at `path`.
    fn write_file(&self, path: &Path, contents: &str) -> FsResult<()>;
    fn delete_file(&self, path: &Path) -> FsResult<()>;
    /// Creates `path` and any missing parents. Succeeds if it already exists
    /// as a directory.
    fn create_dir_all(&self, path: &Path) -> FsResult<()>;
    /// Removes `path` only if it is an empty directory.
    fn remove_dir_if_empty(&self, path: &Path) -> FsResult<()>;
}

/// [`Filesystem`] backed by `std::fs`.
///
/// Writes go to a fresh `.tmp*` file in the destination directory and are
/// renamed over the destination, so readers never observe a half-written
/// record. The temporary name never ends in a record extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn list_dir(&self, path: &Path) -> FsResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::warn!("Skipping non UTF-8 entry {:?} in {:?}", raw, path),
            }
        }
        Ok(names)
    }

    fn read_file(&self, path: &Path) -> FsResult<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write_file(&self, path: &Path, contents: &str) -> FsResult<()> {
        let dir = path.parent().ok_or_else(|| {
            FsError::Io(io::Error::new(ErrorKind::InvalidInput, "record path has no parent directory"))
        })?;

        // Dropping `temp` on any early return removes the temporary file.
        let mut temp = NamedTempFile::new_in(dir).map_err(FsError::Io)?;
        temp.write_all(contents.as_bytes()).map_err(FsError::Io)?;
        temp.flush().map_err(FsError::Io)?;
        temp.persist(path).map_err(|e| FsError::Io(e.error))?;
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> FsResult<()> {
        Ok(fs::remove_file(path)?)
    }

    fn create_dir_all(&self, path: &Path) -> FsResult<()> {
        // Every failure here is fatal, including NotFound.
        fs::create_dir_all(path).map_err(FsError::Io)
    }

    fn remove_dir_if_empty(&self, path: &Path) -> FsResult<()> {
        Ok(fs::remove_dir(path)?)
    }
}
