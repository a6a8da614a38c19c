//! Error types for the convenience API.

use std::io;
use std::path::PathBuf;

use h5vec_format::FormatError;

/// Errors returned by file, group and dataset operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be created.
    #[error("cannot create {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    /// The file could not be opened.
    #[error("cannot open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Writing pending changes back to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid HDF5, or could not be encoded.
    #[error("HDF5 format error: {0}")]
    Format(#[from] FormatError),

    #[error("no object named {0}")]
    NotFound(String),

    #[error("an object named {0} already exists")]
    AlreadyExists(String),

    #[error("not a group: {0}")]
    NotAGroup(String),

    #[error("not a dataset: {0}")]
    NotADataset(String),

    #[error("invalid object name {0:?}")]
    InvalidName(String),

    /// A write was attempted on a file opened read-only.
    #[error("{} is open read-only", .0.display())]
    ReadOnly(PathBuf),

    /// A dataset read as a one-dimensional array has another rank.
    #[error("{name} has rank {rank}, expected 1")]
    RankMismatch { name: String, rank: usize },

    /// The stored element type cannot be converted to the requested one.
    #[error("{name} stores {stored} elements, which cannot be read as {requested}")]
    TypeMismatch { name: String, stored: String, requested: &'static str },

    /// A stored value does not fit the requested element type.
    #[error("element {index} of {name} does not fit in {requested}")]
    Conversion { name: String, index: usize, requested: &'static str },

    /// The object or file uses features this crate cannot handle.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn open_error_keeps_source() {
        let err = Error::Open {
            path: PathBuf::from("missing.h5"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "cannot open missing.h5: gone");
        assert!(err.source().is_some());
    }

    #[test]
    fn format_error_converts() {
        let err: Error = FormatError::SignatureNotFound.into();
        assert!(matches!(err, Error::Format(FormatError::SignatureNotFound)));
    }
}
