//! Error types for recoverable resource failures.
//!
//! Programmer errors (re-entrant scene calls, out-of-range attachment
//! indices, stale handles) are not represented here; they panic at the
//! call site.

use thiserror::Error;

use crate::backend::BackendError;

/// Failure while loading or creating a resource
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Cube map needs 6 faces, got {0}")]
    CubeFaceCount(usize),
    #[error("Cube map faces must be square and equal size")]
    CubeFaceSize,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Failure while reading or writing a binary model cache file
#[derive(Error, Debug)]
pub enum ModelCacheError {
    #[error("Not a model cache file (bad magic {0:?})")]
    BadMagic([u8; 4]),
    #[error("Unsupported model cache version {0}")]
    UnsupportedVersion(u32),
    #[error("Model cache string is not valid UTF-8")]
    InvalidString,
    #[error("Model cache IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type ModelCacheResult<T> = Result<T, ModelCacheError>;
