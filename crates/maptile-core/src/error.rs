//! Error type shared by every pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while rotating, tiling or merging rasters.
#[derive(Debug, Error)]
pub enum TileError {
    /// The source raster is missing, corrupt or has no pixels.
    #[error("Cannot read raster {path}: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// A requested size or tile geometry collapses to nothing.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Pixel data length doesn't match the declared dimensions.
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Directory creation or file write failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding failed.
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    /// The pyramid manifest could not be serialized.
    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl TileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TileError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TileError::InputUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TileError>;
