use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured image folder is missing, not a directory, or unreadable.
    #[error("invalid image folder: {0}")]
    BadDir(String),

    /// An image file could not be decoded.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Window or surface setup failed.
    #[error("display error: {0}")]
    Display(String),
}
