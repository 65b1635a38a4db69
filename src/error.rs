//! Error types for raster compilation.
//!
//! Everything that can go wrong is detected either while validating options
//! (before the first line is written) or while touching the file system.

use std::io;
use thiserror::Error;

/// Errors that can occur while preparing or compiling a raster job.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Invalid option value or an image that compiles to zero dots.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Output sink could not be opened or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The image collaborator failed to decode or encode a file.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl RasterError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Result type alias for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = RasterError::config("bit depth 9 outside 1..=8");
        assert_eq!(
            err.to_string(),
            "Configuration error: bit depth 9 outside 1..=8"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: RasterError = io_err.into();
        assert!(matches!(err, RasterError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: access denied");
    }
}
