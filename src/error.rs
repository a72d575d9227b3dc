//! Error types for QRCARD operations

use thiserror::Error;

/// Result type alias using QRCARD's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for QRCARD operations
#[derive(Error, Debug)]
pub enum Error {
    /// The in-process QR encoder could not be acquired or refused the payload
    #[error("QR encoder unavailable: {0}")]
    EncodingUnavailable(String),

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// A fallback image endpoint could not be loaded
    #[error("Failed to load QR image from {url}: {reason}")]
    ImageLoad {
        /// Endpoint that was requested
        url: String,
        /// Transport or decoding failure
        reason: String,
    },

    /// Writing to the system clipboard failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Download or copy requested while there is nothing to encode
    #[error("Nothing to encode yet")]
    EmptyPayload,

    /// Download requested while nothing is rendered
    #[error("No QR code has been rendered yet")]
    NoArtifact,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the renderer should move on to the next strategy after this error.
    pub fn is_recoverable_render_failure(&self) -> bool {
        matches!(
            self,
            Error::EncodingUnavailable(_)
                | Error::QrEncode(_)
                | Error::ImageLoad { .. }
                | Error::Image(_)
        )
    }
}

// Implement From conversions for common error types

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::QrEncode(e.to_string())
    }
}
