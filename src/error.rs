//! Unified error types for font normalization.
//!
//! Every failure a normalization call can hit is folded into one of four
//! variants; library-level errors (io, zip, quick-xml) never escape the
//! crate API in their raw form.
use thiserror::Error;

/// Main error type for normalization operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File extension is not one of .docx, .xlsx, .pptx
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Input file missing, corrupt, or not actually of the claimed format
    #[error("Failed to load document: {0}")]
    Load(String),

    /// Output could not be written
    #[error("Failed to save document: {0}")]
    Save(String),

    /// Any other failure raised during the traversal
    #[error("Processing error: {0}")]
    Processing(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Processing(err.to_string())
    }
}

/// Result type for normalization operations.
pub type Result<T> = std::result::Result<T, Error>;
