use thiserror::Error;

use crate::encryption::EncryptionError;
use crate::parser::{filters::FilterError, ParseError};

/// Crate-level error, covering every subsystem.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;
