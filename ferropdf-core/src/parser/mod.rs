//! PDF Syntax Parser
//!
//! This module implements the low-level ingestion pipeline for PDF files
//! according to ISO 32000-1: tokenization, COS object assembly,
//! indirect-object framing, and stream filters. Decryption of strings and
//! streams happens transparently during parsing when the document carries
//! an encryption dictionary (see [`crate::encryption`]).

pub mod diagnostics;
pub mod document;
pub mod filter_impls;
pub mod filters;
pub mod lexer;
pub mod lookahead;
pub mod objects;

use crate::encryption::EncryptionError;

pub use self::diagnostics::{CollectingHandler, Diagnostic, DiagnosticHandler};
pub use self::document::{DocumentParser, HeaderKind, ObjectLocator, PdfHeader};
pub use self::filters::{DecodeContext, Filter, FilterError};
pub use self::objects::{
    ObjectId, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString,
};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    #[error("Syntax error at offset {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("Unterminated string at offset {position}")]
    UnterminatedString { position: u64 },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("No startxref found in document tail")]
    MissingStartXref,

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Filter error: {0}")]
    Filter(#[from] filters::FilterError),
}

/// Parsing options controlling strictness and recovery behavior.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Enforce single-space separators in `N G obj` headers and reject
    /// stream keywords terminated by a lone CR (PDF/A conformance checks).
    pub strict: bool,
    /// How many bytes from the end of the file the tail repair scan covers
    /// when looking for a `startxref` keyword.
    pub tail_scan_window: usize,
    /// How many leading bytes are searched for a displaced `%PDF-` header
    /// in lenient mode.
    pub header_scan_window: usize,
    /// How often the password provider is consulted before authentication
    /// gives up.
    pub max_password_attempts: u32,
}

impl ParseOptions {
    /// Strict parsing: conformance violations are errors.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::lenient()
        }
    }

    /// Lenient parsing: recover from common real-world damage.
    pub fn lenient() -> Self {
        Self {
            strict: false,
            tail_scan_window: 2048,
            header_scan_window: 1024,
            max_password_attempts: 3,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_lenient() {
        let options = ParseOptions::default();
        assert!(!options.strict);
        assert_eq!(options.tail_scan_window, 2048);
    }

    #[test]
    fn test_strict_options() {
        let options = ParseOptions::strict();
        assert!(options.strict);
        assert_eq!(
            options.tail_scan_window,
            ParseOptions::lenient().tail_scan_window
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::SyntaxError {
            position: 42,
            message: "bad token".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error at offset 42: bad token");

        let err = ParseError::MissingKey("Length".to_string());
        assert_eq!(err.to_string(), "Missing required key: Length");
    }
}
