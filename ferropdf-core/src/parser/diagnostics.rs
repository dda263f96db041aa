//! Parse diagnostics
//!
//! Faults discovered during parsing come in two severities: recoverable
//! warnings (parsing continues, the affected object may be partial) and
//! fatal errors (parsing fails unless the installed handler suppresses
//! them). Both are routed through a pluggable [`DiagnosticHandler`]; with
//! no handler installed, errors fail and warnings are dropped after being
//! traced.

use super::objects::PdfObject;
use super::{ParseError, ParseResult};

/// Short diagnostic codes used for conformance-style reporting.
pub mod codes {
    /// Stream dictionary has no usable `/Length` entry.
    pub const MISSING_STREAM_LENGTH: &str = "617e";
    /// `endstream` keyword not found at the expected offset.
    pub const MISSING_ENDSTREAM: &str = "6180";
    /// `endobj` keyword missing after an indirect object body.
    pub const MISSING_ENDOBJ: &str = "6181";
    /// Dictionary not closed by `>>` before end of input.
    pub const UNBALANCED_DICTIONARY: &str = "6160";
    /// Dictionary key is not a name object.
    pub const BAD_DICTIONARY_KEY: &str = "6161";
    /// Stray `def` keyword between dictionary entries.
    pub const STRAY_DEF_KEYWORD: &str = "6162";
    /// Malformed array element skipped during recovery.
    pub const SKIPPED_ARRAY_ELEMENT: &str = "6163";
    /// Array exceeds the structural element limit.
    pub const OVERSIZED_ARRAY: &str = "6164";
    /// Name exceeds the structural byte limit.
    pub const OVERSIZED_NAME: &str = "6165";
    /// String exceeds the structural byte limit.
    pub const OVERSIZED_STRING: &str = "6166";
    /// Hex string carries an odd number of digits.
    pub const ODD_HEX_DIGITS: &str = "6167";
    /// Non-hex digit inside a hex string.
    pub const ILLEGAL_HEX_DIGIT: &str = "6168";
    /// Invalid `#XX` escape inside a name.
    pub const BAD_NAME_ESCAPE: &str = "6169";
    /// `stream` keyword terminated by a lone CR.
    pub const STREAM_EOL: &str = "616a";
    /// Header found away from byte offset zero.
    pub const DISPLACED_HEADER: &str = "6110";
    /// Object could not be decrypted; ciphertext kept.
    pub const DECRYPT_FAILED: &str = "6190";
}

/// A recoverable parsing fault.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Short code for conformance-style reporting (see [`codes`]).
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Byte-offset hint into the source, when known.
    pub offset: Option<u64>,
    /// The partially built object, when one exists at the fault site.
    pub partial: Option<PdfObject>,
}

impl Diagnostic {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset: None,
            partial: None,
        }
    }

    pub fn at(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_partial(mut self, partial: PdfObject) -> Self {
        self.partial = Some(partial);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "[{}] {} (offset {})", self.code, self.message, offset),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Receiver for parse-time faults.
///
/// `error` decides the fate of a fatal fault: the default propagates it.
/// A handler may return `Ok(())` to suppress the error and let parsing
/// continue from its recovery point. `warning` must not fail.
pub trait DiagnosticHandler {
    /// A recoverable fault. The parser continues regardless.
    fn warning(&mut self, diagnostic: Diagnostic);

    /// A fatal fault. Returning `Ok(())` suppresses it.
    fn error(&mut self, error: ParseError) -> ParseResult<()> {
        Err(error)
    }
}

/// Handler that accumulates warnings and optionally swallows errors.
///
/// The handler is a cheap clone-able handle over shared storage, so the
/// caller can keep one end while the parser owns the other. Useful for
/// conformance reporting and for loading damaged documents to the extent
/// possible.
#[derive(Default, Clone)]
pub struct CollectingHandler {
    shared: std::rc::Rc<std::cell::RefCell<Collected>>,
    suppress_errors: bool,
}

#[derive(Default)]
struct Collected {
    warnings: Vec<Diagnostic>,
    errors: Vec<ParseError>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector that also swallows fatal errors.
    pub fn suppressing() -> Self {
        Self {
            suppress_errors: true,
            ..Self::default()
        }
    }

    /// Drain the collected warnings, in report order.
    pub fn take_warnings(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.shared.borrow_mut().warnings)
    }

    /// Drain the suppressed errors.
    pub fn take_errors(&self) -> Vec<ParseError> {
        std::mem::take(&mut self.shared.borrow_mut().errors)
    }

    pub fn warning_count(&self) -> usize {
        self.shared.borrow().warnings.len()
    }

    /// Whether any warning carries the given code.
    pub fn has_warning(&self, code: &str) -> bool {
        self.shared.borrow().warnings.iter().any(|d| d.code == code)
    }
}

impl DiagnosticHandler for CollectingHandler {
    fn warning(&mut self, diagnostic: Diagnostic) {
        self.shared.borrow_mut().warnings.push(diagnostic);
    }

    fn error(&mut self, error: ParseError) -> ParseResult<()> {
        if self.suppress_errors {
            self.shared.borrow_mut().errors.push(error);
            Ok(())
        } else {
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(codes::MISSING_STREAM_LENGTH, "no stream length").at(128);
        assert_eq!(diag.to_string(), "[617e] no stream length (offset 128)");

        let diag = Diagnostic::new(codes::MISSING_ENDOBJ, "endobj missing");
        assert_eq!(diag.to_string(), "[6181] endobj missing");
    }

    #[test]
    fn test_collecting_handler_records_warnings() {
        let mut handler = CollectingHandler::new();
        handler.warning(Diagnostic::new(codes::ODD_HEX_DIGITS, "odd digit count"));
        handler.warning(Diagnostic::new(codes::MISSING_ENDSTREAM, "endstream moved"));

        assert_eq!(handler.warning_count(), 2);
        assert!(handler.has_warning(codes::ODD_HEX_DIGITS));
        let warnings = handler.take_warnings();
        assert_eq!(warnings[1].code, codes::MISSING_ENDSTREAM);
        assert_eq!(handler.warning_count(), 0);
    }

    #[test]
    fn test_handler_clone_shares_storage() {
        let handler = CollectingHandler::new();
        let mut clone = handler.clone();
        clone.warning(Diagnostic::new(codes::STREAM_EOL, "lone CR"));
        assert!(handler.has_warning(codes::STREAM_EOL));
    }

    #[test]
    fn test_default_error_propagates() {
        let mut handler = CollectingHandler::new();
        let result = handler.error(ParseError::InvalidHeader);
        assert!(result.is_err());
        assert!(handler.take_errors().is_empty());
    }

    #[test]
    fn test_suppressing_handler_swallows_errors() {
        let mut handler = CollectingHandler::suppressing();
        let result = handler.error(ParseError::InvalidHeader);
        assert!(result.is_ok());
        assert_eq!(handler.take_errors().len(), 1);
    }

    #[test]
    fn test_diagnostic_with_partial_object() {
        let diag = Diagnostic::new(codes::MISSING_ENDOBJ, "endobj missing")
            .with_partial(PdfObject::Integer(7));
        assert_eq!(diag.partial, Some(PdfObject::Integer(7)));
    }
}
