//! Document-level parsing
//!
//! Indirect-object framing (`N G obj … endobj`), header and trailer
//! parsing, `startxref` handling with tail repair, and the encryption
//! lifecycle. Cross-reference *table* structure is the caller's business:
//! an [`ObjectLocator`] supplies byte offsets when indirect resolution is
//! needed (stream lengths, the `/Encrypt` dictionary).

use super::diagnostics::{codes, Diagnostic, DiagnosticHandler};
use super::lexer::{Lexer, Token};
use super::lookahead::LookaheadBuffer;
use super::objects::{ObjectId, PdfDictionary, PdfName, PdfObject};
use super::{ParseError, ParseOptions, ParseResult};
use crate::encryption::{
    EncryptionDictionary, EncryptionError, PasswordProvider, StandardSecurityHandler,
};
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Flavor of the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Pdf,
    Fdf,
}

/// Parsed file header.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfHeader {
    pub kind: HeaderKind,
    pub major: u8,
    pub minor: u8,
    /// Where the header actually started; nonzero after a displaced-header
    /// recovery.
    pub offset: u64,
}

impl PdfHeader {
    /// PDF 1.0–1.7 and 2.0 are supported.
    pub fn is_supported(&self) -> bool {
        matches!((self.major, self.minor), (1, 0..=7) | (2, 0))
    }
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            HeaderKind::Pdf => "PDF",
            HeaderKind::Fdf => "FDF",
        };
        write!(f, "%{}-{}.{}", kind, self.major, self.minor)
    }
}

/// Supplies byte offsets for indirect objects.
///
/// The cross-reference machinery lives outside this crate; whoever owns it
/// implements this trait so the parser can resolve indirect `/Length`
/// values and the `/Encrypt` dictionary.
pub trait ObjectLocator {
    fn offset_of(&self, id: ObjectId) -> Option<u64>;
}

impl ObjectLocator for HashMap<ObjectId, u64> {
    fn offset_of(&self, id: ObjectId) -> Option<u64> {
        self.get(&id).copied()
    }
}

/// Parser for one document over one seekable byte source.
///
/// Holds the scratch state of a parse: the lexer, the reference lookahead,
/// the current object identity (the cryptographic context), and the
/// security handler once one is attached. Not reusable across concurrent
/// parses — one instance per document.
pub struct DocumentParser<R: Read + Seek> {
    pub(crate) lexer: Lexer<R>,
    pub(crate) lookahead: LookaheadBuffer,
    pub(crate) options: ParseOptions,
    pub(crate) handler: Option<Box<dyn DiagnosticHandler>>,
    pub(crate) security: Option<StandardSecurityHandler>,
    pub(crate) locator: Option<Box<dyn ObjectLocator>>,
    pub(crate) current_object: Option<ObjectId>,
}

impl<R: Read + Seek> DocumentParser<R> {
    pub fn new(reader: R, options: ParseOptions) -> ParseResult<Self> {
        let lexer = Lexer::new(reader)?;
        if lexer.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        Ok(Self {
            lexer,
            lookahead: LookaheadBuffer::new(),
            options,
            handler: None,
            security: None,
            locator: None,
            current_object: None,
        })
    }

    /// Install a diagnostic handler. Without one, errors fail the parse
    /// and warnings are dropped after being traced.
    pub fn set_handler(&mut self, handler: Box<dyn DiagnosticHandler>) {
        self.handler = Some(handler);
    }

    /// Install the offset source for indirect resolution.
    pub fn set_locator(&mut self, locator: Box<dyn ObjectLocator>) {
        self.locator = Some(locator);
    }

    /// The attached security handler, if the document is encrypted.
    pub fn security(&self) -> Option<&StandardSecurityHandler> {
        self.security.as_ref()
    }

    pub fn security_mut(&mut self) -> Option<&mut StandardSecurityHandler> {
        self.security.as_mut()
    }

    pub fn is_encrypted(&self) -> bool {
        self.security.is_some()
    }

    /// Current byte offset into the source.
    pub fn position(&self) -> u64 {
        self.lexer.position()
    }

    /// Seek to an absolute offset, discarding pending token and reference
    /// lookahead state. The external cross-reference machinery positions
    /// the parser through this.
    pub fn seek_to(&mut self, offset: u64) -> ParseResult<()> {
        self.lookahead.clear();
        self.lexer.seek_to(offset)
    }

    /// Suppress decryption while a composite object that must stay in
    /// plaintext (`/Encrypt`, `/ID`, cross-reference streams) is open.
    pub fn push_context_object(&mut self) {
        if let Some(security) = self.security.as_mut() {
            security.push_context_object();
        }
    }

    pub fn pop_context_object(&mut self) {
        if let Some(security) = self.security.as_mut() {
            security.pop_context_object();
        }
    }

    /// Route a warning: always traced, delivered to the handler when one
    /// is installed, dropped otherwise.
    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            code = diagnostic.code,
            offset = diagnostic.offset,
            "{}",
            diagnostic.message
        );
        if let Some(handler) = self.handler.as_mut() {
            handler.warning(diagnostic);
        }
    }

    /// Route a fatal fault through the handler; without one it fails.
    pub(crate) fn fail(&mut self, error: ParseError) -> ParseResult<()> {
        match self.handler.as_mut() {
            Some(handler) => handler.error(error),
            None => Err(error),
        }
    }

    /// Forward warnings the lexer accumulated while scanning.
    pub(crate) fn pump_lexer_warnings(&mut self) {
        let warnings = self.lexer.take_warnings();
        for diagnostic in warnings {
            self.warn(diagnostic);
        }
    }

    /// Decrypt a string at build time when a handler is active. Failure
    /// keeps the ciphertext and degrades to a warning.
    pub(crate) fn maybe_decrypt_string(&mut self, bytes: Vec<u8>) -> Vec<u8> {
        let id = match self.current_object {
            Some(id) => id,
            None => return bytes,
        };
        let outcome = match self.security.as_mut() {
            Some(security) if security.is_authenticated() && !security.is_suppressed() => {
                Some(security.decrypt_string(&bytes, id))
            }
            _ => None,
        };
        match outcome {
            Some(Ok(plaintext)) => plaintext,
            Some(Err(error)) => {
                let position = self.lexer.position();
                self.warn(
                    Diagnostic::new(
                        codes::DECRYPT_FAILED,
                        format!("string in {id} kept encrypted: {error}"),
                    )
                    .at(position),
                );
                bytes
            }
            None => bytes,
        }
    }

    /// Decrypt stream bytes at build time when a handler is active.
    pub(crate) fn maybe_decrypt_stream(&mut self, bytes: Vec<u8>) -> Vec<u8> {
        let id = match self.current_object {
            Some(id) => id,
            None => return bytes,
        };
        let outcome = match self.security.as_mut() {
            Some(security) if security.is_authenticated() && !security.is_suppressed() => {
                Some(security.decrypt_stream(&bytes, id))
            }
            _ => None,
        };
        match outcome {
            Some(Ok(plaintext)) => plaintext,
            Some(Err(error)) => {
                let position = self.lexer.position();
                self.warn(
                    Diagnostic::new(
                        codes::DECRYPT_FAILED,
                        format!("stream in {id} kept encrypted: {error}"),
                    )
                    .at(position),
                );
                bytes
            }
            None => bytes,
        }
    }

    /// Parse the `%PDF-x.y` / `%FDF-x.y` header.
    ///
    /// Strict mode requires the header at byte zero. Lenient mode scans a
    /// leading window for a displaced header and flags the displacement.
    pub fn parse_header(&mut self) -> ParseResult<PdfHeader> {
        self.lexer.seek_to(0)?;
        let window = self
            .options
            .header_scan_window
            .min(self.lexer.len() as usize);
        let head = self.lexer.read_up_to(window)?;

        let (offset, kind) = match find_header(&head) {
            Some(found) => found,
            None => return Err(ParseError::InvalidHeader),
        };
        if offset > 0 {
            if self.options.strict {
                return Err(ParseError::InvalidHeader);
            }
            self.warn(
                Diagnostic::new(codes::DISPLACED_HEADER, "header not at byte zero")
                    .at(offset as u64),
            );
        }

        // Version digits follow the 5-byte marker: "x.y".
        let digits = &head[offset + 5..];
        let (major, minor) = match (digits.first(), digits.get(1), digits.get(2)) {
            (Some(major @ b'0'..=b'9'), Some(b'.'), Some(minor @ b'0'..=b'9')) => {
                (major - b'0', minor - b'0')
            }
            _ => return Err(ParseError::InvalidHeader),
        };

        let header = PdfHeader {
            kind,
            major,
            minor,
            offset: offset as u64,
        };
        if !header.is_supported() {
            return Err(ParseError::UnsupportedVersion(format!("{major}.{minor}")));
        }

        // Leave the lexer after the header line.
        let mut line_end = offset + 8;
        while line_end < head.len() && head[line_end] != b'\n' && head[line_end] != b'\r' {
            line_end += 1;
        }
        self.lexer.seek_to(line_end as u64)?;

        Ok(header)
    }

    /// Parse an indirect object at the current position.
    ///
    /// Strict mode validates that exactly one space separates the object
    /// number, generation number, and `obj` keyword. A missing `endobj`
    /// is a recoverable warning; the offending token is pushed back so the
    /// caller can resynchronize.
    pub fn parse_indirect_object(&mut self) -> ParseResult<(ObjectId, PdfObject)> {
        self.lookahead.clear();

        let start = self.lexer.position();
        let number = match self.lexer.next_token()? {
            Token::Integer(n) if n >= 0 && n <= u32::MAX as i64 => n as u32,
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "object number".to_string(),
                    found: other.describe(),
                })
            }
        };
        let generation = match self.lexer.next_token()? {
            Token::Integer(g) if g >= 0 && g <= u16::MAX as i64 => {
                if self.options.strict && !self.lexer.last_gap_single_space() {
                    self.fail(ParseError::SyntaxError {
                        position: start,
                        message: "object header separators must be single spaces".to_string(),
                    })?;
                }
                g as u16
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "generation number".to_string(),
                    found: other.describe(),
                })
            }
        };
        match self.lexer.next_token()? {
            Token::Obj => {
                if self.options.strict && !self.lexer.last_gap_single_space() {
                    self.fail(ParseError::SyntaxError {
                        position: start,
                        message: "object header separators must be single spaces".to_string(),
                    })?;
                }
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "obj".to_string(),
                    found: other.describe(),
                })
            }
        }

        let id = ObjectId::new(number, generation);
        self.current_object = Some(id);
        let body = self.parse_object();
        self.current_object = None;
        let body = body?;

        match self.next_resolved_token()? {
            Token::EndObj => {}
            Token::Eof => {
                self.warn(
                    Diagnostic::new(codes::MISSING_ENDOBJ, format!("no endobj after {id}"))
                        .at(self.lexer.position())
                        .with_partial(body.clone()),
                );
            }
            other => {
                self.warn(
                    Diagnostic::new(codes::MISSING_ENDOBJ, format!("no endobj after {id}"))
                        .at(self.lexer.position())
                        .with_partial(body.clone()),
                );
                // Rewind: still-staged integers and the token belong to
                // whatever comes next.
                while let Some(value) = self.lookahead.take_newest() {
                    self.lexer.push_token(Token::Integer(value));
                }
                self.lexer.push_token(other);
            }
        }

        Ok((id, body))
    }

    /// Seek to `offset` and parse the indirect object there.
    pub fn parse_indirect_object_at(&mut self, offset: u64) -> ParseResult<(ObjectId, PdfObject)> {
        self.seek_to(offset)?;
        self.parse_indirect_object()
    }

    /// Parse `trailer` followed by its dictionary. The `/Encrypt` and
    /// `/ID` values are parsed with decryption suppressed — they are never
    /// themselves encrypted.
    pub fn parse_trailer(&mut self) -> ParseResult<PdfDictionary> {
        match self.next_resolved_token()? {
            Token::Trailer => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "trailer".to_string(),
                    found: other.describe(),
                })
            }
        }
        match self.next_resolved_token()? {
            Token::DictStart => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "trailer dictionary".to_string(),
                    found: other.describe(),
                })
            }
        }

        let mut dict = PdfDictionary::new();
        loop {
            let start = self.lexer.position();
            match self.next_resolved_token()? {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let exempt = key == "Encrypt" || key == "ID";
                    if exempt {
                        self.push_context_object();
                    }
                    let value = self.parse_object();
                    if exempt {
                        self.pop_context_object();
                    }
                    dict.0.insert(PdfName(key), value?);
                }
                Token::Eof => {
                    self.warn(
                        Diagnostic::new(
                            codes::UNBALANCED_DICTIONARY,
                            "trailer dictionary not closed by '>>'",
                        )
                        .at(start)
                        .with_partial(PdfObject::Dictionary(dict.clone())),
                    );
                    break;
                }
                other => {
                    self.warn(
                        Diagnostic::new(
                            codes::BAD_DICTIONARY_KEY,
                            format!("trailer key is not a name: {}", other.describe()),
                        )
                        .at(start),
                    );
                }
            }
        }
        Ok(dict)
    }

    /// Parse `startxref` followed by the offset integer.
    pub fn parse_startxref(&mut self) -> ParseResult<u64> {
        match self.lexer.next_token()? {
            Token::StartXref => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "startxref".to_string(),
                    found: other.describe(),
                })
            }
        }
        match self.lexer.next_token()? {
            Token::Integer(offset) if offset >= 0 => Ok(offset as u64),
            other => Err(ParseError::UnexpectedToken {
                expected: "startxref offset".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// Tail repair: when the normal chain is broken, scan backward through
    /// the final bytes of the file for the last `startxref` keyword and
    /// parse the offset after it.
    pub fn find_tail_startxref(&mut self) -> ParseResult<u64> {
        let length = self.lexer.len();
        let window = (self.options.tail_scan_window as u64).min(length);
        let tail_start = length - window;

        self.lexer.seek_to(tail_start)?;
        let tail = self.lexer.read_up_to(window as usize)?;

        let index = tail
            .windows(b"startxref".len())
            .rposition(|chunk| chunk == b"startxref")
            .ok_or(ParseError::MissingStartXref)?;

        self.lexer.seek_to(tail_start + index as u64)?;
        self.parse_startxref()
    }

    /// Locate the `/Encrypt` dictionary from a trailer, build the security
    /// handler, and authenticate. Returns `false` for unencrypted
    /// documents. Subsequent object parsing decrypts transparently.
    pub fn initialize_security(
        &mut self,
        trailer: &PdfDictionary,
        password: Option<&str>,
        provider: Option<&mut dyn PasswordProvider>,
    ) -> ParseResult<bool> {
        let encrypt_dict = match trailer.get("Encrypt") {
            None => return Ok(false),
            Some(PdfObject::Dictionary(dict)) => dict.clone(),
            Some(PdfObject::Reference(id)) => {
                let id = *id;
                let offset = self
                    .locator
                    .as_ref()
                    .and_then(|locator| locator.offset_of(id))
                    .ok_or_else(|| {
                        ParseError::Encryption(EncryptionError::InvalidDictionary(format!(
                            "cannot locate encryption dictionary {id}"
                        )))
                    })?;
                self.push_context_object();
                let parsed = self.parse_indirect_object_at(offset);
                self.pop_context_object();
                let (found_id, object) = parsed?;
                if found_id != id {
                    tracing::debug!(%id, %found_id, "encryption dictionary id mismatch");
                }
                object.as_dict().cloned().ok_or_else(|| {
                    ParseError::Encryption(EncryptionError::InvalidDictionary(
                        "encryption entry is not a dictionary".to_string(),
                    ))
                })?
            }
            Some(_) => {
                return Err(ParseError::Encryption(EncryptionError::InvalidDictionary(
                    "encryption entry is not a dictionary".to_string(),
                )))
            }
        };

        // First element of /ID, raw bytes. Never decrypted.
        let file_id = trailer
            .get("ID")
            .and_then(|o| o.as_array())
            .and_then(|a| a.get(0))
            .and_then(|o| o.as_string())
            .map(|s| s.as_bytes().to_vec());

        let dict = EncryptionDictionary::from_pdf_dict(&encrypt_dict)?;
        let mut security = StandardSecurityHandler::from_dict(dict, file_id)?;
        security.authenticate(password, provider, self.options.max_password_attempts)?;
        self.security = Some(security);
        Ok(true)
    }
}

fn find_header(head: &[u8]) -> Option<(usize, HeaderKind)> {
    head.windows(5).enumerate().find_map(|(i, w)| match w {
        b"%PDF-" => Some((i, HeaderKind::Pdf)),
        b"%FDF-" => Some((i, HeaderKind::Fdf)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::diagnostics::CollectingHandler;
    use std::io::Cursor;

    fn parser(input: &[u8]) -> DocumentParser<Cursor<Vec<u8>>> {
        DocumentParser::new(Cursor::new(input.to_vec()), ParseOptions::default()).unwrap()
    }

    fn strict_parser(input: &[u8]) -> DocumentParser<Cursor<Vec<u8>>> {
        DocumentParser::new(Cursor::new(input.to_vec()), ParseOptions::strict()).unwrap()
    }

    fn collecting(
        input: &[u8],
    ) -> (DocumentParser<Cursor<Vec<u8>>>, CollectingHandler) {
        let mut p = parser(input);
        let handler = CollectingHandler::new();
        p.set_handler(Box::new(handler.clone()));
        (p, handler)
    }

    #[test]
    fn test_empty_file_rejected() {
        let result = DocumentParser::new(Cursor::new(Vec::new()), ParseOptions::default());
        assert!(matches!(result, Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_parse_header_pdf() {
        let mut p = parser(b"%PDF-1.7\n1 0 obj");
        let header = p.parse_header().unwrap();
        assert_eq!(header.kind, HeaderKind::Pdf);
        assert_eq!((header.major, header.minor), (1, 7));
        assert_eq!(header.offset, 0);
        assert_eq!(header.to_string(), "%PDF-1.7");
    }

    #[test]
    fn test_parse_header_fdf() {
        let mut p = parser(b"%FDF-1.2\n");
        let header = p.parse_header().unwrap();
        assert_eq!(header.kind, HeaderKind::Fdf);
        assert_eq!((header.major, header.minor), (1, 2));
    }

    #[test]
    fn test_displaced_header_recovered_in_lenient_mode() {
        let (mut p, handler) = collecting(b"junk bytes %PDF-1.4\n");
        let header = p.parse_header().unwrap();
        assert_eq!(header.offset, 11);
        assert!(handler.has_warning(codes::DISPLACED_HEADER));
    }

    #[test]
    fn test_displaced_header_fails_in_strict_mode() {
        let mut p = strict_parser(b"junk %PDF-1.4\n");
        assert!(matches!(p.parse_header(), Err(ParseError::InvalidHeader)));
    }

    #[test]
    fn test_missing_header_is_fatal() {
        let mut p = parser(b"no header anywhere\n");
        assert!(matches!(p.parse_header(), Err(ParseError::InvalidHeader)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut p = parser(b"%PDF-3.9\n");
        assert!(matches!(
            p.parse_header(),
            Err(ParseError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_parse_indirect_object() {
        let mut p = parser(b"7 0 obj (hello) endobj");
        let (id, obj) = p.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(7, 0));
        assert_eq!(obj.as_string().unwrap().as_bytes(), b"hello");
    }

    #[test]
    fn test_indirect_object_with_reference_body() {
        // The body is one indirect reference, not three numbers.
        let mut p = parser(b"7 0 obj 12 0 R endobj");
        let (id, obj) = p.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(7, 0));
        assert_eq!(obj.as_reference(), Some(ObjectId::new(12, 0)));
    }

    #[test]
    fn test_missing_endobj_yields_object_with_warning() {
        let (mut p, handler) = collecting(b"5 0 obj (x) ");
        let (id, obj) = p.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(5, 0));
        assert_eq!(obj.as_string().unwrap().as_bytes(), b"x");
        assert!(handler.has_warning(codes::MISSING_ENDOBJ));
    }

    #[test]
    fn test_missing_endobj_rewinds_for_resync() {
        let (mut p, handler) = collecting(b"1 0 obj 42 2 0 obj 43 endobj");
        let (first_id, first) = p.parse_indirect_object().unwrap();
        assert_eq!(first_id, ObjectId::new(1, 0));
        assert_eq!(first.as_integer(), Some(42));
        assert!(handler.has_warning(codes::MISSING_ENDOBJ));

        let (second_id, second) = p.parse_indirect_object().unwrap();
        assert_eq!(second_id, ObjectId::new(2, 0));
        assert_eq!(second.as_integer(), Some(43));
    }

    #[test]
    fn test_strict_rejects_wide_object_header_gaps() {
        let mut p = strict_parser(b"7 0  obj (x) endobj");
        assert!(p.parse_indirect_object().is_err());
    }

    #[test]
    fn test_lenient_accepts_wide_object_header_gaps() {
        let mut p = parser(b"7  0 \t obj (x) endobj");
        let (id, _) = p.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(7, 0));
    }

    #[test]
    fn test_strict_accepts_single_spaces() {
        let mut p = strict_parser(b"7 0 obj (x) endobj");
        let (id, _) = p.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(7, 0));
    }

    #[test]
    fn test_parse_indirect_object_at_offset() {
        let data = b"junk junk 3 1 obj /Name endobj";
        let mut p = parser(data);
        let (id, obj) = p.parse_indirect_object_at(10).unwrap();
        assert_eq!(id, ObjectId::new(3, 1));
        assert_eq!(obj.as_name().unwrap().as_str(), "Name");
    }

    #[test]
    fn test_parse_trailer() {
        let mut p = parser(b"trailer << /Size 22 /Root 1 0 R >>");
        let trailer = p.parse_trailer().unwrap();
        assert_eq!(trailer.get("Size").unwrap().as_integer(), Some(22));
        assert_eq!(
            trailer.get("Root").unwrap().as_reference(),
            Some(ObjectId::new(1, 0))
        );
    }

    #[test]
    fn test_parse_startxref() {
        let mut p = parser(b"startxref\n18799\n%%EOF");
        assert_eq!(p.parse_startxref().unwrap(), 18799);
    }

    #[test]
    fn test_tail_repair_finds_last_startxref() {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.4\nstartxref\n111\n");
        data.extend_from_slice(&vec![b'x'; 100]);
        data.extend_from_slice(b"\nstartxref\n222\n%%EOF garbage");
        let mut p = parser(&data);
        assert_eq!(p.find_tail_startxref().unwrap(), 222);
    }

    #[test]
    fn test_tail_repair_without_startxref_fails() {
        let mut p = parser(b"%PDF-1.4\nnothing to see here\n%%EOF");
        assert!(matches!(
            p.find_tail_startxref(),
            Err(ParseError::MissingStartXref)
        ));
    }

    #[test]
    fn test_tail_repair_window_is_bounded() {
        // The keyword sits outside the 2048-byte window and must not be
        // found.
        let mut data = Vec::new();
        data.extend_from_slice(b"startxref\n333\n");
        data.extend_from_slice(&vec![b' '; 4096]);
        let mut p = parser(&data);
        assert!(p.find_tail_startxref().is_err());
    }

    #[test]
    fn test_indirect_length_resolution() {
        let data = b"1 0 obj << /Length 2 0 R >>\nstream\nHello\nendstream\nendobj\n2 0 obj 5 endobj";
        let mut p = parser(data);
        let mut offsets = HashMap::new();
        let actual = data.windows(7).position(|w| w == b"2 0 obj").unwrap() as u64;
        offsets.insert(ObjectId::new(2, 0), actual);
        p.set_locator(Box::new(offsets));

        let (_, obj) = p.parse_indirect_object().unwrap();
        assert_eq!(obj.as_stream().unwrap().data, b"Hello");
    }

    #[test]
    fn test_unencrypted_trailer_initializes_no_security() {
        let mut p = parser(b"trailer << /Size 4 >>");
        let trailer = p.parse_trailer().unwrap();
        let encrypted = p.initialize_security(&trailer, None, None).unwrap();
        assert!(!encrypted);
        assert!(!p.is_encrypted());
    }
}
