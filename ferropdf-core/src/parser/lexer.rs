//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. Every byte
//! is classified through a 256-entry table; `next_token` dispatches on the
//! first non-whitespace byte. Keywords the lexer does not recognize are
//! returned as raw [`Token::Keyword`] bytes for the caller to interpret.

use super::diagnostics::{codes, Diagnostic};
use super::{ParseError, ParseResult};
use std::io::{BufReader, Read, Seek, SeekFrom};

/// Structural limit on name length; longer names are flagged.
pub const MAX_NAME_LEN: usize = 127;
/// Structural limit on string length; longer strings are flagged.
pub const MAX_STRING_LEN: usize = 32767;

/// Classification of a byte in PDF syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Token constituent, including `'` and `"` used by content-stream
    /// operators.
    Regular,
    /// Space, tab, CR, LF, FF, NUL.
    Whitespace,
    /// `( ) < > [ ] { } / %`
    Delimiter,
    /// `0`..`9`
    Digit,
    /// `.`, `+`, `-`
    NumberSpecial,
}

const fn classify(byte: u8) -> CharClass {
    match byte {
        b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ' => CharClass::Whitespace,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' => {
            CharClass::Delimiter
        }
        b'0'..=b'9' => CharClass::Digit,
        b'.' | b'+' | b'-' => CharClass::NumberSpecial,
        _ => CharClass::Regular,
    }
}

/// Byte-class lookup table, one entry per possible byte value.
pub static CHAR_CLASSES: [CharClass; 256] = {
    let mut table = [CharClass::Regular; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify(i as u8);
        i += 1;
    }
    table
};

#[inline]
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(CHAR_CLASSES[byte as usize], CharClass::Whitespace)
}

#[inline]
pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(CHAR_CLASSES[byte as usize], CharClass::Delimiter)
}

/// End-of-line variant found after a `stream` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEol {
    CrLf,
    Lf,
    /// A lone CR is a conformance violation but common in the wild.
    LoneCr,
    /// No EOL at all.
    Missing,
}

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal), raw bytes
    String(Vec<u8>),

    /// Name object (e.g., /Type)
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// obj keyword
    Obj,

    /// endobj keyword
    EndObj,

    /// stream keyword
    Stream,

    /// endstream keyword
    EndStream,

    /// trailer keyword
    Trailer,

    /// startxref keyword
    StartXref,

    /// A lone `R`, candidate tail of an indirect reference
    R,

    /// Indirect reference, produced by lookahead resolution
    Reference(u32, u16),

    /// null keyword
    Null,

    /// Unrecognized bare word, raw bytes for caller disambiguation
    Keyword(Vec<u8>),

    /// End of input
    Eof,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(bytes) => format!("keyword '{}'", String::from_utf8_lossy(bytes)),
            other => format!("{other:?}"),
        }
    }
}

/// PDF lexer over a seekable byte source.
pub struct Lexer<R: Read + Seek> {
    reader: BufReader<R>,
    /// Offset of the next unconsumed byte.
    position: u64,
    /// Total length of the source.
    length: u64,
    peeked: Option<u8>,
    pushback: Vec<Token>,
    warnings: Vec<Diagnostic>,
    /// Whether the whitespace before the last token was exactly one space.
    gap_single_space: bool,
}

impl<R: Read + Seek> Lexer<R> {
    /// Create a lexer, measuring the source length.
    pub fn new(reader: R) -> ParseResult<Self> {
        let mut reader = BufReader::new(reader);
        let length = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            position: 0,
            length,
            peeked: None,
            pushback: Vec::new(),
            warnings: Vec::new(),
            gap_single_space: false,
        })
    }

    /// Offset of the next unconsumed byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the source.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the whitespace run before the last token was exactly one
    /// space byte. Used by strict `N G obj` validation.
    pub fn last_gap_single_space(&self) -> bool {
        self.gap_single_space
    }

    /// Drain warnings accumulated during scanning.
    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    /// Seek to an absolute offset, discarding pushed-back tokens.
    pub fn seek_to(&mut self, offset: u64) -> ParseResult<()> {
        self.pushback.clear();
        self.rewind_to(offset)
    }

    /// Seek without touching the pushback stack. Internal rescue scans use
    /// this so a pending token survives the excursion.
    fn rewind_to(&mut self, offset: u64) -> ParseResult<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.peeked = None;
        self.position = offset;
        Ok(())
    }

    /// Snapshot of the current source position and pending tokens.
    pub fn save_position(&self) -> (u64, Vec<Token>) {
        (self.position, self.pushback.clone())
    }

    /// Restore a snapshot taken with [`Lexer::save_position`].
    pub fn restore_position(&mut self, saved: (u64, Vec<Token>)) -> ParseResult<()> {
        self.rewind_to(saved.0)?;
        self.pushback = saved.1;
        Ok(())
    }

    /// Push a token back to be returned by the next `next_token` call.
    pub fn push_token(&mut self, token: Token) {
        self.pushback.push(token);
    }

    fn peek_byte(&mut self) -> ParseResult<Option<u8>> {
        if let Some(byte) = self.peeked {
            return Ok(Some(byte));
        }
        let mut buf = [0u8; 1];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.peeked = Some(buf[0]);
                Ok(Some(buf[0]))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_byte(&mut self) -> ParseResult<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.peeked = None;
            self.position += 1;
        }
        Ok(byte)
    }

    /// Read up to `n` raw bytes; a short read means EOF.
    pub fn read_up_to(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(n.min(1 << 20));
        if n == 0 {
            return Ok(bytes);
        }
        if let Some(byte) = self.peeked.take() {
            bytes.push(byte);
            self.position += 1;
        }
        // A bogus declared length must not drive the allocation past what
        // the source can actually deliver.
        let remaining = self.length.saturating_sub(self.position) as usize;
        let mut buf = vec![0u8; (n - bytes.len()).min(remaining)];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);
        self.position += filled as u64;
        bytes.extend_from_slice(&buf);
        Ok(bytes)
    }

    /// Skip whitespace and comments, tracking whether the gap was a single
    /// space byte.
    fn skip_whitespace_and_comments(&mut self) -> ParseResult<()> {
        let mut skipped = 0usize;
        let mut only_space = true;
        loop {
            match self.peek_byte()? {
                Some(b'%') => {
                    only_space = false;
                    // Comment runs to end of line and counts as whitespace.
                    while let Some(byte) = self.read_byte()? {
                        skipped += 1;
                        if byte == b'\n' || byte == b'\r' {
                            break;
                        }
                    }
                }
                Some(byte) if is_whitespace(byte) => {
                    if byte != b' ' {
                        only_space = false;
                    }
                    self.read_byte()?;
                    skipped += 1;
                }
                _ => break,
            }
        }
        self.gap_single_space = skipped == 1 && only_space;
        Ok(())
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> ParseResult<Token> {
        if let Some(token) = self.pushback.pop() {
            return Ok(token);
        }

        self.skip_whitespace_and_comments()?;

        let byte = match self.peek_byte()? {
            Some(byte) => byte,
            None => return Ok(Token::Eof),
        };

        match byte {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => self.read_angle_bracket(),
            b'>' => {
                self.read_byte()?;
                if self.peek_byte()? == Some(b'>') {
                    self.read_byte()?;
                    Ok(Token::DictEnd)
                } else {
                    Err(ParseError::SyntaxError {
                        position: self.position,
                        message: "expected '>>' for dictionary end".to_string(),
                    })
                }
            }
            b'[' => {
                self.read_byte()?;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.read_byte()?;
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
            b'{' | b'}' => {
                self.read_byte()?;
                Ok(Token::Keyword(vec![byte]))
            }
            b')' => Err(ParseError::SyntaxError {
                position: self.position,
                message: "unexpected ')'".to_string(),
            }),
            _ => self.read_word(),
        }
    }

    /// Read a name object (e.g. `/Type`), decoding `#XX` escapes.
    fn read_name(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.read_byte()?; // consume '/'
        let mut name = String::new();
        let mut flagged = false;

        while let Some(byte) = self.peek_byte()? {
            if is_whitespace(byte) || is_delimiter(byte) {
                break;
            }
            self.read_byte()?;

            if byte == b'#' {
                self.read_name_escape(&mut name)?;
            } else {
                name.push(byte as char);
            }

            if name.len() > MAX_NAME_LEN && !flagged {
                flagged = true;
                tracing::warn!(offset = start, "name exceeds {} bytes", MAX_NAME_LEN);
                self.warnings.push(
                    Diagnostic::new(
                        codes::OVERSIZED_NAME,
                        format!("name exceeds {MAX_NAME_LEN} bytes"),
                    )
                    .at(start),
                );
            }
        }

        Ok(Token::Name(name))
    }

    /// Decode a `#XX` escape inside a name. A malformed escape keeps the
    /// bytes it inspected as literal characters and flags a warning.
    fn read_name_escape(&mut self, name: &mut String) -> ParseResult<()> {
        let first = match self.peek_byte()? {
            Some(byte) if byte.is_ascii_hexdigit() => {
                self.read_byte()?;
                byte
            }
            _ => {
                self.warnings.push(
                    Diagnostic::new(codes::BAD_NAME_ESCAPE, "invalid #XX escape in name")
                        .at(self.position),
                );
                name.push('#');
                return Ok(());
            }
        };
        match self.peek_byte()? {
            Some(byte) if byte.is_ascii_hexdigit() => {
                self.read_byte()?;
                name.push((hex_value(first) << 4 | hex_value(byte)) as char);
            }
            _ => {
                self.warnings.push(
                    Diagnostic::new(codes::BAD_NAME_ESCAPE, "invalid #XX escape in name")
                        .at(self.position),
                );
                name.push('#');
                name.push(first as char);
            }
        }
        Ok(())
    }

    /// Read a literal `( ... )` string with escape handling and EOL
    /// normalization. EOF inside the string is fatal.
    fn read_literal_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.read_byte()?; // consume '('
        let mut bytes = Vec::new();
        let mut depth = 1usize;
        let mut flagged = false;

        loop {
            let byte = self
                .read_byte()?
                .ok_or(ParseError::UnterminatedString { position: start })?;

            match byte {
                b'\\' => {
                    let escaped = self
                        .read_byte()?
                        .ok_or(ParseError::UnterminatedString { position: start })?;
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b'r' => bytes.push(b'\r'),
                        b't' => bytes.push(b'\t'),
                        b'b' => bytes.push(b'\x08'),
                        b'f' => bytes.push(b'\x0C'),
                        b'(' => bytes.push(b'('),
                        b')' => bytes.push(b')'),
                        b'\\' => bytes.push(b'\\'),
                        b'0'..=b'7' => {
                            let mut value = escaped - b'0';
                            for _ in 0..2 {
                                match self.peek_byte()? {
                                    Some(digit @ b'0'..=b'7') => {
                                        self.read_byte()?;
                                        value = value.wrapping_mul(8).wrapping_add(digit - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            bytes.push(value);
                        }
                        // Backslash before an EOL continues the line.
                        b'\r' => {
                            if self.peek_byte()? == Some(b'\n') {
                                self.read_byte()?;
                            }
                        }
                        b'\n' => {}
                        // Unknown escape: the backslash is dropped.
                        other => bytes.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    bytes.push(byte);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    bytes.push(byte);
                }
                // Raw EOLs are normalized to LF.
                b'\r' => {
                    if self.peek_byte()? == Some(b'\n') {
                        self.read_byte()?;
                    }
                    bytes.push(b'\n');
                }
                _ => bytes.push(byte),
            }

            if bytes.len() > MAX_STRING_LEN && !flagged {
                flagged = true;
                self.warnings.push(
                    Diagnostic::new(
                        codes::OVERSIZED_STRING,
                        format!("string exceeds {MAX_STRING_LEN} bytes"),
                    )
                    .at(start),
                );
            }
        }

        Ok(Token::String(bytes))
    }

    /// `<<` or a hex string.
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.read_byte()?; // consume '<'

        if self.peek_byte()? == Some(b'<') {
            self.read_byte()?;
            return Ok(Token::DictStart);
        }

        let mut digits: Vec<u8> = Vec::new();
        loop {
            let byte = self
                .read_byte()?
                .ok_or(ParseError::UnterminatedString { position: start })?;
            match byte {
                b'>' => break,
                byte if byte.is_ascii_hexdigit() => digits.push(byte),
                byte if is_whitespace(byte) => {}
                other => {
                    self.warnings.push(
                        Diagnostic::new(
                            codes::ILLEGAL_HEX_DIGIT,
                            format!("illegal character 0x{other:02X} in hex string"),
                        )
                        .at(self.position),
                    );
                }
            }
        }

        if digits.len() % 2 != 0 {
            self.warnings.push(
                Diagnostic::new(codes::ODD_HEX_DIGITS, "odd digit count, assuming trailing 0")
                    .at(start),
            );
            digits.push(b'0');
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| hex_value(pair[0]) << 4 | hex_value(pair[1]))
            .collect::<Vec<u8>>();

        if bytes.len() > MAX_STRING_LEN {
            self.warnings.push(
                Diagnostic::new(
                    codes::OVERSIZED_STRING,
                    format!("string exceeds {MAX_STRING_LEN} bytes"),
                )
                .at(start),
            );
        }

        Ok(Token::String(bytes))
    }

    /// Read an integer or real number.
    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let mut text = String::new();
        let mut has_dot = false;

        if let Some(byte @ (b'+' | b'-')) = self.peek_byte()? {
            self.read_byte()?;
            text.push(byte as char);
        }

        while let Some(byte) = self.peek_byte()? {
            match byte {
                b'0'..=b'9' => {
                    self.read_byte()?;
                    text.push(byte as char);
                }
                b'.' if !has_dot => {
                    self.read_byte()?;
                    text.push('.');
                    has_dot = true;
                }
                _ => break,
            }
        }

        if text.is_empty() || text == "+" || text == "-" || text == "." {
            return Err(ParseError::SyntaxError {
                position: start,
                message: format!("malformed number '{text}'"),
            });
        }

        if has_dot {
            let value = text.parse::<f64>().map_err(|_| ParseError::SyntaxError {
                position: start,
                message: format!("invalid real number '{text}'"),
            })?;
            Ok(Token::Real(value))
        } else if let Ok(value) = text.parse::<i64>() {
            Ok(Token::Integer(value))
        } else {
            // Out-of-range integers degrade to reals rather than failing.
            let value = text.parse::<f64>().map_err(|_| ParseError::SyntaxError {
                position: start,
                message: format!("invalid number '{text}'"),
            })?;
            Ok(Token::Real(value))
        }
    }

    /// Read a bare word and map the recognized keywords. EOF mid-word
    /// returns whatever accumulated.
    fn read_word(&mut self) -> ParseResult<Token> {
        let mut word = Vec::new();
        while let Some(byte) = self.peek_byte()? {
            if is_whitespace(byte) || is_delimiter(byte) {
                break;
            }
            self.read_byte()?;
            word.push(byte);
        }

        Ok(match word.as_slice() {
            b"true" => Token::Boolean(true),
            b"false" => Token::Boolean(false),
            b"null" => Token::Null,
            b"obj" => Token::Obj,
            b"endobj" => Token::EndObj,
            b"stream" => Token::Stream,
            b"endstream" => Token::EndStream,
            b"trailer" => Token::Trailer,
            b"startxref" => Token::StartXref,
            b"R" => Token::R,
            _ => Token::Keyword(word),
        })
    }

    /// Consume the EOL that must follow a `stream` keyword.
    pub fn consume_stream_eol(&mut self) -> ParseResult<StreamEol> {
        match self.peek_byte()? {
            Some(b'\r') => {
                self.read_byte()?;
                if self.peek_byte()? == Some(b'\n') {
                    self.read_byte()?;
                    Ok(StreamEol::CrLf)
                } else {
                    Ok(StreamEol::LoneCr)
                }
            }
            Some(b'\n') => {
                self.read_byte()?;
                Ok(StreamEol::Lf)
            }
            _ => Ok(StreamEol::Missing),
        }
    }

    /// Consume the remains of a malformed element: everything up to the
    /// next whitespace byte or array terminator.
    pub fn skip_malformed_element(&mut self) -> ParseResult<()> {
        while let Some(byte) = self.peek_byte()? {
            if is_whitespace(byte) || byte == b']' {
                break;
            }
            self.read_byte()?;
        }
        Ok(())
    }

    /// Scan forward for a byte sequence without consuming input. Returns
    /// the absolute offset of the match start. The scan is capped at
    /// `limit` bytes.
    pub fn find_sequence_ahead(
        &mut self,
        needle: &[u8],
        limit: usize,
    ) -> ParseResult<Option<u64>> {
        debug_assert!(!needle.is_empty());
        const CHUNK: usize = 8 * 1024;

        let origin = self.position;
        let mut found = None;
        // Carried suffix of the previous chunk so a match spanning a
        // chunk boundary is still seen.
        let mut window: Vec<u8> = Vec::new();
        let mut window_start = origin;
        let mut scanned = 0usize;

        while scanned < limit && found.is_none() {
            let chunk = self.read_up_to(CHUNK.min(limit - scanned))?;
            if chunk.is_empty() {
                break;
            }
            scanned += chunk.len();
            window.extend_from_slice(&chunk);

            if let Some(pos) = window.windows(needle.len()).position(|w| w == needle) {
                found = Some(window_start + pos as u64);
                break;
            }

            let keep = window.len().min(needle.len() - 1);
            window_start += (window.len() - keep) as u64;
            window.drain(..window.len() - keep);
        }

        self.rewind_to(origin)?;
        Ok(found)
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => unreachable!("caller checked is_ascii_hexdigit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lexer(input: &[u8]) -> Lexer<Cursor<Vec<u8>>> {
        Lexer::new(Cursor::new(input.to_vec())).unwrap()
    }

    #[test]
    fn test_char_class_table() {
        assert_eq!(CHAR_CLASSES[b' ' as usize], CharClass::Whitespace);
        assert_eq!(CHAR_CLASSES[0], CharClass::Whitespace);
        assert_eq!(CHAR_CLASSES[b'\x0C' as usize], CharClass::Whitespace);
        assert_eq!(CHAR_CLASSES[b'(' as usize], CharClass::Delimiter);
        assert_eq!(CHAR_CLASSES[b'{' as usize], CharClass::Delimiter);
        assert_eq!(CHAR_CLASSES[b'%' as usize], CharClass::Delimiter);
        assert_eq!(CHAR_CLASSES[b'7' as usize], CharClass::Digit);
        assert_eq!(CHAR_CLASSES[b'-' as usize], CharClass::NumberSpecial);
        assert_eq!(CHAR_CLASSES[b'\'' as usize], CharClass::Regular);
        assert_eq!(CHAR_CLASSES[b'"' as usize], CharClass::Regular);
    }

    #[test]
    fn test_basic_tokens() {
        let mut lexer = lexer(b"123 -456 3.14 true false null /Name");
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(123));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(-456));
        assert_eq!(lexer.next_token().unwrap(), Token::Real(3.14));
        assert_eq!(lexer.next_token().unwrap(), Token::Boolean(true));
        assert_eq!(lexer.next_token().unwrap(), Token::Boolean(false));
        assert_eq!(lexer.next_token().unwrap(), Token::Null);
        assert_eq!(lexer.next_token().unwrap(), Token::Name("Name".to_string()));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_real_edge_cases() {
        let mut lexer = lexer(b".5 5. -0.25 +1.5");
        assert_eq!(lexer.next_token().unwrap(), Token::Real(0.5));
        assert_eq!(lexer.next_token().unwrap(), Token::Real(5.0));
        assert_eq!(lexer.next_token().unwrap(), Token::Real(-0.25));
        assert_eq!(lexer.next_token().unwrap(), Token::Real(1.5));
    }

    #[test]
    fn test_huge_integer_degrades_to_real() {
        let mut lexer = lexer(b"99999999999999999999999999");
        match lexer.next_token().unwrap() {
            Token::Real(value) => assert!(value > 9.9e24),
            other => panic!("expected real, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_string_escapes() {
        let mut lexer = lexer(b"(Hello\\nWorld) (a\\051b) (\\0053)");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(b"Hello\nWorld".to_vec())
        );
        assert_eq!(lexer.next_token().unwrap(), Token::String(b"a)b".to_vec()));
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(vec![0x05, b'3'])
        );
    }

    #[test]
    fn test_literal_string_nested_parens() {
        let mut lexer = lexer(b"(outer (inner) tail)");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(b"outer (inner) tail".to_vec())
        );
    }

    #[test]
    fn test_literal_string_eol_normalization() {
        let mut lexer = lexer(b"(a\r\nb\rc\nd)");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(b"a\nb\nc\nd".to_vec())
        );
    }

    #[test]
    fn test_literal_string_line_continuation() {
        let mut lexer = lexer(b"(split\\\r\nline)");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(b"splitline".to_vec())
        );
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let mut lexer = lexer(b"(no closing paren");
        assert!(matches!(
            lexer.next_token(),
            Err(ParseError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_hex_strings() {
        let mut lexer = lexer(b"<48656C6C6F> <48 65 6C 6C 6F> <>");
        assert_eq!(lexer.next_token().unwrap(), Token::String(b"Hello".to_vec()));
        assert_eq!(lexer.next_token().unwrap(), Token::String(b"Hello".to_vec()));
        assert_eq!(lexer.next_token().unwrap(), Token::String(Vec::new()));
    }

    #[test]
    fn test_hex_string_odd_digits_warns() {
        let mut lexer = lexer(b"<ABC>");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::String(vec![0xAB, 0xC0])
        );
        let warnings = lexer.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, codes::ODD_HEX_DIGITS);
    }

    #[test]
    fn test_hex_string_illegal_digit_warns() {
        let mut lexer = lexer(b"<4X8>");
        assert_eq!(lexer.next_token().unwrap(), Token::String(vec![0x48]));
        let warnings = lexer.take_warnings();
        assert_eq!(warnings[0].code, codes::ILLEGAL_HEX_DIGIT);
    }

    #[test]
    fn test_name_hex_escapes() {
        let mut lexer = lexer(b"/A#20B /Name#2Fslash");
        assert_eq!(lexer.next_token().unwrap(), Token::Name("A B".to_string()));
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Name("Name/slash".to_string())
        );
    }

    #[test]
    fn test_name_bad_escape_warns_and_keeps_hash() {
        let mut lexer = lexer(b"/Bad#ZZ");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Name("Bad#ZZ".to_string())
        );
        let warnings = lexer.take_warnings();
        assert_eq!(warnings[0].code, codes::BAD_NAME_ESCAPE);
    }

    #[test]
    fn test_empty_name() {
        let mut lexer = lexer(b"/ /A");
        assert_eq!(lexer.next_token().unwrap(), Token::Name(String::new()));
        assert_eq!(lexer.next_token().unwrap(), Token::Name("A".to_string()));
    }

    #[test]
    fn test_keywords() {
        let mut lexer = lexer(b"obj endobj stream endstream trailer startxref R xref");
        assert_eq!(lexer.next_token().unwrap(), Token::Obj);
        assert_eq!(lexer.next_token().unwrap(), Token::EndObj);
        assert_eq!(lexer.next_token().unwrap(), Token::Stream);
        assert_eq!(lexer.next_token().unwrap(), Token::EndStream);
        assert_eq!(lexer.next_token().unwrap(), Token::Trailer);
        assert_eq!(lexer.next_token().unwrap(), Token::StartXref);
        assert_eq!(lexer.next_token().unwrap(), Token::R);
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Keyword(b"xref".to_vec())
        );
    }

    #[test]
    fn test_unknown_word_returned_raw() {
        let mut lexer = lexer(b"def BT");
        assert_eq!(lexer.next_token().unwrap(), Token::Keyword(b"def".to_vec()));
        assert_eq!(lexer.next_token().unwrap(), Token::Keyword(b"BT".to_vec()));
    }

    #[test]
    fn test_structure_tokens() {
        let mut lexer = lexer(b"<< /K [1 2] >>");
        assert_eq!(lexer.next_token().unwrap(), Token::DictStart);
        assert_eq!(lexer.next_token().unwrap(), Token::Name("K".to_string()));
        assert_eq!(lexer.next_token().unwrap(), Token::ArrayStart);
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(1));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(2));
        assert_eq!(lexer.next_token().unwrap(), Token::ArrayEnd);
        assert_eq!(lexer.next_token().unwrap(), Token::DictEnd);
    }

    #[test]
    fn test_comments_are_skipped() {
        let mut lexer = lexer(b"%PDF-1.7\n42 % trailing\n/N");
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(42));
        assert_eq!(lexer.next_token().unwrap(), Token::Name("N".to_string()));
    }

    #[test]
    fn test_pushback() {
        let mut lexer = lexer(b"1 2");
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(1));
        let token = lexer.next_token().unwrap();
        lexer.push_token(token);
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(2));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_gap_tracking() {
        let mut lexer = lexer(b"7 0  obj");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(lexer.last_gap_single_space());
        lexer.next_token().unwrap();
        assert!(!lexer.last_gap_single_space());
    }

    #[test]
    fn test_consume_stream_eol_variants() {
        let mut lexer1 = lexer(b"\r\nX");
        assert_eq!(lexer1.consume_stream_eol().unwrap(), StreamEol::CrLf);

        let mut lexer2 = lexer(b"\nX");
        assert_eq!(lexer2.consume_stream_eol().unwrap(), StreamEol::Lf);

        let mut lexer3 = lexer(b"\rX");
        assert_eq!(lexer3.consume_stream_eol().unwrap(), StreamEol::LoneCr);

        let mut lexer4 = lexer(b"X");
        assert_eq!(lexer4.consume_stream_eol().unwrap(), StreamEol::Missing);
    }

    #[test]
    fn test_find_sequence_ahead() {
        let mut lexer = lexer(b"some data here endstream more");
        let found = lexer.find_sequence_ahead(b"endstream", 100).unwrap();
        assert_eq!(found, Some(15));
        // The scan must not consume anything.
        assert_eq!(lexer.position(), 0);
        assert_eq!(lexer.next_token().unwrap(), Token::Keyword(b"some".to_vec()));
    }

    #[test]
    fn test_find_sequence_ahead_overlapping_prefix() {
        // A truncated copy of the tag directly before the real one must
        // not hide it.
        let mut lexer = lexer(b"data endstrendstream");
        assert_eq!(
            lexer.find_sequence_ahead(b"endstream", 100).unwrap(),
            Some(11)
        );
    }

    #[test]
    fn test_find_sequence_ahead_respects_limit() {
        let mut lexer = lexer(b"0123456789endstream");
        assert_eq!(lexer.find_sequence_ahead(b"endstream", 5).unwrap(), None);
        assert!(lexer
            .find_sequence_ahead(b"endstream", 100)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_read_up_to_short_read() {
        let mut lexer = lexer(b"abc");
        assert_eq!(lexer.read_up_to(10).unwrap(), b"abc".to_vec());
        assert_eq!(lexer.position(), 3);
    }

    #[test]
    fn test_seek_and_save_restore() {
        let mut lexer = lexer(b"1 2 3");
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(1));
        let saved = lexer.save_position();
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(2));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(3));
        lexer.restore_position(saved).unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(2));
    }

    #[test]
    fn test_eof_mid_word_returns_accumulated() {
        let mut lexer = lexer(b"strea");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Keyword(b"strea".to_vec())
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}
