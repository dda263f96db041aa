//! COS Object Model and Builder
//!
//! The data model for the low-level PDF object graph (ISO 32000-1 Section
//! 7.3) and the recursive-descent builder that assembles it from tokens.
//! The builder lives on [`DocumentParser`] because object assembly needs
//! the document-wide state: the reference lookahead, the diagnostic
//! handler, and the security handler for decrypt-on-read.

use super::diagnostics::{codes, Diagnostic};
use super::document::DocumentParser;
use super::lexer::{StreamEol, Token};
use super::{ParseError, ParseResult};
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Structural limit on array length; longer arrays are flagged.
pub const MAX_ARRAY_LEN: usize = 8191;

/// Identity of an indirect object: (object number, generation number).
///
/// Also the per-object cryptographic context — every indirect object gets
/// its own derived key from the document master key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// PDF Name object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfName(pub String);

/// PDF String object, raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString(pub Vec<u8>);

/// PDF Array object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

/// PDF Dictionary object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub HashMap<PdfName, PdfObject>);

/// PDF Stream object: dictionary plus still-encoded bytes.
///
/// When the document is encrypted the bytes have already been decrypted at
/// parse time; filter decoding stays lazy until [`PdfStream::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
}

impl PdfStream {
    /// Decode the stream bytes through the `/Filter` chain.
    pub fn decode(&self, ctx: &super::filters::DecodeContext) -> ParseResult<Vec<u8>> {
        Ok(super::filters::decode_stream(&self.data, &self.dict, ctx)?)
    }

    /// The raw (possibly still encoded) stream bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

/// PDF Object types
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(PdfString),
    Name(PdfName),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Stream(PdfStream),
    Reference(ObjectId),
}

impl PdfObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            PdfObject::Real(r) => Some(*r),
            PdfObject::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&PdfName> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Dictionary view; streams expose their dictionary too.
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfObject::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            PdfObject::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

impl PdfDictionary {
    pub fn new() -> Self {
        PdfDictionary(HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.0.get(&PdfName(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) {
        self.0.insert(PdfName(key.into()), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&PdfName(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the `/Type` key, when present and a name.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(|o| o.as_name()).map(|n| n.as_str())
    }
}

impl PdfArray {
    pub fn new() -> Self {
        PdfArray(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    pub fn push(&mut self, obj: PdfObject) {
        self.0.push(obj);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfObject> {
        self.0.iter()
    }
}

impl PdfString {
    pub fn new(data: Vec<u8>) -> Self {
        PdfString(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }
}

impl PdfName {
    pub fn new(name: impl Into<String>) -> Self {
        PdfName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<R: Read + Seek> DocumentParser<R> {
    /// Next token with indirect-reference resolution applied.
    ///
    /// Integers are staged in the lookahead buffer; `R` collapses the two
    /// most recent into a [`Token::Reference`]. Any other token releases
    /// the oldest staged integer first and is re-read afterwards.
    pub(crate) fn next_resolved_token(&mut self) -> ParseResult<Token> {
        loop {
            let token = self.lexer.next_token()?;
            self.pump_lexer_warnings();
            match token {
                Token::Integer(value) => {
                    if let Some(oldest) = self.lookahead.push(value) {
                        return Ok(Token::Integer(oldest));
                    }
                }
                Token::R if self.lookahead.len() >= 2 => {
                    let (number, generation) =
                        self.lookahead.take_reference_pair().expect("len checked");
                    match (u32::try_from(number), u16::try_from(generation)) {
                        (Ok(number), Ok(generation)) => {
                            return Ok(Token::Reference(number, generation));
                        }
                        _ => {
                            return Err(ParseError::SyntaxError {
                                position: self.lexer.position(),
                                message: format!(
                                    "reference out of range: {number} {generation} R"
                                ),
                            });
                        }
                    }
                }
                other => {
                    if let Some(oldest) = self.lookahead.flush_oldest() {
                        self.lexer.push_token(other);
                        return Ok(Token::Integer(oldest));
                    }
                    return Ok(other);
                }
            }
        }
    }

    /// Parse one object at the current position.
    pub fn parse_object(&mut self) -> ParseResult<PdfObject> {
        let token = self.next_resolved_token()?;
        self.parse_object_from_token(token)
    }

    /// Assemble an object starting from an already-read token.
    pub(crate) fn parse_object_from_token(&mut self, token: Token) -> ParseResult<PdfObject> {
        match token {
            Token::Null => Ok(PdfObject::Null),
            Token::Boolean(b) => Ok(PdfObject::Boolean(b)),
            Token::Integer(i) => Ok(PdfObject::Integer(i)),
            Token::Real(r) => Ok(PdfObject::Real(r)),
            Token::String(bytes) => {
                let bytes = self.maybe_decrypt_string(bytes);
                Ok(PdfObject::String(PdfString(bytes)))
            }
            Token::Name(n) => Ok(PdfObject::Name(PdfName(n))),
            Token::Reference(number, generation) => {
                Ok(PdfObject::Reference(ObjectId::new(number, generation)))
            }
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dictionary_or_stream(),
            Token::Eof => Err(ParseError::SyntaxError {
                position: self.lexer.position(),
                message: "unexpected end of input".to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "object".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// Parse an array, skipping malformed elements with a warning.
    fn parse_array(&mut self) -> ParseResult<PdfObject> {
        let mut elements = PdfArray::new();
        let mut flagged_oversize = false;

        loop {
            let start = self.lexer.position();
            match self.next_resolved_token() {
                Ok(Token::ArrayEnd) => break,
                Ok(Token::Eof) => {
                    self.warn(
                        Diagnostic::new(codes::UNBALANCED_DICTIONARY, "array not closed by ']'")
                            .at(start)
                            .with_partial(PdfObject::Array(elements.clone())),
                    );
                    break;
                }
                Ok(token) => match self.parse_object_from_token(token) {
                    Ok(element) => {
                        elements.push(element);
                        if elements.len() > MAX_ARRAY_LEN && !flagged_oversize {
                            flagged_oversize = true;
                            self.warn(
                                Diagnostic::new(
                                    codes::OVERSIZED_ARRAY,
                                    format!("array exceeds {MAX_ARRAY_LEN} elements"),
                                )
                                .at(start),
                            );
                        }
                    }
                    Err(error) if error_is_recoverable(&error) => {
                        self.warn(
                            Diagnostic::new(
                                codes::SKIPPED_ARRAY_ELEMENT,
                                format!("skipped malformed array element: {error}"),
                            )
                            .at(start),
                        );
                        self.lexer.skip_malformed_element()?;
                    }
                    Err(error) => return Err(error),
                },
                Err(error) if error_is_recoverable(&error) => {
                    self.warn(
                        Diagnostic::new(
                            codes::SKIPPED_ARRAY_ELEMENT,
                            format!("skipped malformed array element: {error}"),
                        )
                        .at(start),
                    );
                    self.lexer.skip_malformed_element()?;
                }
                Err(error) => return Err(error),
            }
        }

        Ok(PdfObject::Array(elements))
    }

    /// Parse a dictionary; when the `stream` keyword follows, continue into
    /// the stream payload.
    fn parse_dictionary_or_stream(&mut self) -> ParseResult<PdfObject> {
        let dict = self.parse_dictionary_body()?;

        let token = self.next_resolved_token()?;
        match token {
            Token::Stream => {
                let data = self.parse_stream_payload(&dict)?;
                let data = self.maybe_decrypt_stream(data);
                Ok(PdfObject::Stream(PdfStream { dict, data }))
            }
            other => {
                self.lexer.push_token(other);
                Ok(PdfObject::Dictionary(dict))
            }
        }
    }

    /// Dictionary entries until `>>`, with recovery for the common damage
    /// patterns: stray `def` keywords leaking in from CMap syntax,
    /// non-name keys, and a missing closing `>>`.
    fn parse_dictionary_body(&mut self) -> ParseResult<PdfDictionary> {
        let mut dict = PdfDictionary::new();

        loop {
            let start = self.lexer.position();
            let token = self.next_resolved_token()?;
            match token {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let value = self.parse_object()?;
                    dict.0.insert(PdfName(key), value);
                }
                Token::Keyword(ref word) if word == b"def" => {
                    self.warn(
                        Diagnostic::new(codes::STRAY_DEF_KEYWORD, "stray 'def' in dictionary")
                            .at(start),
                    );
                }
                Token::Eof => {
                    self.warn(
                        Diagnostic::new(
                            codes::UNBALANCED_DICTIONARY,
                            "dictionary not closed by '>>'",
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
                            format!("dictionary key is not a name: {}", other.describe()),
                        )
                        .at(start),
                    );
                }
            }
        }

        Ok(dict)
    }

    /// Read the raw stream bytes after a `stream` keyword.
    ///
    /// The declared `/Length` is trusted first (resolving an indirect
    /// length through the object locator). When the declared length does
    /// not land on an `endstream` keyword, the payload is re-read by
    /// scanning for the literal tag — a heuristic, since the tag can
    /// legitimately occur inside binary data.
    fn parse_stream_payload(&mut self, dict: &PdfDictionary) -> ParseResult<Vec<u8>> {
        match self.lexer.consume_stream_eol()? {
            StreamEol::CrLf | StreamEol::Lf => {}
            eol @ (StreamEol::LoneCr | StreamEol::Missing) => {
                let message = match eol {
                    StreamEol::LoneCr => "stream keyword terminated by lone CR",
                    _ => "stream keyword not terminated by EOL",
                };
                if self.options.strict {
                    self.fail(ParseError::SyntaxError {
                        position: self.lexer.position(),
                        message: message.to_string(),
                    })?;
                }
                self.warn(Diagnostic::new(codes::STREAM_EOL, message).at(self.lexer.position()));
            }
        }

        let data_start = self.lexer.position();

        if let Some(length) = self.resolve_stream_length(dict) {
            let data = self.lexer.read_up_to(length)?;
            if data.len() == length {
                // The declared length must land on the endstream keyword.
                match self.lexer.next_token() {
                    Ok(Token::EndStream) => return Ok(data),
                    Ok(other) => {
                        self.warn(
                            Diagnostic::new(
                                codes::MISSING_ENDSTREAM,
                                format!(
                                    "endstream not at declared /Length {length}, found {}",
                                    other.describe()
                                ),
                            )
                            .at(data_start),
                        );
                    }
                    Err(_) => {
                        self.warn(
                            Diagnostic::new(
                                codes::MISSING_ENDSTREAM,
                                format!("endstream not at declared /Length {length}"),
                            )
                            .at(data_start),
                        );
                    }
                }
            } else {
                self.warn(
                    Diagnostic::new(
                        codes::MISSING_ENDSTREAM,
                        format!("declared /Length {length} runs past end of input"),
                    )
                    .at(data_start),
                );
            }
        } else {
            self.warn(
                Diagnostic::new(codes::MISSING_STREAM_LENGTH, "stream has no usable /Length")
                    .at(data_start),
            );
        }

        self.recover_stream_by_scan(data_start)
    }

    /// Fallback: rescan from the start of the payload for the literal
    /// `endstream` tag and take everything before it, minus the framing
    /// EOL.
    fn recover_stream_by_scan(&mut self, data_start: u64) -> ParseResult<Vec<u8>> {
        self.lexer.seek_to(data_start)?;
        let remaining = (self.lexer.len() - data_start) as usize;

        let tag_offset = match self.lexer.find_sequence_ahead(b"endstream", remaining)? {
            Some(offset) => offset,
            None => {
                self.fail(ParseError::SyntaxError {
                    position: data_start,
                    message: "no endstream keyword found".to_string(),
                })?;
                // Suppressed: hand back everything to EOF.
                self.lexer.len()
            }
        };

        let mut data = self.lexer.read_up_to((tag_offset - data_start) as usize)?;

        // The EOL before endstream belongs to the framing, not the data.
        if data.ends_with(b"\r\n") {
            data.truncate(data.len() - 2);
        } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
            data.truncate(data.len() - 1);
        }

        // Consume the tag itself when one was found.
        if tag_offset < self.lexer.len() {
            match self.lexer.next_token() {
                Ok(Token::EndStream) => {}
                _ => {
                    // The tag bytes were part of a longer word; nothing
                    // more we can do here.
                    tracing::debug!(offset = tag_offset, "endstream tag not tokenizable");
                }
            }
        }

        Ok(data)
    }

    /// Resolve `/Length`, following one level of indirection through the
    /// object locator.
    fn resolve_stream_length(&mut self, dict: &PdfDictionary) -> Option<usize> {
        match dict.get("Length") {
            Some(PdfObject::Integer(n)) if *n >= 0 => Some(*n as usize),
            Some(PdfObject::Reference(id)) => {
                let id = *id;
                self.resolve_indirect_integer(id)
                    .and_then(|n| if n >= 0 { Some(n as usize) } else { None })
            }
            _ => None,
        }
    }

    /// Seek to an indirect object expected to be a bare integer (stream
    /// lengths), parse it, and come back. Any trouble resolves to `None`.
    fn resolve_indirect_integer(&mut self, id: ObjectId) -> Option<i64> {
        let offset = self.locator.as_ref()?.offset_of(id)?;
        let saved = self.lexer.save_position();

        let value = (|| -> ParseResult<Option<i64>> {
            self.lexer.seek_to(offset)?;
            // Minimal framing read: N G obj <integer>
            let (number, generation) = match (self.lexer.next_token()?, self.lexer.next_token()?) {
                (Token::Integer(n), Token::Integer(g)) => (n, g),
                _ => return Ok(None),
            };
            if number != id.number() as i64 || generation != id.generation() as i64 {
                return Ok(None);
            }
            if self.lexer.next_token()? != Token::Obj {
                return Ok(None);
            }
            match self.lexer.next_token()? {
                Token::Integer(value) => Ok(Some(value)),
                _ => Ok(None),
            }
        })()
        .ok()
        .flatten();

        if self.lexer.restore_position(saved).is_err() {
            return None;
        }
        value
    }
}

/// Errors an array can recover from by skipping the element.
fn error_is_recoverable(error: &ParseError) -> bool {
    matches!(
        error,
        ParseError::SyntaxError { .. }
            | ParseError::UnexpectedToken { .. }
            | ParseError::UnterminatedString { .. }
    )
}
