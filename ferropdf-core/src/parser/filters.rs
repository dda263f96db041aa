//! PDF Stream Filters
//!
//! Decoding and encoding of stream payloads according to ISO 32000-1
//! Section 7.4. A stream's `/Filter` entry names one codec or a chain,
//! composed strictly left to right with the parallel `/DecodeParms`
//! entries. Failures surface lazily — at the first decode access — so a
//! corrupt stream never blocks loading the rest of a document.

use super::filter_impls::{ccitt, lzw, predictor};
use super::objects::{PdfDictionary, PdfObject};

#[cfg(feature = "compression")]
use crate::pool::CodecPool;
#[cfg(feature = "compression")]
use std::sync::Arc;

/// Filter pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("filter {0} is handled by an external codec")]
    ExternalCodec(String),

    #[error("corrupt stream data: {0}")]
    Corrupt(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid filter parameters: {0}")]
    InvalidParams(String),

    #[error("timed out waiting for a pooled codec")]
    PoolTimeout,
}

/// The filters named by ISO 32000-1, with their PDF abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    FlateDecode,
    LZWDecode,
    ASCII85Decode,
    ASCIIHexDecode,
    RunLengthDecode,
    CCITTFaxDecode,
    JBIG2Decode,
    DCTDecode,
    JPXDecode,
    Crypt,
}

impl Filter {
    /// Look up a filter by its long or abbreviated name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FlateDecode" | "Fl" => Some(Filter::FlateDecode),
            "LZWDecode" | "LZW" => Some(Filter::LZWDecode),
            "ASCII85Decode" | "A85" => Some(Filter::ASCII85Decode),
            "ASCIIHexDecode" | "AHx" => Some(Filter::ASCIIHexDecode),
            "RunLengthDecode" | "RL" => Some(Filter::RunLengthDecode),
            "CCITTFaxDecode" | "CCF" => Some(Filter::CCITTFaxDecode),
            "JBIG2Decode" => Some(Filter::JBIG2Decode),
            "DCTDecode" | "DCT" => Some(Filter::DCTDecode),
            "JPXDecode" => Some(Filter::JPXDecode),
            "Crypt" => Some(Filter::Crypt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::FlateDecode => "FlateDecode",
            Filter::LZWDecode => "LZWDecode",
            Filter::ASCII85Decode => "ASCII85Decode",
            Filter::ASCIIHexDecode => "ASCIIHexDecode",
            Filter::RunLengthDecode => "RunLengthDecode",
            Filter::CCITTFaxDecode => "CCITTFaxDecode",
            Filter::JBIG2Decode => "JBIG2Decode",
            Filter::DCTDecode => "DCTDecode",
            Filter::JPXDecode => "JPXDecode",
            Filter::Crypt => "Crypt",
        }
    }
}

/// Capabilities a decode needs: the codec pool handle.
///
/// Owned by whoever drives decoding; there is no process-global state.
#[derive(Clone, Default)]
pub struct DecodeContext {
    #[cfg(feature = "compression")]
    pool: Arc<CodecPool>,
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "compression")]
    pub fn with_pool(pool: Arc<CodecPool>) -> Self {
        Self { pool }
    }

    #[cfg(feature = "compression")]
    pub fn pool(&self) -> &CodecPool {
        &self.pool
    }
}

/// Decode stream bytes through the `/Filter` chain of `dict`.
pub fn decode_stream(
    data: &[u8],
    dict: &PdfDictionary,
    ctx: &DecodeContext,
) -> Result<Vec<u8>, FilterError> {
    let filters = filter_chain(dict)?;
    if filters.is_empty() {
        return Ok(data.to_vec());
    }
    let parms = parms_chain(dict, filters.len())?;

    let mut current = data.to_vec();
    for (index, (filter, params)) in filters.iter().zip(parms.iter()).enumerate() {
        if *filter == Filter::Crypt {
            // The parser already applied the security handler; an Identity
            // entry at the head of the chain is a no-op here.
            let name = params
                .and_then(|p| p.get("Name"))
                .and_then(|o| o.as_name())
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| "Identity".to_string());
            if index == 0 && name == "Identity" {
                continue;
            }
            return Err(FilterError::Unsupported(format!(
                "Crypt filter {name} must be applied by the security handler"
            )));
        }
        current = decode(&current, *filter, *params, ctx)?;
    }
    Ok(current)
}

/// The (filter, params) pairs of a stream dictionary, in application
/// order.
fn filter_chain(dict: &PdfDictionary) -> Result<Vec<Filter>, FilterError> {
    match dict.get("Filter") {
        None | Some(PdfObject::Null) => Ok(Vec::new()),
        Some(PdfObject::Name(name)) => {
            let filter = Filter::from_name(name.as_str())
                .ok_or_else(|| FilterError::UnknownFilter(name.as_str().to_string()))?;
            Ok(vec![filter])
        }
        Some(PdfObject::Array(array)) => array
            .iter()
            .map(|entry| match entry {
                PdfObject::Name(name) => Filter::from_name(name.as_str())
                    .ok_or_else(|| FilterError::UnknownFilter(name.as_str().to_string())),
                other => Err(FilterError::InvalidParams(format!(
                    "filter array entry is {other:?}"
                ))),
            })
            .collect(),
        Some(other) => Err(FilterError::InvalidParams(format!(
            "/Filter is {other:?}"
        ))),
    }
}

fn parms_chain(
    dict: &PdfDictionary,
    filter_count: usize,
) -> Result<Vec<Option<&PdfDictionary>>, FilterError> {
    match dict.get("DecodeParms") {
        None | Some(PdfObject::Null) => Ok(vec![None; filter_count]),
        Some(PdfObject::Dictionary(parms)) => {
            let mut list = vec![None; filter_count];
            if let Some(slot) = list.first_mut() {
                *slot = Some(parms);
            }
            Ok(list)
        }
        Some(PdfObject::Array(array)) => {
            let mut list: Vec<Option<&PdfDictionary>> =
                array.iter().map(|entry| entry.as_dict()).collect();
            list.resize(filter_count, None);
            Ok(list)
        }
        Some(other) => Err(FilterError::InvalidParams(format!(
            "/DecodeParms is {other:?}"
        ))),
    }
}

/// Apply one filter's decode transform.
pub fn decode(
    data: &[u8],
    filter: Filter,
    params: Option<&PdfDictionary>,
    ctx: &DecodeContext,
) -> Result<Vec<u8>, FilterError> {
    match filter {
        Filter::FlateDecode => {
            let decoded = flate_decode(data, ctx)?;
            predictor::undo(decoded, &predictor::PredictorParams::from_dict(params))
        }
        Filter::LZWDecode => {
            let parsed = predictor::PredictorParams::from_dict(params);
            let decoded = lzw::decode(data, parsed.early_change)?;
            predictor::undo(decoded, &parsed)
        }
        Filter::ASCII85Decode => ascii85_decode(data),
        Filter::ASCIIHexDecode => ascii_hex_decode(data),
        Filter::RunLengthDecode => run_length_decode(data),
        Filter::CCITTFaxDecode => ccitt::decode(data, params),
        Filter::JBIG2Decode | Filter::DCTDecode | Filter::JPXDecode => {
            Err(FilterError::ExternalCodec(filter.name().to_string()))
        }
        Filter::Crypt => {
            let name = params
                .and_then(|p| p.get("Name"))
                .and_then(|o| o.as_name())
                .map(|n| n.as_str())
                .unwrap_or("Identity");
            if name == "Identity" {
                Ok(data.to_vec())
            } else {
                Err(FilterError::Unsupported(format!(
                    "Crypt filter {name} must be applied by the security handler"
                )))
            }
        }
    }
}

/// Apply one lossless filter's encode transform, the inverse of
/// [`decode`].
pub fn encode(
    data: &[u8],
    filter: Filter,
    params: Option<&PdfDictionary>,
    ctx: &DecodeContext,
) -> Result<Vec<u8>, FilterError> {
    let parsed = predictor::PredictorParams::from_dict(params);
    if parsed.predictor > 1 {
        return Err(FilterError::Unsupported(
            "encoding with a predictor".to_string(),
        ));
    }
    match filter {
        Filter::FlateDecode => flate_encode(data, ctx),
        Filter::LZWDecode => Ok(lzw::encode(data, parsed.early_change)),
        Filter::ASCII85Decode => Ok(ascii85_encode(data)),
        Filter::ASCIIHexDecode => Ok(ascii_hex_encode(data)),
        Filter::RunLengthDecode => Ok(run_length_encode(data)),
        other => Err(FilterError::Unsupported(format!(
            "{} has no encoder",
            other.name()
        ))),
    }
}

#[cfg(feature = "compression")]
fn flate_decode(data: &[u8], ctx: &DecodeContext) -> Result<Vec<u8>, FilterError> {
    use flate2::{FlushDecompress, Status};

    let mut codec = ctx.pool().checkout_inflate()?;
    let mut output = Vec::with_capacity(data.len().saturating_mul(4).max(1024));
    let mut consumed = 0usize;

    loop {
        if output.capacity() == output.len() {
            output.reserve(32 * 1024);
        }
        let before_in = codec.total_in();
        let before_out = codec.total_out();
        let status = codec
            .decompress_vec(&data[consumed..], &mut output, FlushDecompress::Finish)
            .map_err(|e| FilterError::Corrupt(format!("inflate: {e}")))?;
        consumed += (codec.total_in() - before_in) as usize;

        match status {
            Status::StreamEnd => return Ok(output),
            Status::Ok | Status::BufError => {
                if codec.total_in() == before_in && codec.total_out() == before_out {
                    return Err(FilterError::Corrupt(
                        "truncated or stalled flate stream".to_string(),
                    ));
                }
            }
        }
    }
}

#[cfg(not(feature = "compression"))]
fn flate_decode(_data: &[u8], _ctx: &DecodeContext) -> Result<Vec<u8>, FilterError> {
    Err(FilterError::Unsupported(
        "FlateDecode requires the 'compression' feature".to_string(),
    ))
}

#[cfg(feature = "compression")]
fn flate_encode(data: &[u8], ctx: &DecodeContext) -> Result<Vec<u8>, FilterError> {
    use flate2::{FlushCompress, Status};

    let mut codec = ctx.pool().checkout_deflate()?;
    let mut output = Vec::with_capacity(data.len() / 2 + 64);
    let mut consumed = 0usize;

    loop {
        if output.capacity() == output.len() {
            output.reserve(16 * 1024);
        }
        let before_in = codec.total_in();
        let status = codec
            .compress_vec(&data[consumed..], &mut output, FlushCompress::Finish)
            .map_err(|e| FilterError::Corrupt(format!("deflate: {e}")))?;
        consumed += (codec.total_in() - before_in) as usize;

        if status == Status::StreamEnd {
            return Ok(output);
        }
    }
}

#[cfg(not(feature = "compression"))]
fn flate_encode(_data: &[u8], _ctx: &DecodeContext) -> Result<Vec<u8>, FilterError> {
    Err(FilterError::Unsupported(
        "FlateDecode requires the 'compression' feature".to_string(),
    ))
}

fn is_filter_whitespace(byte: u8) -> bool {
    matches!(byte, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// ASCIIHexDecode: hex digit pairs, whitespace ignored, `>` terminates.
/// An odd trailing digit assumes a zero low nibble.
fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut digits: Vec<u8> = Vec::with_capacity(data.len());
    for &byte in data {
        match byte {
            b'>' => break,
            byte if byte.is_ascii_hexdigit() => digits.push(byte),
            byte if is_filter_whitespace(byte) => {}
            other => {
                return Err(FilterError::Corrupt(format!(
                    "invalid hex digit 0x{other:02X}"
                )))
            }
        }
    }
    if digits.len() % 2 != 0 {
        digits.push(b'0');
    }

    Ok(digits
        .chunks(2)
        .map(|pair| hex_value(pair[0]) << 4 | hex_value(pair[1]))
        .collect())
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

fn ascii_hex_encode(data: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut output = Vec::with_capacity(data.len() * 2 + 1);
    for &byte in data {
        output.push(DIGITS[(byte >> 4) as usize]);
        output.push(DIGITS[(byte & 0x0F) as usize]);
    }
    output.push(b'>');
    output
}

/// ASCII85Decode: 5 printable bytes to 4 binary bytes, `z` for a zero
/// group, `~>` terminates. A partial trailing group is padded with `u`
/// and truncated to the bytes actually encoded.
fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut output = Vec::with_capacity(data.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut len = 0usize;

    let mut bytes = data.iter().filter(|b| !is_filter_whitespace(**b));
    while let Some(&byte) = bytes.next() {
        match byte {
            b'~' => {
                if bytes.next() != Some(&b'>') {
                    return Err(FilterError::Corrupt(
                        "ASCII85 '~' not followed by '>'".to_string(),
                    ));
                }
                break;
            }
            b'z' if len == 0 => output.extend_from_slice(&[0, 0, 0, 0]),
            b'z' => {
                return Err(FilterError::Corrupt(
                    "'z' inside an ASCII85 group".to_string(),
                ))
            }
            b'!'..=b'u' => {
                group[len] = byte - b'!';
                len += 1;
                if len == 5 {
                    output.extend_from_slice(&decode_base85_group(&group)?);
                    len = 0;
                }
            }
            other => {
                return Err(FilterError::Corrupt(format!(
                    "invalid ASCII85 byte 0x{other:02X}"
                )))
            }
        }
    }

    match len {
        0 => {}
        1 => {
            return Err(FilterError::Corrupt(
                "single trailing ASCII85 digit".to_string(),
            ))
        }
        _ => {
            // Pad with the maximum digit, then keep len-1 bytes.
            for slot in group.iter_mut().skip(len) {
                *slot = 84;
            }
            let bytes = decode_base85_group(&group)?;
            output.extend_from_slice(&bytes[..len - 1]);
        }
    }

    Ok(output)
}

fn decode_base85_group(digits: &[u8; 5]) -> Result<[u8; 4], FilterError> {
    let mut value = 0u64;
    for &digit in digits {
        value = value * 85 + u64::from(digit);
    }
    u32::try_from(value)
        .map(|v| v.to_be_bytes())
        .map_err(|_| FilterError::Corrupt("ASCII85 group overflows 32 bits".to_string()))
}

fn ascii85_encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() / 4 * 5 + 6);
    for chunk in data.chunks(4) {
        let mut padded = [0u8; 4];
        padded[..chunk.len()].copy_from_slice(chunk);
        let value = u32::from_be_bytes(padded);

        if chunk.len() == 4 && value == 0 {
            output.push(b'z');
            continue;
        }

        let mut digits = [0u8; 5];
        let mut rest = value;
        for slot in digits.iter_mut().rev() {
            *slot = (rest % 85) as u8 + b'!';
            rest /= 85;
        }
        output.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    output.extend_from_slice(b"~>");
    output
}

/// RunLengthDecode: control 0–127 copies n+1 literals, 129–255 repeats
/// the next byte 257−n times, 128 ends the data.
fn run_length_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut output = Vec::with_capacity(data.len() * 2);
    let mut index = 0usize;

    while index < data.len() {
        let control = data[index];
        index += 1;
        match control {
            128 => return Ok(output),
            0..=127 => {
                let count = control as usize + 1;
                if index + count > data.len() {
                    return Err(FilterError::Corrupt(
                        "run-length literal run past end of data".to_string(),
                    ));
                }
                output.extend_from_slice(&data[index..index + count]);
                index += count;
            }
            _ => {
                let count = 257 - control as usize;
                let byte = *data.get(index).ok_or_else(|| {
                    FilterError::Corrupt("run-length repeat run past end of data".to_string())
                })?;
                index += 1;
                output.resize(output.len() + count, byte);
            }
        }
    }

    tracing::debug!("run-length stream ended without EOD marker");
    Ok(output)
}

fn run_length_encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 128 + 2);
    let mut index = 0usize;

    while index < data.len() {
        let byte = data[index];
        let mut run = 1usize;
        while index + run < data.len() && data[index + run] == byte && run < 128 {
            run += 1;
        }

        if run >= 3 {
            output.push((257 - run) as u8);
            output.push(byte);
            index += run;
        } else {
            let start = index;
            let mut end = index;
            while end < data.len() && end - start < 128 {
                if end + 2 < data.len() && data[end] == data[end + 1] && data[end] == data[end + 2]
                {
                    break;
                }
                end += 1;
            }
            output.push((end - start - 1) as u8);
            output.extend_from_slice(&data[start..end]);
            index = end;
        }
    }

    output.push(128);
    output
}
