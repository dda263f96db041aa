//! Filter pipeline tests through the parsed-document surface: chains are
//! declared in stream dictionaries and decoding happens lazily, after the
//! document has loaded.

use ferropdf::parser::filters::{decode_stream, encode, DecodeContext, Filter, FilterError};
use ferropdf::parser::{DocumentParser, ParseOptions};
use std::io::Cursor;

fn parse_stream(text: &[u8]) -> ferropdf::parser::PdfStream {
    let mut parser =
        DocumentParser::new(Cursor::new(text.to_vec()), ParseOptions::default()).unwrap();
    let (_, object) = parser.parse_indirect_object().unwrap();
    object.as_stream().unwrap().clone()
}

#[cfg(feature = "compression")]
#[test]
fn test_chain_composed_left_to_right() {
    // Data encoded Flate-then-ASCII85 is declared [/ASCII85Decode
    // /FlateDecode]: the first name undoes the outermost encoding.
    let ctx = DecodeContext::new();
    let plaintext = b"stream content stream content stream content";
    let flated = encode(plaintext, Filter::FlateDecode, None, &ctx).unwrap();
    let wrapped = encode(&flated, Filter::ASCII85Decode, None, &ctx).unwrap();

    let mut text = format!(
        "1 0 obj << /Length {} /Filter [/ASCII85Decode /FlateDecode] >>\nstream\n",
        wrapped.len()
    )
    .into_bytes();
    text.extend_from_slice(&wrapped);
    text.extend_from_slice(b"\nendstream endobj");

    let stream = parse_stream(&text);
    assert_eq!(stream.decode(&ctx).unwrap(), plaintext);
}

#[test]
fn test_abbreviated_names_in_chain() {
    let ctx = DecodeContext::new();
    let plaintext = b"aaaaaaaaaaaaabcd";
    let packed = encode(plaintext, Filter::RunLengthDecode, None, &ctx).unwrap();
    let hexed = encode(&packed, Filter::ASCIIHexDecode, None, &ctx).unwrap();

    let mut text = format!(
        "1 0 obj << /Length {} /Filter [/AHx /RL] >>\nstream\n",
        hexed.len()
    )
    .into_bytes();
    text.extend_from_slice(&hexed);
    text.extend_from_slice(b"\nendstream endobj");

    let stream = parse_stream(&text);
    assert_eq!(stream.decode(&ctx).unwrap(), plaintext);
}

#[cfg(feature = "compression")]
#[test]
fn test_decode_parms_array_aligns_with_chain() {
    // PNG Up predictor behind Flate, with the parameter slot for the
    // ASCII85 stage left null.
    let ctx = DecodeContext::new();
    let predicted: &[u8] = &[2, 10, 20, 30, 2, 1, 2, 3];
    let flated = encode(predicted, Filter::FlateDecode, None, &ctx).unwrap();
    let wrapped = encode(&flated, Filter::ASCII85Decode, None, &ctx).unwrap();

    let mut text = format!(
        "1 0 obj << /Length {} /Filter [/ASCII85Decode /FlateDecode] \
         /DecodeParms [null << /Predictor 12 /Columns 3 >>] >>\nstream\n",
        wrapped.len()
    )
    .into_bytes();
    text.extend_from_slice(&wrapped);
    text.extend_from_slice(b"\nendstream endobj");

    let stream = parse_stream(&text);
    assert_eq!(stream.decode(&ctx).unwrap(), vec![10, 20, 30, 11, 22, 33]);
}

#[test]
fn test_unknown_filter_surfaces_at_decode_not_load() {
    // The document loads; only the decode access fails.
    let text = b"1 0 obj << /Length 4 /Filter /MadeUpDecode >>\nstream\nabcd\nendstream endobj";
    let stream = parse_stream(text);
    assert_eq!(stream.raw_data(), b"abcd");

    assert!(matches!(
        decode_stream(stream.raw_data(), &stream.dict, &DecodeContext::new()),
        Err(FilterError::UnknownFilter(_))
    ));
}

#[cfg(feature = "compression")]
#[test]
fn test_corrupt_flate_surfaces_at_decode_not_load() {
    let text =
        b"1 0 obj << /Length 12 /Filter /FlateDecode >>\nstream\nnot deflated\nendstream endobj";
    let stream = parse_stream(text);

    assert!(matches!(
        stream.decode(&DecodeContext::new()),
        Err(ferropdf::parser::ParseError::Filter(FilterError::Corrupt(_)))
    ));
}

#[test]
fn test_external_codec_filters_are_delegated() {
    let text = b"1 0 obj << /Length 3 /Filter /DCTDecode >>\nstream\n\xFF\xD8\xFF\nendstream endobj";
    let stream = parse_stream(text);

    assert!(matches!(
        decode_stream(stream.raw_data(), &stream.dict, &DecodeContext::new()),
        Err(FilterError::ExternalCodec(name)) if name == "DCTDecode"
    ));
}

#[cfg(feature = "compression")]
#[test]
fn test_shared_pool_across_decodes() {
    use ferropdf::pool::CodecPool;
    use std::sync::Arc;
    use std::time::Duration;

    let pool = Arc::new(CodecPool::new(1, Duration::from_millis(100)));
    let ctx = DecodeContext::with_pool(pool);

    let plaintext = b"pooled codec reuse";
    for _ in 0..5 {
        let encoded = encode(plaintext, Filter::FlateDecode, None, &ctx).unwrap();
        let decoded =
            ferropdf::parser::filters::decode(&encoded, Filter::FlateDecode, None, &ctx).unwrap();
        assert_eq!(decoded, plaintext);
    }
}

#[test]
fn test_inert_ccitt_emits_blank_raster() {
    let text = b"1 0 obj << /Length 4 /Filter /CCITTFaxDecode \
        /DecodeParms << /K -1 /Columns 24 /Rows 8 >> >>\nstream\n\x01\x02\x03\x04\nendstream endobj";
    let stream = parse_stream(text);

    let decoded = stream.decode(&DecodeContext::new()).unwrap();
    assert_eq!(decoded.len(), 3 * 8);
    assert!(decoded.iter().all(|&b| b == 0));
}
