//! # ferropdf
//!
//! A pure Rust implementation of the low-level PDF ingestion pipeline:
//! the COS syntax parser, the standard-security decryption subsystem, and
//! the stream filter pipeline.
//!
//! ## Features
//!
//! - **COS Parsing**: byte-level lexer, indirect-reference resolution, and
//!   a recursive-descent object builder with damage recovery
//! - **Document Framing**: `N G obj … endobj`, trailer and `startxref`
//!   parsing, tail-scan repair for broken files
//! - **Decryption**: the standard security handler for V1–V4 / R2–R4,
//!   RC4 and AES-128, applied transparently while parsing
//! - **Stream Filters**: Flate, LZW, ASCII85, ASCIIHex, RunLength, with
//!   TIFF and PNG row predictors, composed per `/Filter` chain
//! - **Diagnostics**: two-severity fault routing through a pluggable
//!   handler, so malformed-but-recoverable documents still load
//!
//! The cross-reference table structure, the page/content model, and file
//! I/O are external collaborators: callers supply object offsets through
//! [`parser::ObjectLocator`] and drive the parser over any
//! `Read + Seek` source.
//!
//! ## Quick Start
//!
//! ### Parsing objects
//!
//! ```rust
//! use ferropdf::parser::{DocumentParser, ParseOptions};
//! use std::io::Cursor;
//!
//! # fn main() -> ferropdf::Result<()> {
//! let data = b"%PDF-1.7\n7 0 obj << /Kind /Example /Next 12 0 R >> endobj";
//! let mut parser = DocumentParser::new(Cursor::new(data.to_vec()), ParseOptions::default())?;
//!
//! let header = parser.parse_header()?;
//! assert_eq!(header.to_string(), "%PDF-1.7");
//!
//! let (id, object) = parser.parse_indirect_object()?;
//! assert_eq!(id.number(), 7);
//! let dict = object.as_dict().unwrap();
//! assert_eq!(dict.get("Kind").unwrap().as_name().unwrap().as_str(), "Example");
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoding stream data
//!
//! ```rust
//! use ferropdf::parser::filters::{decode, DecodeContext, Filter};
//!
//! # fn main() -> ferropdf::Result<()> {
//! let ctx = DecodeContext::new();
//! let decoded = decode(b"48656C6C6F>", Filter::ASCIIHexDecode, None, &ctx)?;
//! assert_eq!(decoded, b"Hello");
//! # Ok(())
//! # }
//! ```

pub mod encryption;
pub mod error;
pub mod parser;
#[cfg(feature = "compression")]
pub mod pool;

pub use error::{PdfError, Result};
