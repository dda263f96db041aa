//! The `/Encrypt` dictionary
//!
//! Typed view of the encryption dictionary (ISO 32000-1 Table 20/21):
//! handler filter, algorithm version and revision, the O/U password
//! hashes, the permission bits, and the V4 crypt filter declarations.

use super::EncryptionError;
use crate::parser::objects::{PdfDictionary, PdfObject};
use std::collections::HashMap;

/// `/CFM` value of a crypt filter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptFilterMethod {
    /// No encryption.
    None,
    /// RC4 with the file key.
    V2,
    /// AES-128-CBC with a per-payload IV.
    Aesv2,
}

impl CryptFilterMethod {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            CryptFilterMethod::None => "None",
            CryptFilterMethod::V2 => "V2",
            CryptFilterMethod::Aesv2 => "AESV2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(CryptFilterMethod::None),
            "V2" => Some(CryptFilterMethod::V2),
            "AESV2" => Some(CryptFilterMethod::Aesv2),
            _ => None,
        }
    }
}

/// One `/CF` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CryptFilterDecl {
    pub method: CryptFilterMethod,
    /// Key length in bytes, when declared.
    pub length: Option<u32>,
}

/// Typed `/Encrypt` dictionary.
#[derive(Debug, Clone)]
pub struct EncryptionDictionary {
    /// Security handler name; only `Standard` is supported.
    pub filter: String,
    pub sub_filter: Option<String>,
    /// Algorithm version (`/V`).
    pub v: i32,
    /// Standard handler revision (`/R`).
    pub r: i32,
    /// Owner password hash.
    pub o: Vec<u8>,
    /// User password hash.
    pub u: Vec<u8>,
    /// Raw permission bits.
    pub p: i32,
    /// Key length in bits (`/Length`), when declared.
    pub length_bits: Option<i32>,
    /// Whether document metadata is encrypted (V4).
    pub encrypt_metadata: bool,
    /// Named crypt filter declarations (V4).
    pub crypt_filters: HashMap<String, CryptFilterDecl>,
    /// Default crypt filter for streams (V4).
    pub stream_filter: String,
    /// Default crypt filter for strings (V4).
    pub string_filter: String,
    /// Default crypt filter for embedded files (V4).
    pub embedded_filter: String,
}

impl EncryptionDictionary {
    /// Extract the typed dictionary from parsed COS objects.
    pub fn from_pdf_dict(dict: &PdfDictionary) -> Result<Self, EncryptionError> {
        let filter = dict
            .get("Filter")
            .and_then(|o| o.as_name())
            .map(|n| n.as_str().to_string())
            .ok_or_else(|| EncryptionError::MissingKey("Filter".to_string()))?;
        if filter != "Standard" {
            return Err(EncryptionError::UnsupportedFilter(filter));
        }

        let sub_filter = dict
            .get("SubFilter")
            .and_then(|o| o.as_name())
            .map(|n| n.as_str().to_string());

        let v = dict.get("V").and_then(|o| o.as_integer()).unwrap_or(0) as i32;
        let r = dict
            .get("R")
            .and_then(|o| o.as_integer())
            .ok_or_else(|| EncryptionError::MissingKey("R".to_string()))? as i32;

        let o = dict
            .get("O")
            .and_then(|o| o.as_string())
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| EncryptionError::MissingKey("O".to_string()))?;
        let u = dict
            .get("U")
            .and_then(|o| o.as_string())
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| EncryptionError::MissingKey("U".to_string()))?;

        let p = dict
            .get("P")
            .and_then(|o| o.as_integer())
            .ok_or_else(|| EncryptionError::MissingKey("P".to_string()))? as i32;

        let length_bits = dict
            .get("Length")
            .and_then(|o| o.as_integer())
            .map(|n| n as i32);

        let encrypt_metadata = dict
            .get("EncryptMetadata")
            .and_then(|o| o.as_bool())
            .unwrap_or(true);

        let mut crypt_filters = HashMap::new();
        if let Some(PdfObject::Dictionary(cf)) = dict.get("CF") {
            for (name, value) in &cf.0 {
                let decl_dict = match value.as_dict() {
                    Some(d) => d,
                    None => continue,
                };
                let method = decl_dict
                    .get("CFM")
                    .and_then(|o| o.as_name())
                    .and_then(|n| CryptFilterMethod::from_name(n.as_str()))
                    .ok_or_else(|| {
                        EncryptionError::InvalidDictionary(format!(
                            "crypt filter {} has no usable /CFM",
                            name.as_str()
                        ))
                    })?;
                let length = decl_dict
                    .get("Length")
                    .and_then(|o| o.as_integer())
                    .map(|n| n as u32);
                crypt_filters.insert(name.as_str().to_string(), CryptFilterDecl { method, length });
            }
        }

        let filter_name = |key: &str| {
            dict.get(key)
                .and_then(|o| o.as_name())
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| "Identity".to_string())
        };

        Ok(Self {
            filter,
            sub_filter,
            v,
            r,
            o,
            u,
            p,
            length_bits,
            encrypt_metadata,
            crypt_filters,
            stream_filter: filter_name("StmF"),
            string_filter: filter_name("StrF"),
            embedded_filter: filter_name("EFF"),
        })
    }
}
