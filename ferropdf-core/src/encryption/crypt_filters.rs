//! Named crypt filters (V4)
//!
//! V4 encryption selects ciphers indirectly: the `/CF` dictionary declares
//! named filters, and `/StmF`, `/StrF`, `/EFF` pick the defaults for
//! streams, strings, and embedded files. Filters resolve lazily on first
//! use and stay cached — a live filter is never reconfigured; the handler
//! would have to be rebuilt instead.

use super::encryption_dict::{CryptFilterDecl, CryptFilterMethod, EncryptionDictionary};
use super::EncryptionError;
use std::collections::HashMap;

/// The cipher a resolved crypt filter applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    /// Pass-through.
    Identity,
    /// RC4 with the per-object key.
    Rc4,
    /// AES-128-CBC with the per-object key and a payload IV.
    Aes128,
}

/// The document's crypt filter declarations plus the resolution cache.
#[derive(Debug, Default)]
pub struct CryptFilterSet {
    declarations: HashMap<String, CryptFilterDecl>,
    resolved: HashMap<String, CipherKind>,
    stream_filter: String,
    string_filter: String,
    embedded_filter: String,
}

impl CryptFilterSet {
    pub fn from_dict(dict: &EncryptionDictionary) -> Self {
        Self {
            declarations: dict.crypt_filters.clone(),
            resolved: HashMap::new(),
            stream_filter: dict.stream_filter.clone(),
            string_filter: dict.string_filter.clone(),
            embedded_filter: dict.embedded_filter.clone(),
        }
    }

    /// Resolve a filter by name, caching the result. `Identity` is always
    /// available without a declaration.
    pub fn resolve(&mut self, name: &str) -> Result<CipherKind, EncryptionError> {
        if let Some(kind) = self.resolved.get(name) {
            return Ok(*kind);
        }

        let kind = if name == "Identity" {
            CipherKind::Identity
        } else {
            match self.declarations.get(name) {
                Some(decl) => match decl.method {
                    CryptFilterMethod::None => CipherKind::Identity,
                    CryptFilterMethod::V2 => CipherKind::Rc4,
                    CryptFilterMethod::Aesv2 => CipherKind::Aes128,
                },
                None => return Err(EncryptionError::UnknownCryptFilter(name.to_string())),
            }
        };

        self.resolved.insert(name.to_string(), kind);
        Ok(kind)
    }

    /// Cipher for stream payloads (`/StmF`).
    pub fn stream_cipher(&mut self) -> Result<CipherKind, EncryptionError> {
        let name = self.stream_filter.clone();
        self.resolve(&name)
    }

    /// Cipher for strings (`/StrF`).
    pub fn string_cipher(&mut self) -> Result<CipherKind, EncryptionError> {
        let name = self.string_filter.clone();
        self.resolve(&name)
    }

    /// Cipher for embedded file streams (`/EFF`).
    pub fn embedded_cipher(&mut self) -> Result<CipherKind, EncryptionError> {
        let name = self.embedded_filter.clone();
        self.resolve(&name)
    }
}
