//! PDF encryption support according to ISO 32000-1 Section 7.6
//!
//! The standard (password-based) security handler for encryption versions
//! V1–V4, revisions 2–4: RC4 and AES-128 ciphers, bit-exact key
//! derivation, owner and user authentication, and the V4 named crypt
//! filter machinery. The parser drives this module transparently — every
//! string and stream is decrypted as it is built.

pub mod aes;
mod crypt_filters;
mod encryption_dict;
mod permissions;
pub mod rc4;
mod standard_security;

pub use crypt_filters::{CipherKind, CryptFilterSet};
pub use encryption_dict::{CryptFilterDecl, CryptFilterMethod, EncryptionDictionary};
pub use permissions::Permissions;
pub use rc4::{rc4_apply, Rc4};
pub use standard_security::{
    pad_password, PasswordProvider, SecurityRevision, StandardSecurityHandler, PASSWORD_PADDING,
};

/// Security subsystem failures — a category distinct from syntax errors.
///
/// Bad passwords, unsupported versions, and decrypt-without-handler are
/// checked conditions a caller can react to; per-object decrypt failures
/// degrade to parse warnings instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("unsupported security handler: {0}")]
    UnsupportedFilter(String),

    #[error("unsupported encryption version V {v} revision {r}")]
    UnsupportedRevision { v: i32, r: i32 },

    #[error("invalid encryption dictionary: {0}")]
    InvalidDictionary(String),

    #[error("missing encryption dictionary key: {0}")]
    MissingKey(String),

    #[error("password required: every candidate was rejected")]
    PasswordRequired,

    #[error("no authenticated encryption key available")]
    NotAuthenticated,

    #[error("unknown crypt filter: {0}")]
    UnknownCryptFilter(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("malformed encrypted data: {0}")]
    MalformedData(String),

    #[error("decryption failed: {0}")]
    DecryptFailed(String),
}
