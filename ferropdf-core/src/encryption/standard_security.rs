//! Standard Security Handler
//!
//! Password-based encryption per ISO 32000-1 Section 7.6.3: revision
//! dispatch, user and owner authentication, file key derivation, and the
//! per-object cipher reseeding. The derivation steps are shared free
//! functions so the same maths backs reading, writing, and the reverse
//! owner-password path.

#![allow(clippy::needless_range_loop)]

use super::aes;
use super::crypt_filters::{CipherKind, CryptFilterSet};
use super::encryption_dict::{CryptFilterDecl, CryptFilterMethod, EncryptionDictionary};
use super::permissions::Permissions;
use super::rc4::rc4_apply;
use super::EncryptionError;
use crate::parser::objects::ObjectId;
use std::collections::HashMap;

/// Padding constant for password preparation (Algorithm 2 step a).
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Standard security handler revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub enum SecurityRevision {
    /// RC4, 40-bit keys.
    R2 = 2,
    /// RC4, up to 128-bit keys, strengthened derivation.
    R3 = 3,
    /// Like R3 plus crypt filters and the EncryptMetadata switch.
    R4 = 4,
}

/// Supplies password candidates when the built-in attempts fail.
pub trait PasswordProvider {
    /// Called once per attempt, starting at zero. `None` stops early.
    fn request_password(&mut self, attempt: u32) -> Option<String>;
}

/// Password-based security handler for revisions 2–4.
///
/// Lifecycle: built from the `/Encrypt` dictionary (initialized), then
/// [`authenticate`](Self::authenticate) derives the file key. Only an
/// authenticated handler decrypts. One mutable instance serializes all
/// cipher work for its document.
pub struct StandardSecurityHandler {
    dict: EncryptionDictionary,
    revision: SecurityRevision,
    key_length: usize,
    file_id: Option<Vec<u8>>,
    filters: CryptFilterSet,
    file_key: Option<Vec<u8>>,
    permissions: Permissions,
    /// Open composite objects that must not be decrypted.
    context_depth: usize,
}

impl StandardSecurityHandler {
    /// Dispatch a concrete handler from the encryption dictionary.
    pub fn from_dict(
        dict: EncryptionDictionary,
        file_id: Option<Vec<u8>>,
    ) -> Result<Self, EncryptionError> {
        let revision = match (dict.v, dict.r) {
            (1, 2) => SecurityRevision::R2,
            (1..=2, 3) => SecurityRevision::R3,
            (4, 4) => SecurityRevision::R4,
            (v, r) => return Err(EncryptionError::UnsupportedRevision { v, r }),
        };

        let key_length = match revision {
            SecurityRevision::R2 => 5,
            _ => {
                let bits = dict.length_bits.unwrap_or(128);
                if bits % 8 != 0 || !(40..=128).contains(&bits) {
                    return Err(EncryptionError::InvalidDictionary(format!(
                        "key length of {bits} bits"
                    )));
                }
                (bits / 8) as usize
            }
        };

        let filters = CryptFilterSet::from_dict(&dict);
        let permissions = Permissions::from_p(dict.p);

        Ok(Self {
            dict,
            revision,
            key_length,
            file_id,
            filters,
            file_key: None,
            permissions,
            context_depth: 0,
        })
    }

    pub fn revision(&self) -> SecurityRevision {
        self.revision
    }

    /// Key length in bytes.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn is_authenticated(&self) -> bool {
        self.file_key.is_some()
    }

    /// Permissions resolved from `/P`; meaningful after authentication.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Suppress decryption while `/Encrypt`, `/ID`, or a cross-reference
    /// stream is open.
    pub fn push_context_object(&mut self) {
        self.context_depth += 1;
    }

    pub fn pop_context_object(&mut self) {
        self.context_depth = self.context_depth.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.context_depth > 0
    }

    /// Authenticate: empty password first, then the caller-supplied one,
    /// then the provider under a bounded retry budget. Exhaustion is
    /// fatal.
    pub fn authenticate(
        &mut self,
        password: Option<&str>,
        provider: Option<&mut dyn PasswordProvider>,
        max_attempts: u32,
    ) -> Result<(), EncryptionError> {
        if self.try_password("") {
            return Ok(());
        }
        if let Some(password) = password {
            if self.try_password(password) {
                return Ok(());
            }
        }
        if let Some(provider) = provider {
            for attempt in 0..max_attempts {
                match provider.request_password(attempt) {
                    Some(candidate) => {
                        if self.try_password(&candidate) {
                            return Ok(());
                        }
                    }
                    None => break,
                }
            }
        }
        Err(EncryptionError::PasswordRequired)
    }

    /// Try one password as user, then as owner. On success the file key
    /// is cached for the lifetime of the handler.
    pub fn try_password(&mut self, password: &str) -> bool {
        let padded = pad_password(password.as_bytes());

        if let Some(key) = self.authenticate_user_padded(&padded) {
            self.file_key = Some(key);
            return true;
        }

        // Owner path: run the derivation in reverse to recover the padded
        // user password, then validate that.
        let candidate = recover_user_password(
            self.revision,
            self.key_length,
            &padded,
            &self.dict.o,
        );
        let candidate_padded: [u8; 32] = match candidate.len() {
            32 => candidate.try_into().expect("length checked"),
            _ => pad_password(&candidate),
        };
        if let Some(key) = self.authenticate_user_padded(&candidate_padded) {
            self.file_key = Some(key);
            return true;
        }
        false
    }

    /// Validate a padded user password; returns the file key on success.
    fn authenticate_user_padded(&self, padded: &[u8; 32]) -> Option<Vec<u8>> {
        let key = derive_file_key(
            self.revision,
            self.key_length,
            padded,
            &self.dict.o,
            self.dict.p,
            self.file_id.as_deref(),
            self.dict.encrypt_metadata,
        );
        let expected = compute_user_entry(self.revision, &key, self.file_id.as_deref());

        // R3+ only defines the first 16 bytes of U; the rest is padding.
        let significant = match self.revision {
            SecurityRevision::R2 => 32,
            _ => 16,
        };
        if self.dict.u.len() >= significant && expected[..significant] == self.dict.u[..significant]
        {
            Some(key)
        } else {
            None
        }
    }

    /// The per-object key: the master key reseeded with the object
    /// identity (Algorithm 1).
    pub fn object_key(&self, id: ObjectId, aes: bool) -> Result<Vec<u8>, EncryptionError> {
        let master = self
            .file_key
            .as_ref()
            .ok_or(EncryptionError::NotAuthenticated)?;

        let mut input = master.clone();
        input.extend_from_slice(&id.number().to_le_bytes()[..3]);
        input.extend_from_slice(&id.generation().to_le_bytes()[..2]);
        if aes {
            input.extend_from_slice(b"sAlT");
        }

        let digest = md5::compute(&input).0;
        let len = (master.len() + 5).min(16);
        Ok(digest[..len].to_vec())
    }

    fn string_cipher(&mut self) -> Result<CipherKind, EncryptionError> {
        match self.revision {
            SecurityRevision::R4 => self.filters.string_cipher(),
            _ => Ok(CipherKind::Rc4),
        }
    }

    fn stream_cipher(&mut self) -> Result<CipherKind, EncryptionError> {
        match self.revision {
            SecurityRevision::R4 => self.filters.stream_cipher(),
            _ => Ok(CipherKind::Rc4),
        }
    }

    fn apply_cipher(
        &mut self,
        kind: CipherKind,
        data: &[u8],
        id: ObjectId,
        encrypt: bool,
    ) -> Result<Vec<u8>, EncryptionError> {
        match kind {
            CipherKind::Identity => Ok(data.to_vec()),
            CipherKind::Rc4 => {
                let key = self.object_key(id, false)?;
                Ok(rc4_apply(&key, data))
            }
            CipherKind::Aes128 => {
                let key = self.object_key(id, true)?;
                if encrypt {
                    aes::encrypt_cbc(&key, data)
                } else {
                    aes::decrypt_cbc(&key, data)
                }
            }
        }
    }

    /// Decrypt a string belonging to the given object.
    pub fn decrypt_string(
        &mut self,
        data: &[u8],
        id: ObjectId,
    ) -> Result<Vec<u8>, EncryptionError> {
        let kind = self.string_cipher()?;
        self.apply_cipher(kind, data, id, false)
    }

    /// Encrypt a string belonging to the given object.
    pub fn encrypt_string(
        &mut self,
        data: &[u8],
        id: ObjectId,
    ) -> Result<Vec<u8>, EncryptionError> {
        let kind = self.string_cipher()?;
        self.apply_cipher(kind, data, id, true)
    }

    /// Decrypt stream bytes belonging to the given object.
    pub fn decrypt_stream(
        &mut self,
        data: &[u8],
        id: ObjectId,
    ) -> Result<Vec<u8>, EncryptionError> {
        let kind = self.stream_cipher()?;
        self.apply_cipher(kind, data, id, false)
    }

    /// Encrypt stream bytes belonging to the given object.
    pub fn encrypt_stream(
        &mut self,
        data: &[u8],
        id: ObjectId,
    ) -> Result<Vec<u8>, EncryptionError> {
        let kind = self.stream_cipher()?;
        self.apply_cipher(kind, data, id, true)
    }

    /// Decrypt an embedded-file stream (`/EFF` filter).
    pub fn decrypt_embedded_file(
        &mut self,
        data: &[u8],
        id: ObjectId,
    ) -> Result<Vec<u8>, EncryptionError> {
        let kind = match self.revision {
            SecurityRevision::R4 => self.filters.embedded_cipher()?,
            _ => CipherKind::Rc4,
        };
        self.apply_cipher(kind, data, id, false)
    }

    /// Build the dictionary and an authenticated handler for writing a new
    /// document encrypted under the given passwords.
    ///
    /// R2 produces V1/40-bit, R3 produces V2/128-bit, R4 produces V4 with
    /// an `AESV2` StdCF filter for both streams and strings.
    pub fn for_new_document(
        revision: SecurityRevision,
        permissions: Permissions,
        owner_password: &str,
        user_password: &str,
        file_id: Option<Vec<u8>>,
    ) -> Result<(EncryptionDictionary, Self), EncryptionError> {
        let key_length = match revision {
            SecurityRevision::R2 => 5,
            _ => 16,
        };
        let p = permissions.as_p();

        let owner_padded = if owner_password.is_empty() {
            pad_password(user_password.as_bytes())
        } else {
            pad_password(owner_password.as_bytes())
        };
        let user_padded = pad_password(user_password.as_bytes());

        let o = compute_owner_entry(revision, key_length, &owner_padded, &user_padded);
        let encrypt_metadata = true;
        let file_key = derive_file_key(
            revision,
            key_length,
            &user_padded,
            &o,
            p,
            file_id.as_deref(),
            encrypt_metadata,
        );
        let u = compute_user_entry(revision, &file_key, file_id.as_deref());

        let (v, length_bits, crypt_filters, stream_filter, string_filter) = match revision {
            SecurityRevision::R2 => (1, None, HashMap::new(), "Identity", "Identity"),
            SecurityRevision::R3 => (2, Some(128), HashMap::new(), "Identity", "Identity"),
            SecurityRevision::R4 => {
                let mut filters = HashMap::new();
                filters.insert(
                    "StdCF".to_string(),
                    CryptFilterDecl {
                        method: CryptFilterMethod::Aesv2,
                        length: Some(16),
                    },
                );
                (4, Some(128), filters, "StdCF", "StdCF")
            }
        };

        let dict = EncryptionDictionary {
            filter: "Standard".to_string(),
            sub_filter: None,
            v,
            r: revision as i32,
            o,
            u,
            p,
            length_bits,
            encrypt_metadata,
            crypt_filters,
            stream_filter: stream_filter.to_string(),
            string_filter: string_filter.to_string(),
            embedded_filter: "Identity".to_string(),
        };

        let filters = CryptFilterSet::from_dict(&dict);
        let handler = Self {
            dict: dict.clone(),
            revision,
            key_length,
            file_id,
            filters,
            file_key: Some(file_key),
            permissions,
            context_depth: 0,
        };
        Ok((dict, handler))
    }
}

/// Pad or truncate a password to exactly 32 bytes (Algorithm 2 step a).
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    if len < 32 {
        padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    }
    padded
}

/// Derive the file encryption key from a padded user password
/// (Algorithm 2).
fn derive_file_key(
    revision: SecurityRevision,
    key_length: usize,
    user_padded: &[u8; 32],
    o: &[u8],
    p: i32,
    file_id: Option<&[u8]>,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut input = Vec::with_capacity(32 + o.len() + 4 + 36);
    input.extend_from_slice(user_padded);
    input.extend_from_slice(o);
    input.extend_from_slice(&(p as u32).to_le_bytes());
    if let Some(id) = file_id {
        input.extend_from_slice(id);
    }
    if revision == SecurityRevision::R4 && !encrypt_metadata {
        input.extend_from_slice(&[0xFF; 4]);
    }

    let mut hash = md5::compute(&input).0.to_vec();
    if revision >= SecurityRevision::R3 {
        // Re-hash the first key_length bytes fifty times.
        for _ in 0..50 {
            hash = md5::compute(&hash[..key_length]).0.to_vec();
        }
    }

    hash.truncate(key_length);
    hash
}

/// The RC4 key protecting the O entry (Algorithm 3 steps a–d).
fn owner_rc4_key(revision: SecurityRevision, key_length: usize, owner_padded: &[u8; 32]) -> Vec<u8> {
    let mut hash = md5::compute(owner_padded).0.to_vec();
    if revision >= SecurityRevision::R3 {
        for _ in 0..50 {
            hash = md5::compute(&hash).0.to_vec();
        }
    }
    hash.truncate(key_length);
    hash
}

/// Compute the O entry (Algorithm 3).
fn compute_owner_entry(
    revision: SecurityRevision,
    key_length: usize,
    owner_padded: &[u8; 32],
    user_padded: &[u8; 32],
) -> Vec<u8> {
    let key = owner_rc4_key(revision, key_length, owner_padded);
    let mut value = rc4_apply(&key, user_padded);
    if revision >= SecurityRevision::R3 {
        for round in 1..=19u8 {
            value = rc4_apply(&xor_key(&key, round), &value);
        }
    }
    value
}

/// Decrypt the O entry with a candidate owner password, recovering the
/// padded user password (Algorithm 7).
fn recover_user_password(
    revision: SecurityRevision,
    key_length: usize,
    owner_padded: &[u8; 32],
    o: &[u8],
) -> Vec<u8> {
    let key = owner_rc4_key(revision, key_length, owner_padded);
    let mut value = o.to_vec();
    match revision {
        SecurityRevision::R2 => value = rc4_apply(&key, &value),
        _ => {
            // Undo the nineteen extra rounds in reverse, then the base
            // pass (round key 0 is the key itself).
            for round in (0..=19u8).rev() {
                value = rc4_apply(&xor_key(&key, round), &value);
            }
        }
    }
    value
}

/// Compute the U entry from the file key (Algorithms 4 and 5).
fn compute_user_entry(
    revision: SecurityRevision,
    file_key: &[u8],
    file_id: Option<&[u8]>,
) -> Vec<u8> {
    match revision {
        SecurityRevision::R2 => rc4_apply(file_key, &PASSWORD_PADDING),
        _ => {
            let mut input = PASSWORD_PADDING.to_vec();
            if let Some(id) = file_id {
                input.extend_from_slice(id);
            }
            let digest = md5::compute(&input).0;
            let mut value = rc4_apply(file_key, &digest);
            for round in 1..=19u8 {
                value = rc4_apply(&xor_key(file_key, round), &value);
            }
            value.resize(32, 0);
            value
        }
    }
}

/// Every key byte XOR-ed with the round index.
fn xor_key(key: &[u8], round: u8) -> Vec<u8> {
    key.iter().map(|byte| byte ^ round).collect()
}
