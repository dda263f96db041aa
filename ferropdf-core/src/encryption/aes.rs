//! AES-128-CBC for `AESV2` crypt filters
//!
//! Every encrypted payload carries its own random 16-byte IV as a prefix,
//! so identical plaintext never produces identical ciphertext. Padding is
//! PKCS#7 per ISO 32000-1 Section 7.6.2.

use super::EncryptionError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block and IV size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;
/// AES-128 key size in bytes.
pub const AES_KEY_SIZE: usize = 16;

fn check_key(key: &[u8]) -> Result<(), EncryptionError> {
    if key.len() != AES_KEY_SIZE {
        return Err(EncryptionError::InvalidKeyLength {
            expected: AES_KEY_SIZE,
            actual: key.len(),
        });
    }
    Ok(())
}

fn generate_iv() -> [u8; AES_BLOCK_SIZE] {
    let mut iv = [0u8; AES_BLOCK_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Encrypt with a fresh IV; the IV is returned as the ciphertext prefix.
pub fn encrypt_cbc(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    check_key(key)?;
    let iv = generate_iv();
    let cipher = Aes128CbcEnc::new_from_slices(key, &iv)
        .expect("key and IV lengths already validated");

    let mut output = Vec::with_capacity(AES_BLOCK_SIZE + plaintext.len() + AES_BLOCK_SIZE);
    output.extend_from_slice(&iv);
    output.extend(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext));
    Ok(output)
}

/// Decrypt data whose first 16 bytes are the IV.
pub fn decrypt_cbc(key: &[u8], data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    check_key(key)?;
    if data.len() < AES_BLOCK_SIZE {
        return Err(EncryptionError::MalformedData(format!(
            "AES payload of {} bytes is shorter than the IV",
            data.len()
        )));
    }

    let (iv, ciphertext) = data.split_at(AES_BLOCK_SIZE);
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    if ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(EncryptionError::MalformedData(format!(
            "AES ciphertext of {} bytes is not block aligned",
            ciphertext.len()
        )));
    }

    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .expect("key and IV lengths already validated");
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed("bad PKCS#7 padding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F,
    ];

    #[test]
    fn test_round_trip() {
        let plaintext = b"The quick brown fox jumps over the lazy dog";
        let ciphertext = encrypt_cbc(&KEY, plaintext).unwrap();
        assert!(ciphertext.len() >= AES_BLOCK_SIZE + plaintext.len());
        let decrypted = decrypt_cbc(&KEY, &ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_round_trip_empty() {
        let ciphertext = encrypt_cbc(&KEY, b"").unwrap();
        // IV plus one full padding block.
        assert_eq!(ciphertext.len(), 2 * AES_BLOCK_SIZE);
        assert_eq!(decrypt_cbc(&KEY, &ciphertext).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let plaintext = b"same plaintext";
        let a = encrypt_cbc(&KEY, plaintext).unwrap();
        let b = encrypt_cbc(&KEY, plaintext).unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt_cbc(&KEY, &a).unwrap(), decrypt_cbc(&KEY, &b).unwrap());
    }

    #[test]
    fn test_wrong_key_length() {
        assert!(matches!(
            encrypt_cbc(&[0u8; 5], b"x"),
            Err(EncryptionError::InvalidKeyLength { .. })
        ));
        assert!(matches!(
            decrypt_cbc(&[0u8; 32], &[0u8; 32]),
            Err(EncryptionError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_data_shorter_than_iv() {
        assert!(matches!(
            decrypt_cbc(&KEY, &[0u8; 10]),
            Err(EncryptionError::MalformedData(_))
        ));
    }

    #[test]
    fn test_unaligned_ciphertext() {
        assert!(matches!(
            decrypt_cbc(&KEY, &[0u8; 21]),
            Err(EncryptionError::MalformedData(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails_padding() {
        let ciphertext = encrypt_cbc(&KEY, b"some secret").unwrap();
        let mut wrong = KEY;
        wrong[0] ^= 0xFF;
        // Overwhelmingly likely to produce invalid padding.
        let result = decrypt_cbc(&wrong, &ciphertext);
        if let Ok(decrypted) = result {
            assert_ne!(decrypted.as_slice(), b"some secret");
        }
    }
}
