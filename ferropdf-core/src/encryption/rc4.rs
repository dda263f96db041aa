//! RC4 stream cipher
//!
//! The symmetric cipher used by the V1/V2 security handlers and by `V2`
//! crypt filters. Keys are 1–256 bytes; encryption and decryption are the
//! same operation.

/// RC4 cipher state.
pub struct Rc4 {
    s: [u8; 256],
    i: usize,
    j: usize,
}

impl Rc4 {
    /// Key-schedule a new cipher. Keys longer than 256 bytes wrap.
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty(), "RC4 key must not be empty");
        let mut s = [0u8; 256];
        for (i, byte) in s.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let mut j = 0usize;
        for i in 0..256 {
            j = (j + s[i] as usize + key[i % key.len()] as usize) % 256;
            s.swap(i, j);
        }

        Self { s, i: 0, j: 0 }
    }

    /// Process data; RC4 is symmetric so this both encrypts and decrypts.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = data.to_vec();
        self.process_in_place(&mut output);
        output
    }

    /// Process data in place.
    pub fn process_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = (self.i + 1) % 256;
            self.j = (self.j + self.s[self.i] as usize) % 256;
            self.s.swap(self.i, self.j);

            let k = self.s[(self.s[self.i] as usize + self.s[self.j] as usize) % 256];
            *byte ^= k;
        }
    }
}

/// One-shot RC4 pass with a fresh key schedule.
pub fn rc4_apply(key: &[u8], data: &[u8]) -> Vec<u8> {
    Rc4::new(key).process(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_round_trip() {
        let key = [0x01, 0x02, 0x03, 0x04, 0x05];
        let plaintext = b"Hello, World!";

        let ciphertext = rc4_apply(&key, plaintext);
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());

        let decrypted = rc4_apply(&key, &ciphertext);
        assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_rc4_in_place() {
        let key = [0xAA, 0xBB, 0xCC];
        let mut data = b"some bytes".to_vec();
        let original = data.clone();

        Rc4::new(&key).process_in_place(&mut data);
        assert_ne!(data, original);
        Rc4::new(&key).process_in_place(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_rc4_known_vector() {
        // RFC 6229, key 01 02 03 04 05: first 16 keystream bytes.
        let key = [0x01, 0x02, 0x03, 0x04, 0x05];
        let keystream = rc4_apply(&key, &[0u8; 16]);
        let expected = [
            0xb2, 0x39, 0x63, 0x05, 0xf0, 0x3d, 0xc0, 0x27, 0xcc, 0xc3, 0x52, 0x4a, 0x0a, 0x11,
            0x18, 0xa8,
        ];
        assert_eq!(&keystream[..], &expected[..]);
    }

    #[test]
    fn test_rc4_empty_input() {
        let key = [0x01];
        assert!(rc4_apply(&key, &[]).is_empty());
    }

    #[test]
    fn test_rc4_stateful_continuation() {
        // One cipher over two chunks equals one pass over the whole.
        let key = [0x10, 0x20, 0x30];
        let data = b"split across two calls";

        let mut cipher = Rc4::new(&key);
        let mut chunked = cipher.process(&data[..8]);
        chunked.extend(cipher.process(&data[8..]));

        assert_eq!(chunked, rc4_apply(&key, data));
    }
}
