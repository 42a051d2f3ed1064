//! RC4 stream cipher used by the 40- and 128-bit standard security handler.

/// RC4 key schedule and keystream state.
struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key-scheduling algorithm. `key` must not be empty.
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, val) in s.iter_mut().enumerate() {
            *val = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Self { s, i: 0, j: 0 }
    }

    fn keystream_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let k = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[k as usize]
    }
}

/// Encrypt (or, symmetrically, decrypt) `data` with `key`.
///
/// An empty key leaves the data unchanged.
pub fn rc4_crypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    let mut cipher = Rc4::new(key);
    data.iter().map(|b| b ^ cipher.keystream_byte()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_known_vector() {
        // Key "Key", plaintext "Plaintext" -> BBF316E8D940AF0AD3
        let ciphertext = rc4_crypt(b"Key", b"Plaintext");
        assert_eq!(ciphertext, vec![0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]);
    }

    #[test]
    fn test_rc4_symmetric() {
        let ciphertext = rc4_crypt(b"secret", b"Hello World!");
        assert_ne!(&ciphertext[..], b"Hello World!");
        assert_eq!(rc4_crypt(b"secret", &ciphertext), b"Hello World!");
    }

    #[test]
    fn test_rc4_empty_input() {
        assert!(rc4_crypt(b"k", b"").is_empty());
        assert_eq!(rc4_crypt(b"", b"abc"), b"abc");
    }
}
