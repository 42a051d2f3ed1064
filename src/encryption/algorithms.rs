//! Standard security handler key derivation (revisions 2 to 4).
//!
//! Computes the `/O` and `/U` entries of the encryption dictionary and the
//! document key used to derive per-object keys.

use super::rc4::rc4_crypt;
use md5::{Digest, Md5};

/// Padding string appended to short passwords.
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

fn md5(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// RC4 applied with `key`, then (revision 3+) 19 more times with each key
/// byte XORed with the round number.
fn rc4_rounds(key: &[u8], data: &[u8], revision: u32) -> Vec<u8> {
    let mut out = rc4_crypt(key, data);
    if revision >= 3 {
        for round in 1..=19u8 {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
            out = rc4_crypt(&round_key, &out);
        }
    }
    out
}

/// Compute the `/O` value (algorithm 3).
///
/// An empty owner password falls back to the user password.
pub fn compute_owner_value(
    owner_password: &[u8],
    user_password: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    let owner = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };

    let mut hash = md5(&[&pad_password(owner)]);
    if revision >= 3 {
        for _ in 0..50 {
            hash = md5(&[&hash]);
        }
    }
    let n = if revision == 2 { 5 } else { key_length.min(16) };
    rc4_rounds(&hash[..n], &pad_password(user_password), revision)
}

/// Compute the document encryption key from the user password (algorithm 2).
pub fn compute_encryption_key(
    user_password: &[u8],
    owner_value: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(pad_password(user_password));
    hasher.update(owner_value);
    hasher.update(permissions.to_le_bytes());
    hasher.update(file_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash: [u8; 16] = hasher.finalize().into();

    let n = if revision == 2 { 5 } else { key_length.min(16) };
    if revision >= 3 {
        for _ in 0..50 {
            hash = md5(&[&hash[..n]]);
        }
    }
    hash[..n].to_vec()
}

/// Compute the `/U` value (algorithms 4 and 5).
pub fn compute_user_value(encryption_key: &[u8], file_id: &[u8], revision: u32) -> Vec<u8> {
    if revision == 2 {
        return rc4_crypt(encryption_key, &PADDING);
    }
    let hash = md5(&[&PADDING, file_id]);
    let mut value = rc4_rounds(encryption_key, &hash, revision);
    value.resize(32, 0);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_password() {
        let padded = pad_password(b"abc");
        assert_eq!(&padded[..3], b"abc");
        assert_eq!(&padded[3..], &PADDING[..29]);
        assert_eq!(pad_password(b""), PADDING);
        assert_eq!(pad_password(&[b'x'; 40]), [b'x'; 32]);
    }

    #[test]
    fn test_revision2_lengths() {
        let o = compute_owner_value(b"owner", b"user", 2, 5);
        assert_eq!(o.len(), 32);
        let key = compute_encryption_key(b"user", &o, -64, &[0u8; 16], 2, 5, true);
        assert_eq!(key.len(), 5);
        assert_eq!(compute_user_value(&key, &[0u8; 16], 2).len(), 32);
    }

    #[test]
    fn test_revision2_user_value_decrypts_to_padding() {
        let o = compute_owner_value(b"", b"user", 2, 5);
        let key = compute_encryption_key(b"user", &o, -4, b"0123456789abcdef", 2, 5, true);
        let u = compute_user_value(&key, b"0123456789abcdef", 2);
        assert_eq!(rc4_crypt(&key, &u), PADDING);
    }

    #[test]
    fn test_revision3_key_length() {
        let o = compute_owner_value(b"owner", b"", 3, 16);
        let key = compute_encryption_key(b"", &o, -3904, &[9u8; 16], 3, 16, true);
        assert_eq!(key.len(), 16);
        let u = compute_user_value(&key, &[9u8; 16], 3);
        assert_eq!(u.len(), 32);
        assert_eq!(&u[16..], &[0u8; 16]);
    }

    #[test]
    fn test_owner_falls_back_to_user_password() {
        assert_eq!(
            compute_owner_value(b"", b"same", 3, 16),
            compute_owner_value(b"same", b"same", 3, 16)
        );
    }
}
