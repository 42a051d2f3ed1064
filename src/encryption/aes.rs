//! AES-128 in CBC mode with PKCS#7 padding, as required by the AESV2 crypt filter.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use cbc::{Decryptor, Encryptor};

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;

/// Encrypt `data` with a 16-byte key and IV. The IV is not prepended.
pub fn aes128_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if key.len() != 16 {
        return Err("AES-128 key must be 16 bytes");
    }
    if iv.len() != 16 {
        return Err("IV must be 16 bytes");
    }

    let padding_len = 16 - (data.len() % 16);
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(padding_len as u8).take(padding_len));

    let len = padded.len();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut padded, len)
        .map_err(|_| "AES encryption failed")?;
    Ok(padded)
}

/// Decrypt and strip PKCS#7 padding.
pub fn aes128_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if key.len() != 16 || iv.len() != 16 {
        return Err("AES-128 key and IV must be 16 bytes");
    }
    if data.is_empty() || data.len() % 16 != 0 {
        return Err("ciphertext length must be a non-zero multiple of 16");
    }

    let mut buffer = data.to_vec();
    let plain = Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| "AES decryption failed")?;

    let pad = match plain.last() {
        Some(&p) if (1..=16).contains(&p) => p as usize,
        _ => return Err("invalid PKCS#7 padding"),
    };
    let end = plain.len() - pad;
    if plain[end..].iter().any(|&b| b as usize != pad) {
        return Err("invalid PKCS#7 padding");
    }
    Ok(plain[..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes128_round_trip() {
        let key = [7u8; 16];
        let iv = [3u8; 16];
        let ciphertext = aes128_encrypt(&key, &iv, b"BT /F1 12 Tf ET").unwrap();
        assert_eq!(ciphertext.len(), 16);
        assert_eq!(aes128_decrypt(&key, &iv, &ciphertext).unwrap(), b"BT /F1 12 Tf ET");
    }

    #[test]
    fn test_aes128_full_block_gets_extra_padding() {
        let ciphertext = aes128_encrypt(&[1u8; 16], &[0u8; 16], &[0u8; 16]).unwrap();
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn test_aes128_rejects_bad_key() {
        assert!(aes128_encrypt(&[0u8; 5], &[0u8; 16], b"x").is_err());
    }
}
