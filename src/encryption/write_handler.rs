//! Object encryption while the document is being serialized.

use super::aes;
use super::algorithms;
use super::rc4;
use super::{Algorithm, Permissions};
use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use md5::{Digest, Md5};

/// Standard security handler state for one output file.
///
/// Holds the `/O`, `/U` and `/P` values and the document key; encrypts every
/// string and stream with a key derived from the owning object number.
pub struct Protection {
    algorithm: Algorithm,
    key: Vec<u8>,
    owner_value: Vec<u8>,
    user_value: Vec<u8>,
    p_value: i32,
}

impl std::fmt::Debug for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protection")
            .field("algorithm", &self.algorithm)
            .field("p_value", &self.p_value)
            .finish_non_exhaustive()
    }
}

impl Protection {
    /// Derive all handler values for the given passwords and file identifier.
    pub fn new(
        algorithm: Algorithm,
        permissions: Permissions,
        user_password: &[u8],
        owner_password: &[u8],
        file_id: &[u8],
    ) -> Result<Self> {
        if algorithm == Algorithm::None {
            return Err(Error::Encryption("no encryption algorithm selected".to_string()));
        }
        let revision = algorithm.revision();
        let key_length = algorithm.key_length();
        let p_value = permissions.p_value(revision);

        let owner_value =
            algorithms::compute_owner_value(owner_password, user_password, revision, key_length);
        let key = algorithms::compute_encryption_key(
            user_password,
            &owner_value,
            p_value,
            file_id,
            revision,
            key_length,
            true,
        );
        let user_value = algorithms::compute_user_value(&key, file_id, revision);

        log::debug!("Document protection set up with {:?} (P={})", algorithm, p_value);
        Ok(Self {
            algorithm,
            key,
            owner_value,
            user_value,
            p_value,
        })
    }

    /// Algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// `/P` entry.
    pub fn p_value(&self) -> i32 {
        self.p_value
    }

    /// Per-object key: MD5 of document key, object number and generation.
    fn object_key(&self, obj_num: u32, gen_num: u16) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(&self.key);
        hasher.update(&obj_num.to_le_bytes()[..3]);
        hasher.update(gen_num.to_le_bytes());
        if self.algorithm.is_aes() {
            hasher.update(b"sAlT");
        }
        let hash = hasher.finalize();
        let n = (self.key.len() + 5).min(16);
        hash[..n].to_vec()
    }

    /// Encrypt string or stream bytes belonging to object `obj_num`.
    pub fn encrypt(&self, data: &[u8], obj_num: u32) -> Vec<u8> {
        let key = self.object_key(obj_num, 0);
        match self.algorithm {
            Algorithm::None => data.to_vec(),
            Algorithm::Rc4_40 | Algorithm::Rc4_128 => rc4::rc4_crypt(&key, data),
            Algorithm::Aes128 => {
                let iv = Self::generate_iv(obj_num);
                match aes::aes128_encrypt(&key, &iv, data) {
                    Ok(ciphertext) => {
                        let mut out = iv.to_vec();
                        out.extend(ciphertext);
                        out
                    },
                    Err(e) => {
                        log::warn!("AES encryption of object {} failed: {}", obj_num, e);
                        data.to_vec()
                    },
                }
            },
        }
    }

    fn generate_iv(obj_num: u32) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        hasher.update(obj_num.to_le_bytes());
        hasher.finalize().into()
    }

    /// The `/Encrypt` dictionary.
    pub fn encrypt_dict(&self) -> Dict {
        let mut d = Dict::new();
        d.insert("Filter".into(), Object::name("Standard"));
        d.insert("V".into(), Object::Integer(self.algorithm.version() as i64));
        d.insert("R".into(), Object::Integer(self.algorithm.revision() as i64));
        if self.algorithm != Algorithm::Rc4_40 {
            d.insert("Length".into(), Object::Integer(self.algorithm.key_length() as i64 * 8));
        }
        if self.algorithm.is_aes() {
            let std_cf = Object::dict([
                ("AuthEvent", Object::name("DocOpen")),
                ("CFM", Object::name("AESV2")),
                ("Length", Object::Integer(16)),
            ]);
            d.insert("CF".into(), Object::dict([("StdCF", std_cf)]));
            d.insert("StmF".into(), Object::name("StdCF"));
            d.insert("StrF".into(), Object::name("StdCF"));
        }
        d.insert("O".into(), Object::String(self.owner_value.clone()));
        d.insert("U".into(), Object::String(self.user_value.clone()));
        d.insert("P".into(), Object::Integer(self.p_value as i64));
        d
    }

    #[cfg(test)]
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc4_40() -> Protection {
        Protection::new(
            Algorithm::Rc4_40,
            Permissions::PRINT,
            b"user",
            b"owner",
            b"0123456789abcdef",
        )
        .unwrap()
    }

    #[test]
    fn test_object_keys_differ_per_object() {
        let p = rc4_40();
        assert_eq!(p.key().len(), 5);
        assert_eq!(p.object_key(1, 0).len(), 10);
        assert_ne!(p.object_key(1, 0), p.object_key(2, 0));
    }

    #[test]
    fn test_rc4_encrypt_is_reversible() {
        let p = rc4_40();
        let ct = p.encrypt(b"(Hello World!) Tj", 7);
        assert_ne!(&ct[..], b"(Hello World!) Tj");
        assert_eq!(rc4::rc4_crypt(&p.object_key(7, 0), &ct), b"(Hello World!) Tj");
    }

    #[test]
    fn test_aes_encrypt_prepends_iv() {
        let p = Protection::new(Algorithm::Aes128, Permissions::all(), b"", b"o", &[1u8; 16])
            .unwrap();
        let ct = p.encrypt(b"stream body", 3);
        assert_eq!(ct.len(), 32);
        let plain = aes::aes128_decrypt(&p.object_key(3, 0), &ct[..16], &ct[16..]).unwrap();
        assert_eq!(plain, b"stream body");
    }

    #[test]
    fn test_encrypt_dict_entries() {
        let d = rc4_40().encrypt_dict();
        assert_eq!(d.get("V"), Some(&Object::Integer(1)));
        assert_eq!(d.get("R"), Some(&Object::Integer(2)));
        assert!(d.get("Length").is_none());

        let aes = Protection::new(Algorithm::Aes128, Permissions::empty(), b"", b"", &[0u8; 16])
            .unwrap()
            .encrypt_dict();
        assert_eq!(aes.get("StmF"), Some(&Object::name("StdCF")));
        assert_eq!(aes.get("Length"), Some(&Object::Integer(128)));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let err = Protection::new(Algorithm::None, Permissions::empty(), b"", b"", &[]).unwrap_err();
        assert!(matches!(err, Error::Encryption(_)));
    }
}
