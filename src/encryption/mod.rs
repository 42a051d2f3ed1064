//! Document protection with the standard security handler.
//!
//! Supported handlers:
//!
//! - RC4 40-bit (V=1, R=2), the default used by `set_protection`
//! - RC4 128-bit (V=2, R=3)
//! - AES 128-bit (V=4, R=4, crypt filter `AESV2`), which raises the file
//!   version to 1.6
//!
//! Passwords are used as raw bytes; key derivation follows the MD5-based
//! algorithms of the standard security handler.

mod aes;
mod algorithms;
mod rc4;
mod write_handler;

pub use algorithms::pad_password;
pub use write_handler::Protection;

use bitflags::bitflags;

/// Encryption algorithm used in the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// No encryption
    None,
    /// RC4 with 40-bit key
    #[default]
    Rc4_40,
    /// RC4 with 128-bit key
    Rc4_128,
    /// AES with 128-bit key in CBC mode
    Aes128,
}

impl Algorithm {
    /// Key length in bytes.
    pub fn key_length(&self) -> usize {
        match self {
            Algorithm::None => 0,
            Algorithm::Rc4_40 => 5,
            Algorithm::Rc4_128 | Algorithm::Aes128 => 16,
        }
    }

    /// `/V` entry.
    pub fn version(&self) -> u32 {
        match self {
            Algorithm::None => 0,
            Algorithm::Rc4_40 => 1,
            Algorithm::Rc4_128 => 2,
            Algorithm::Aes128 => 4,
        }
    }

    /// `/R` entry.
    pub fn revision(&self) -> u32 {
        match self {
            Algorithm::None => 0,
            Algorithm::Rc4_40 => 2,
            Algorithm::Rc4_128 => 3,
            Algorithm::Aes128 => 4,
        }
    }

    /// Check if this is an AES algorithm.
    pub fn is_aes(&self) -> bool {
        matches!(self, Algorithm::Aes128)
    }

    /// Lowest PDF minor version (1.x) able to carry this handler.
    pub fn min_pdf_minor(&self) -> u8 {
        match self {
            Algorithm::None | Algorithm::Rc4_40 => 3,
            Algorithm::Rc4_128 => 4,
            Algorithm::Aes128 => 6,
        }
    }
}

bitflags! {
    /// User access permissions granted when the document is opened with the
    /// user password.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Print the document
        const PRINT = 1 << 2;
        /// Modify contents
        const MODIFY = 1 << 3;
        /// Copy text and graphics
        const COPY = 1 << 4;
        /// Add or modify annotations and fill form fields
        const ANNOT_FORMS = 1 << 5;
        /// Fill existing form fields (revision 3+)
        const FILL_FORMS = 1 << 8;
        /// Extract text for accessibility (revision 3+)
        const EXTRACT = 1 << 9;
        /// Assemble pages (revision 3+)
        const ASSEMBLE = 1 << 10;
        /// Print at full resolution (revision 3+)
        const PRINT_HIGH = 1 << 11;
    }
}

impl Permissions {
    /// Signed `/P` value with all reserved bits set as required.
    pub fn p_value(&self, revision: u32) -> i32 {
        let bits = if revision >= 3 {
            0xFFFF_F0C0 | self.bits()
        } else {
            0xFFFF_FFC0 | (self.bits() & 0x3C)
        };
        bits as i32
    }
}
