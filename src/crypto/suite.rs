//! Algorithm tags and the dispatch tables behind them.
//!
//! Hash and AEAD choices arrive from the handshake as small integer tags.
//! Everything that depends on the choice (key sizes, which HKDF, which
//! header protection cipher) is looked up here, so adding a cipher is one
//! new table entry.

use crate::crypto::hkdf::Hkdf;
use crate::crypto::rustcrypto::{HkdfSha256, HkdfSha384, HkdfSha512};
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::Error;

/// Largest supported digest length (SHA-512).
pub const MAX_DIGEST_LEN: usize = 64;

/// Largest AEAD or header protection key length.
pub const MAX_KEY_LEN: usize = 32;

/// TLS hash algorithm tag.
///
/// Discriminants follow the handshake layer's numbering. MD5, SHA-1 and
/// SHA-224 can be named but are never accepted for packet protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashAlgorithm {
    Md5 = 0,
    Sha1 = 1,
    Sha224 = 2,
    Sha256 = 3,
    Sha384 = 4,
    Sha512 = 5,
}

struct HashEntry {
    hash: HashAlgorithm,
    hkdf: &'static dyn Hkdf,
}

static HASHES: [HashEntry; 3] = [
    HashEntry {
        hash: HashAlgorithm::Sha256,
        hkdf: &HkdfSha256,
    },
    HashEntry {
        hash: HashAlgorithm::Sha384,
        hkdf: &HkdfSha384,
    },
    HashEntry {
        hash: HashAlgorithm::Sha512,
        hkdf: &HkdfSha512,
    },
];

impl HashAlgorithm {
    /// Hashes usable for packet protection.
    pub const SUPPORTED: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Parse a handshake-layer tag.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Md5),
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha224),
            3 => Some(Self::Sha256),
            4 => Some(Self::Sha384),
            5 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Digest length in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// The HKDF/HMAC implementation for this hash.
    pub fn hkdf(self) -> Result<&'static dyn Hkdf, Error> {
        HASHES
            .iter()
            .find(|entry| entry.hash == self)
            .map(|entry| entry.hkdf)
            .ok_or(Error::UnsupportedAlgorithm)
    }

    pub fn is_supported(self) -> bool {
        self.hkdf().is_ok()
    }
}

/// TLS AEAD algorithm tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AeadAlgorithm {
    Aes128Gcm = 0,
    Aes256Gcm = 1,
    ChaCha20Poly1305 = 2,
}

/// How the header protection mask is computed from a ciphertext sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStrategy {
    /// One AES block encryption of the sample.
    AesEcb,
    /// ChaCha20 keystream, counter and nonce taken from the sample.
    ChaCha20,
}

/// Sizes and header protection strategy for one AEAD.
#[derive(Debug, PartialEq, Eq)]
pub struct AeadParams {
    pub algorithm: AeadAlgorithm,
    pub key_len: usize,
    pub iv_len: usize,
    pub hp_key_len: usize,
    pub tag_len: usize,
    pub mask: MaskStrategy,
}

// Indexed by `AeadAlgorithm as usize`.
static AEADS: [AeadParams; 3] = [
    AeadParams {
        algorithm: AeadAlgorithm::Aes128Gcm,
        key_len: 16,
        iv_len: NONCE_LEN,
        hp_key_len: 16,
        tag_len: TAG_LEN,
        mask: MaskStrategy::AesEcb,
    },
    AeadParams {
        algorithm: AeadAlgorithm::Aes256Gcm,
        key_len: 32,
        iv_len: NONCE_LEN,
        hp_key_len: 32,
        tag_len: TAG_LEN,
        mask: MaskStrategy::AesEcb,
    },
    AeadParams {
        algorithm: AeadAlgorithm::ChaCha20Poly1305,
        key_len: 32,
        iv_len: NONCE_LEN,
        hp_key_len: 32,
        tag_len: TAG_LEN,
        mask: MaskStrategy::ChaCha20,
    },
];

impl AeadAlgorithm {
    pub const ALL: [AeadAlgorithm; 3] = [
        AeadAlgorithm::Aes128Gcm,
        AeadAlgorithm::Aes256Gcm,
        AeadAlgorithm::ChaCha20Poly1305,
    ];

    /// Parse a handshake-layer tag.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Aes128Gcm),
            1 => Some(Self::Aes256Gcm),
            2 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }

    /// Whether this build carries an implementation.
    pub const fn is_available(self) -> bool {
        match self {
            Self::Aes128Gcm | Self::Aes256Gcm => true,
            Self::ChaCha20Poly1305 => cfg!(feature = "rustcrypto-chacha"),
        }
    }

    /// Table entry for this AEAD.
    pub fn params(self) -> Result<&'static AeadParams, Error> {
        if !self.is_available() {
            return Err(Error::UnsupportedAlgorithm);
        }
        Ok(&AEADS[self as usize])
    }
}
