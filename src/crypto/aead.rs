use crate::crypto::rustcrypto::{Aes128GcmAead, Aes256GcmAead};
#[cfg(feature = "rustcrypto-chacha")]
use crate::crypto::rustcrypto::ChaCha20Poly1305Aead;
use crate::crypto::suite::AeadAlgorithm;
use crate::crypto::NONCE_LEN;
use crate::error::Error;

/// Authenticated Encryption with Associated Data.
///
/// Used for QUIC packet payload protection. QUIC mandates support for
/// AES-128-GCM; ChaCha20-Poly1305 is preferred on targets without
/// AES hardware.
pub trait Aead {
    /// Key length in bytes.
    const KEY_LEN: usize;
    /// Authentication tag length in bytes (always 16 for QUIC).
    const TAG_LEN: usize;

    /// Encrypt in place.
    ///
    /// `buf[..payload_len]` contains the plaintext. The buffer must have
    /// room for the authentication tag (`buf.len() >= payload_len + TAG_LEN`).
    ///
    /// Returns the total length of ciphertext + tag.
    fn seal_in_place(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error>;

    /// Decrypt in place.
    ///
    /// `buf[..ciphertext_len]` contains ciphertext + authentication tag.
    /// On failure the buffer is left holding the ciphertext.
    ///
    /// Returns the plaintext length on success.
    fn open_in_place(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error>;
}

/// AEAD selected at runtime from an [`AeadAlgorithm`] tag.
pub enum PacketCipher {
    Aes128Gcm(Aes128GcmAead),
    Aes256Gcm(Aes256GcmAead),
    #[cfg(feature = "rustcrypto-chacha")]
    ChaCha20Poly1305(ChaCha20Poly1305Aead),
}

impl PacketCipher {
    pub fn new(algorithm: AeadAlgorithm, key: &[u8]) -> Result<Self, Error> {
        match algorithm {
            AeadAlgorithm::Aes128Gcm => Aes128GcmAead::new(key).map(Self::Aes128Gcm),
            AeadAlgorithm::Aes256Gcm => Aes256GcmAead::new(key).map(Self::Aes256Gcm),
            #[cfg(feature = "rustcrypto-chacha")]
            AeadAlgorithm::ChaCha20Poly1305 => {
                ChaCha20Poly1305Aead::new(key).map(Self::ChaCha20Poly1305)
            }
            #[cfg(not(feature = "rustcrypto-chacha"))]
            AeadAlgorithm::ChaCha20Poly1305 => Err(Error::UnsupportedAlgorithm),
        }
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        match self {
            Self::Aes128Gcm(_) => AeadAlgorithm::Aes128Gcm,
            Self::Aes256Gcm(_) => AeadAlgorithm::Aes256Gcm,
            #[cfg(feature = "rustcrypto-chacha")]
            Self::ChaCha20Poly1305(_) => AeadAlgorithm::ChaCha20Poly1305,
        }
    }

    pub fn seal_in_place(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error> {
        match self {
            Self::Aes128Gcm(c) => c.seal_in_place(nonce, aad, buf, payload_len),
            Self::Aes256Gcm(c) => c.seal_in_place(nonce, aad, buf, payload_len),
            #[cfg(feature = "rustcrypto-chacha")]
            Self::ChaCha20Poly1305(c) => c.seal_in_place(nonce, aad, buf, payload_len),
        }
    }

    pub fn open_in_place(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error> {
        match self {
            Self::Aes128Gcm(c) => c.open_in_place(nonce, aad, buf, ciphertext_len),
            Self::Aes256Gcm(c) => c.open_in_place(nonce, aad, buf, ciphertext_len),
            #[cfg(feature = "rustcrypto-chacha")]
            Self::ChaCha20Poly1305(c) => c.open_in_place(nonce, aad, buf, ciphertext_len),
        }
    }
}
