use crate::crypto::rustcrypto::{Aes128HeaderProtection, Aes256HeaderProtection};
#[cfg(feature = "rustcrypto-chacha")]
use crate::crypto::rustcrypto::ChaChaHeaderProtection;
use crate::crypto::suite::{AeadAlgorithm, MaskStrategy};
use crate::crypto::SAMPLE_LEN;
use crate::error::Error;

/// Header protection cipher.
///
/// QUIC applies a mask to the first byte and packet number bytes of
/// each packet to prevent middleboxes from reading packet numbers.
/// The mask is derived from a 16-byte sample of the encrypted payload.
pub trait HeaderProtection {
    /// Compute a 5-byte mask from a 16-byte sample.
    fn mask(&self, sample: &[u8; SAMPLE_LEN]) -> [u8; 5];
}

/// Header protection cipher selected at runtime from an [`AeadAlgorithm`] tag.
pub enum HeaderCipher {
    Aes128(Aes128HeaderProtection),
    Aes256(Aes256HeaderProtection),
    #[cfg(feature = "rustcrypto-chacha")]
    ChaCha20(ChaChaHeaderProtection),
}

impl HeaderCipher {
    /// Build the mask cipher named by the suite table entry for `algorithm`.
    pub fn new(algorithm: AeadAlgorithm, key: &[u8]) -> Result<Self, Error> {
        let params = algorithm.params()?;
        if key.len() != params.hp_key_len {
            return Err(Error::InvalidLength);
        }
        match params.mask {
            MaskStrategy::AesEcb if params.hp_key_len == 16 => {
                Aes128HeaderProtection::new(key).map(Self::Aes128)
            }
            MaskStrategy::AesEcb => Aes256HeaderProtection::new(key).map(Self::Aes256),
            #[cfg(feature = "rustcrypto-chacha")]
            MaskStrategy::ChaCha20 => ChaChaHeaderProtection::new(key).map(Self::ChaCha20),
            #[cfg(not(feature = "rustcrypto-chacha"))]
            MaskStrategy::ChaCha20 => Err(Error::UnsupportedAlgorithm),
        }
    }

    pub fn strategy(&self) -> MaskStrategy {
        match self {
            Self::Aes128(_) | Self::Aes256(_) => MaskStrategy::AesEcb,
            #[cfg(feature = "rustcrypto-chacha")]
            Self::ChaCha20(_) => MaskStrategy::ChaCha20,
        }
    }
}

impl HeaderProtection for HeaderCipher {
    fn mask(&self, sample: &[u8; SAMPLE_LEN]) -> [u8; 5] {
        match self {
            Self::Aes128(hp) => hp.mask(sample),
            Self::Aes256(hp) => hp.mask(sample),
            #[cfg(feature = "rustcrypto-chacha")]
            Self::ChaCha20(hp) => hp.mask(sample),
        }
    }
}

/// Offset of the sample past the start of the packet number field.
///
/// RFC 9001 section 5.4.2 samples as if the packet number were 4 bytes long.
/// Other wire formats may sample elsewhere; pass their offset to
/// [`sample_at`] instead.
pub const SAMPLE_OFFSET: usize = 4;

/// Take the header protection sample for a packet whose packet number starts
/// at `pn_offset`.
pub fn header_sample(packet: &[u8], pn_offset: usize) -> Result<[u8; SAMPLE_LEN], Error> {
    sample_at(packet, pn_offset + SAMPLE_OFFSET)
}

/// Take `SAMPLE_LEN` bytes of `packet` starting at `offset`.
pub fn sample_at(packet: &[u8], offset: usize) -> Result<[u8; SAMPLE_LEN], Error> {
    let end = offset.checked_add(SAMPLE_LEN).ok_or(Error::InvalidLength)?;
    let bytes = packet.get(offset..end).ok_or(Error::InvalidLength)?;
    let mut sample = [0u8; SAMPLE_LEN];
    sample.copy_from_slice(bytes);
    Ok(sample)
}
