use zeroize::Zeroize;

use crate::crypto::aead::PacketCipher;
use crate::crypto::header_protection::{HeaderCipher, HeaderProtection};
use crate::crypto::suite::{AeadAlgorithm, AeadParams, MAX_KEY_LEN};
use crate::crypto::{MAX_PACKET_NUMBER, NONCE_LEN, SAMPLE_LEN, TAG_LEN};
use crate::error::Error;

/// Packet protection keys for one direction of one epoch.
///
/// Created by [`derive_key`](crate::crypto::derive_key) and immutable
/// afterwards. All key material is zeroized on drop.
pub struct DirectionalKeys {
    params: &'static AeadParams,
    key: [u8; MAX_KEY_LEN],
    iv: [u8; NONCE_LEN],
    hp_key: [u8; MAX_KEY_LEN],
    cipher: PacketCipher,
    header: HeaderCipher,
}

impl DirectionalKeys {
    pub(crate) fn from_parts(
        params: &'static AeadParams,
        key: &[u8],
        iv: [u8; NONCE_LEN],
        hp_key: &[u8],
    ) -> Result<Self, Error> {
        if key.len() != params.key_len || hp_key.len() != params.hp_key_len {
            return Err(Error::InvalidLength);
        }
        let cipher = PacketCipher::new(params.algorithm, key)?;
        let header = HeaderCipher::new(params.algorithm, hp_key)?;

        let mut keys = Self {
            params,
            key: [0u8; MAX_KEY_LEN],
            iv,
            hp_key: [0u8; MAX_KEY_LEN],
            cipher,
            header,
        };
        keys.key[..key.len()].copy_from_slice(key);
        keys.hp_key[..hp_key.len()].copy_from_slice(hp_key);
        Ok(keys)
    }

    pub fn aead_algorithm(&self) -> AeadAlgorithm {
        self.params.algorithm
    }

    pub fn bulk_key(&self) -> &[u8] {
        &self.key[..self.params.key_len]
    }

    /// Static IV the per-packet nonce is built from.
    pub fn iv(&self) -> &[u8; NONCE_LEN] {
        &self.iv
    }

    pub fn header_protection_key(&self) -> &[u8] {
        &self.hp_key[..self.params.hp_key_len]
    }

    /// Compute the AEAD nonce for a given packet number.
    ///
    /// The nonce is the IV XORed with the packet number, big-endian and
    /// left-padded to 12 bytes.
    pub fn nonce(&self, packet_number: u64) -> [u8; NONCE_LEN] {
        let mut nonce = self.iv;
        for (n, p) in nonce[NONCE_LEN - 8..]
            .iter_mut()
            .zip(packet_number.to_be_bytes())
        {
            *n ^= p;
        }
        nonce
    }

    /// Encrypt `buf[..payload_len]` in place and append the tag.
    ///
    /// Returns the ciphertext length (`payload_len + TAG_LEN`).
    pub fn seal_in_place(
        &self,
        packet_number: u64,
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error> {
        if packet_number > MAX_PACKET_NUMBER {
            return Err(Error::InvalidPacketNumber);
        }
        if payload_len > buf.len() {
            return Err(Error::InvalidLength);
        }
        self.cipher
            .seal_in_place(&self.nonce(packet_number), aad, buf, payload_len)
    }

    /// Encrypt `plaintext` into `out`, which must hold `plaintext.len() + TAG_LEN`
    /// bytes.
    pub fn seal(
        &self,
        packet_number: u64,
        aad: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        if packet_number > MAX_PACKET_NUMBER {
            return Err(Error::InvalidPacketNumber);
        }
        let needed = plaintext.len() + self.params.tag_len;
        if out.len() < needed {
            return Err(Error::BufferTooSmall { needed });
        }
        out[..plaintext.len()].copy_from_slice(plaintext);
        self.seal_in_place(packet_number, aad, &mut out[..needed], plaintext.len())
    }

    /// Decrypt `buf[..ciphertext_len]` in place.
    ///
    /// On failure `buf` still holds the ciphertext. Every rejection (bad tag,
    /// truncated input, out of range packet number) is `AuthenticationFailure`.
    pub fn open_in_place(
        &self,
        packet_number: u64,
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error> {
        if ciphertext_len > buf.len() {
            return Err(Error::InvalidLength);
        }
        let packet_number = if packet_number > MAX_PACKET_NUMBER {
            None
        } else {
            Some(packet_number)
        };
        let nonce = self.nonce(packet_number.unwrap_or(0));
        let result = self
            .cipher
            .open_in_place(&nonce, aad, buf, ciphertext_len)
            .and_then(|len| packet_number.map(|_| len).ok_or(Error::AuthenticationFailure));
        if result.is_err() {
            tracing::trace!(
                aead = ?self.params.algorithm,
                ciphertext_len,
                "packet failed authentication"
            );
        }
        result
    }

    /// Decrypt `ciphertext` into `out`.
    ///
    /// `out` needs room for the whole ciphertext since the tag is checked in
    /// place; the plaintext length is returned. On any failure `out` is zeroed.
    pub fn open(
        &self,
        packet_number: u64,
        aad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        if out.len() < ciphertext.len() {
            return Err(Error::BufferTooSmall {
                needed: ciphertext.len(),
            });
        }
        let buf = &mut out[..ciphertext.len()];
        buf.copy_from_slice(ciphertext);
        match self.open_in_place(packet_number, aad, buf, ciphertext.len()) {
            Ok(len) => {
                buf[len..].zeroize();
                Ok(len)
            }
            Err(err) => {
                buf.zeroize();
                Err(err)
            }
        }
    }

    /// Header protection mask for a ciphertext sample.
    ///
    /// `sample` must be exactly [`SAMPLE_LEN`] bytes; use
    /// [`header_sample`](crate::crypto::header_sample) to take it from a packet.
    pub fn mask(&self, sample: &[u8]) -> Result<[u8; 5], Error> {
        let sample: &[u8; SAMPLE_LEN] = sample.try_into().map_err(|_| Error::InvalidLength)?;
        Ok(self.header.mask(sample))
    }

    /// The leading four mask bytes, used as a one-time pad over the packet
    /// number field.
    ///
    /// This is the full-mask layout where the packet number is not preceded by
    /// a protected first byte. RFC 9001 framing instead applies `mask[0]` to the
    /// first header byte and `mask[1..]` to the packet number; use [`mask`]
    /// directly for that.
    ///
    /// [`mask`]: DirectionalKeys::mask
    pub fn packet_number_otp(&self, sample: &[u8]) -> Result<[u8; 4], Error> {
        let mask = self.mask(sample)?;
        Ok([mask[0], mask[1], mask[2], mask[3]])
    }

    /// XOR the packet number mask onto `pn_bytes` (1 to 4 bytes).
    ///
    /// The same call protects and unprotects.
    pub fn xor_packet_number(&self, sample: &[u8], pn_bytes: &mut [u8]) -> Result<(), Error> {
        if pn_bytes.is_empty() || pn_bytes.len() > 4 {
            return Err(Error::InvalidLength);
        }
        let otp = self.packet_number_otp(sample)?;
        for (b, m) in pn_bytes.iter_mut().zip(otp) {
            *b ^= m;
        }
        Ok(())
    }
}

impl core::fmt::Debug for DirectionalKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectionalKeys")
            .field("aead", &self.params.algorithm)
            .finish_non_exhaustive()
    }
}

impl Drop for DirectionalKeys {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
        self.hp_key.zeroize();
    }
}
