//! RustCrypto-backed implementations of the packet protection traits.

use crate::crypto::{
    Aead as AeadTrait, HeaderProtection, Hkdf as HkdfTrait, NONCE_LEN, SAMPLE_LEN, TAG_LEN,
};
use crate::error::Error;

// ---- Hash / HMAC / HKDF ----

macro_rules! rustcrypto_hkdf {
    ($(#[$meta:meta])* $name:ident, $digest:ty, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl HkdfTrait for $name {
            fn hash_len(&self) -> usize {
                $len
            }

            fn hash(&self, data: &[u8], out: &mut [u8]) {
                use sha2::Digest as _;
                out[..$len].copy_from_slice(&<$digest>::digest(data));
            }

            fn hmac(&self, key: &[u8], data: &[u8], out: &mut [u8]) -> Result<(), Error> {
                use hmac::Mac as _;
                let mut mac = <hmac::Hmac<$digest> as hmac::Mac>::new_from_slice(key)
                    .map_err(|_| Error::InvalidLength)?;
                mac.update(data);
                out[..$len].copy_from_slice(&mac.finalize().into_bytes());
                Ok(())
            }

            fn extract(&self, salt: &[u8], ikm: &[u8], prk: &mut [u8]) {
                let (out, _) = hkdf::Hkdf::<$digest>::extract(Some(salt), ikm);
                prk[..$len].copy_from_slice(&out);
            }

            fn expand(&self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
                let hk = hkdf::Hkdf::<$digest>::from_prk(prk).map_err(|_| Error::InvalidLength)?;
                hk.expand(info, okm).map_err(|_| Error::DerivationFailure)
            }
        }
    };
}

rustcrypto_hkdf!(
    /// HKDF using SHA-256 (via the `hkdf` crate).
    HkdfSha256,
    sha2::Sha256,
    32
);
rustcrypto_hkdf!(
    /// HKDF using SHA-384.
    HkdfSha384,
    sha2::Sha384,
    48
);
rustcrypto_hkdf!(
    /// HKDF using SHA-512.
    HkdfSha512,
    sha2::Sha512,
    64
);

// ---- AEADs ----

macro_rules! rustcrypto_aead {
    ($(#[$meta:meta])* $name:ident, $krate:ident, $cipher:ty, $key_len:expr) => {
        $(#[$meta])*
        pub struct $name {
            cipher: $cipher,
        }

        impl $name {
            pub fn new(key: &[u8]) -> Result<Self, Error> {
                use $krate::KeyInit;
                if key.len() != Self::KEY_LEN {
                    return Err(Error::InvalidLength);
                }
                let cipher = <$cipher>::new_from_slice(key).map_err(|_| Error::InvalidLength)?;
                Ok(Self { cipher })
            }
        }

        impl AeadTrait for $name {
            const KEY_LEN: usize = $key_len;
            const TAG_LEN: usize = TAG_LEN;

            fn seal_in_place(
                &self,
                nonce: &[u8; NONCE_LEN],
                aad: &[u8],
                buf: &mut [u8],
                payload_len: usize,
            ) -> Result<usize, Error> {
                use $krate::aead::AeadInPlace;

                let total = payload_len + Self::TAG_LEN;
                if buf.len() < total {
                    return Err(Error::BufferTooSmall { needed: total });
                }

                let tag = self
                    .cipher
                    .encrypt_in_place_detached(
                        $krate::Nonce::from_slice(nonce),
                        aad,
                        &mut buf[..payload_len],
                    )
                    .map_err(|_| Error::InvalidLength)?;
                buf[payload_len..total].copy_from_slice(&tag);
                Ok(total)
            }

            fn open_in_place(
                &self,
                nonce: &[u8; NONCE_LEN],
                aad: &[u8],
                buf: &mut [u8],
                ciphertext_len: usize,
            ) -> Result<usize, Error> {
                use $krate::aead::AeadInPlace;

                if buf.len() < ciphertext_len {
                    return Err(Error::BufferTooSmall {
                        needed: ciphertext_len,
                    });
                }
                let nonce = $krate::Nonce::from_slice(nonce);
                if ciphertext_len < Self::TAG_LEN {
                    // Too short to hold a tag: still run a tag check so the
                    // rejection takes the same path as a forged tag.
                    let tag = $krate::Tag::from([0u8; TAG_LEN]);
                    let _ = self.cipher.decrypt_in_place_detached(nonce, aad, &mut [], &tag);
                    return Err(Error::AuthenticationFailure);
                }

                let plaintext_len = ciphertext_len - Self::TAG_LEN;
                let mut tag_bytes = [0u8; TAG_LEN];
                tag_bytes.copy_from_slice(&buf[plaintext_len..ciphertext_len]);
                let tag = $krate::Tag::from(tag_bytes);
                self.cipher
                    .decrypt_in_place_detached(nonce, aad, &mut buf[..plaintext_len], &tag)
                    .map_err(|_| Error::AuthenticationFailure)?;
                Ok(plaintext_len)
            }
        }
    };
}

rustcrypto_aead!(
    /// AES-128-GCM AEAD implementation.
    Aes128GcmAead,
    aes_gcm,
    aes_gcm::Aes128Gcm,
    16
);
rustcrypto_aead!(
    /// AES-256-GCM AEAD implementation.
    Aes256GcmAead,
    aes_gcm,
    aes_gcm::Aes256Gcm,
    32
);
#[cfg(feature = "rustcrypto-chacha")]
rustcrypto_aead!(
    /// ChaCha20-Poly1305 AEAD implementation.
    ChaCha20Poly1305Aead,
    chacha20poly1305,
    chacha20poly1305::ChaCha20Poly1305,
    32
);

// ---- AES Header Protection ----

macro_rules! aes_header_protection {
    ($(#[$meta:meta])* $name:ident, $cipher:ty, $key_len:expr) => {
        $(#[$meta])*
        pub struct $name {
            cipher: $cipher,
        }

        impl $name {
            pub fn new(key: &[u8]) -> Result<Self, Error> {
                use aes::cipher::KeyInit;
                if key.len() != $key_len {
                    return Err(Error::InvalidLength);
                }
                let cipher = <$cipher>::new_from_slice(key).map_err(|_| Error::InvalidLength)?;
                Ok(Self { cipher })
            }
        }

        impl HeaderProtection for $name {
            fn mask(&self, sample: &[u8; SAMPLE_LEN]) -> [u8; 5] {
                use aes::cipher::BlockEncrypt;

                let mut block = aes::Block::from(*sample);
                self.cipher.encrypt_block(&mut block);
                let mut mask = [0u8; 5];
                mask.copy_from_slice(&block[..5]);
                mask
            }
        }
    };
}

aes_header_protection!(
    /// AES-128-ECB header protection.
    Aes128HeaderProtection,
    aes::Aes128,
    16
);
aes_header_protection!(
    /// AES-256-ECB header protection.
    Aes256HeaderProtection,
    aes::Aes256,
    32
);

// ---- ChaCha20 Header Protection ----

#[cfg(feature = "rustcrypto-chacha")]
/// ChaCha20 header protection.
pub struct ChaChaHeaderProtection {
    key: [u8; 32],
}

#[cfg(feature = "rustcrypto-chacha")]
impl ChaChaHeaderProtection {
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let key: [u8; 32] = key.try_into().map_err(|_| Error::InvalidLength)?;
        Ok(Self { key })
    }
}

#[cfg(feature = "rustcrypto-chacha")]
impl HeaderProtection for ChaChaHeaderProtection {
    fn mask(&self, sample: &[u8; SAMPLE_LEN]) -> [u8; 5] {
        use chacha20::cipher::{Block, KeyIvInit, StreamCipherCore, StreamCipherSeekCore};
        // chacha20 0.9 does not export the 20-round core by name; `ChaCha20`
        // is `StreamCipherCoreWrapper<ChaChaCore<U10>>`.
        type ChaCha20Core = chacha20::ChaChaCore<chacha20::cipher::consts::U10>;

        let counter = u32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&sample[4..]);

        // One keystream block at the sampled counter. The block-level core
        // has no end-of-stream check, so counter 0xffffffff is valid here.
        let mut core = ChaCha20Core::new((&self.key).into(), (&nonce).into());
        core.set_block_pos(counter);
        let mut block = Block::<ChaCha20Core>::default();
        core.write_keystream_block(&mut block);

        let mut mask = [0u8; 5];
        mask.copy_from_slice(&block[..5]);
        mask
    }
}

#[cfg(feature = "rustcrypto-chacha")]
impl Drop for ChaChaHeaderProtection {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
    }
}
