//! Algorithm-tagged traffic secrets.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::hkdf::{self, TLS13_LABEL_PREFIX};
use crate::crypto::key_schedule::Labels;
use crate::crypto::suite::{AeadAlgorithm, HashAlgorithm, MAX_DIGEST_LEN};
use crate::error::Error;

/// A traffic secret together with the hash and AEAD it is used with.
///
/// Storage is sized for the largest digest; only the first
/// `hash.digest_len()` bytes are meaningful and the rest stay zero.
/// Secrets are never mutated: every derivation returns a new one.
#[derive(Clone)]
pub struct Secret {
    pub(crate) hash: HashAlgorithm,
    pub(crate) aead: AeadAlgorithm,
    pub(crate) bytes: [u8; MAX_DIGEST_LEN],
}

impl Secret {
    /// Wrap secret material handed over by the handshake layer.
    ///
    /// `material` must be exactly one digest long for `hash`.
    pub fn new(hash: HashAlgorithm, aead: AeadAlgorithm, material: &[u8]) -> Result<Self, Error> {
        hash.hkdf()?;
        aead.params()?;
        if material.len() != hash.digest_len() {
            return Err(Error::InvalidLength);
        }
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes[..material.len()].copy_from_slice(material);
        Ok(Self { hash, aead, bytes })
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn aead_algorithm(&self) -> AeadAlgorithm {
        self.aead
    }

    /// The meaningful secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.hash.digest_len()]
    }

    /// Derive a child secret with `label` under the TLS 1.3 prefix and an
    /// empty context. See [`derive_secret`].
    pub fn derive(&self, label: &[u8]) -> Result<Secret, Error> {
        self.expand(TLS13_LABEL_PREFIX, label)
    }

    /// Next-generation secret for a key update.
    pub fn next_generation(&self, labels: &Labels) -> Result<Secret, Error> {
        self.expand(labels.prefix, labels.key_update)
    }

    /// HKDF-Expand-Label to one digest, keeping the algorithm tags.
    pub(crate) fn expand(&self, prefix: &[u8], label: &[u8]) -> Result<Secret, Error> {
        let len = self.hash.digest_len();
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        hkdf::expand_label(self.hash, self.as_bytes(), prefix, label, &[], &mut bytes[..len])?;
        Ok(Self {
            hash: self.hash,
            aead: self.aead,
            bytes,
        })
    }
}

/// Derive a child secret from `parent`.
///
/// Expands `parent` to one digest with the HkdfLabel `"tls13 " + label` and an
/// empty context. The child keeps the parent's hash and AEAD tags.
pub fn derive_secret(parent: &Secret, label: &[u8]) -> Result<Secret, Error> {
    parent.derive(label)
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.aead == other.aead
            && bool::from(self.as_bytes().ct_eq(other.as_bytes()))
    }
}

impl Eq for Secret {}

impl core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Secret")
            .field("hash", &self.hash)
            .field("aead", &self.aead)
            .finish_non_exhaustive()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
