//! QUIC key derivation.
//!
//! Turns traffic secrets into packet protection keys and derives the
//! Initial secrets from a connection ID and version salt.

use zeroize::Zeroize;

use crate::crypto::directional::DirectionalKeys;
use crate::crypto::hkdf::{self, TLS13_LABEL_PREFIX};
use crate::crypto::secret::Secret;
use crate::crypto::suite::{AeadAlgorithm, HashAlgorithm, MAX_KEY_LEN};
use crate::crypto::NONCE_LEN;
use crate::error::Error;

/// QUIC v1 Initial salt (RFC 9001 section 5.2).
pub const INITIAL_SALT_V1: [u8; 20] = [
    0x38, 0x76, 0x2c, 0xf7, 0xf5, 0x59, 0x34, 0xb3, 0x4d, 0x17, 0x9a, 0xe6, 0xa4, 0xc8, 0x0c,
    0xad, 0xcc, 0xbb, 0x7f, 0x0a,
];

/// Required length of a version salt.
pub const INITIAL_SALT_LEN: usize = 20;

/// Longest connection ID accepted for Initial secret derivation.
pub const MAX_CID_LEN: usize = 20;

/// HKDF-Expand-Label labels used by the key schedule.
///
/// Each label is appended to `prefix` when the HkdfLabel is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub prefix: &'static [u8],
    pub key: &'static [u8],
    pub iv: &'static [u8],
    pub hp: &'static [u8],
    pub client_initial: &'static [u8],
    pub server_initial: &'static [u8],
    pub key_update: &'static [u8],
}

impl Labels {
    /// `"quic "`-prefixed labels: `quic key`, `quic iv`, `quic hp`,
    /// `quic client in`, `quic server in`, `quic ku`.
    pub const QUIC: Labels = Labels {
        prefix: b"quic ",
        key: b"key",
        iv: b"iv",
        hp: b"hp",
        client_initial: b"client in",
        server_initial: b"server in",
        key_update: b"ku",
    };

    /// RFC 9001 labels under the TLS 1.3 prefix.
    pub const RFC9001: Labels = Labels {
        prefix: TLS13_LABEL_PREFIX,
        key: b"quic key",
        iv: b"quic iv",
        hp: b"quic hp",
        client_initial: b"client in",
        server_initial: b"server in",
        key_update: b"quic ku",
    };
}

impl Default for Labels {
    fn default() -> Self {
        Self::QUIC
    }
}

/// Derive packet protection keys from a traffic secret with [`Labels::QUIC`].
pub fn derive_key(secret: &Secret) -> Result<DirectionalKeys, Error> {
    derive_key_with(secret, &Labels::QUIC)
}

/// Derive the AEAD key, static IV and header protection key from `secret`.
///
/// Key sizes come from the secret's AEAD tag. Fails with
/// `UnsupportedAlgorithm` if either tag has no implementation.
pub fn derive_key_with(secret: &Secret, labels: &Labels) -> Result<DirectionalKeys, Error> {
    let hash = secret.hash_algorithm();
    hash.hkdf()?;
    let params = secret.aead_algorithm().params()?;

    let mut key = [0u8; MAX_KEY_LEN];
    let mut iv = [0u8; NONCE_LEN];
    let mut hp_key = [0u8; MAX_KEY_LEN];
    let key = &mut key[..params.key_len];
    let iv_out = &mut iv[..params.iv_len];
    let hp_key = &mut hp_key[..params.hp_key_len];

    let s = secret.as_bytes();
    let result = hkdf::expand_label(hash, s, labels.prefix, labels.key, &[], key)
        .and_then(|()| hkdf::expand_label(hash, s, labels.prefix, labels.iv, &[], iv_out))
        .and_then(|()| hkdf::expand_label(hash, s, labels.prefix, labels.hp, &[], hp_key))
        .and_then(|()| DirectionalKeys::from_parts(params, key, iv, hp_key));

    key.zeroize();
    iv.zeroize();
    hp_key.zeroize();

    if result.is_ok() {
        tracing::debug!(?hash, aead = ?params.algorithm, "derived packet protection keys");
    }
    result
}

/// Release a key bundle. Key material is zeroized.
pub fn free_key(keys: DirectionalKeys) {
    tracing::debug!(aead = ?keys.aead_algorithm(), "released packet protection keys");
    drop(keys);
}

/// Derive the client and server Initial secrets with [`Labels::QUIC`].
pub fn derive_initial_secrets(
    connection_id: &[u8],
    salt: &[u8],
) -> Result<(Secret, Secret), Error> {
    derive_initial_secrets_with(connection_id, salt, &Labels::QUIC)
}

/// Derive the Initial secrets from the client's Destination Connection ID.
///
/// `initial = HKDF-Extract(salt, connection_id)` with SHA-256, then the client
/// and server secrets are expanded from it. Both are tagged SHA-256 /
/// AES-128-GCM.
pub fn derive_initial_secrets_with(
    connection_id: &[u8],
    salt: &[u8],
    labels: &Labels,
) -> Result<(Secret, Secret), Error> {
    if connection_id.is_empty() || connection_id.len() > MAX_CID_LEN {
        return Err(Error::InvalidLength);
    }
    if salt.len() != INITIAL_SALT_LEN {
        return Err(Error::InvalidLength);
    }

    let hash = HashAlgorithm::Sha256;
    let initial = hkdf::extract(hash, salt, connection_id)?;
    let initial = Secret::new(hash, AeadAlgorithm::Aes128Gcm, initial.as_bytes())?;

    let client = initial.expand(labels.prefix, labels.client_initial)?;
    let server = initial.expand(labels.prefix, labels.server_initial)?;

    tracing::debug!(cid_len = connection_id.len(), "derived initial secrets");
    Ok((client, server))
}
