//! Cryptographic primitives and key derivation for QUIC packet protection.
//!
//! QUIC needs three things from its crypto layer: HKDF for deriving keys
//! from traffic secrets, an AEAD for packet payloads, and header protection
//! for hiding packet numbers. The cipher suite is picked at runtime from the
//! algorithm tags carried by a [`Secret`]; see [`suite`] for the tables.

mod aead;
mod directional;
mod header_protection;
pub mod hkdf;
pub mod key_schedule;
pub mod rustcrypto;
mod secret;
pub mod suite;

pub use aead::{Aead, PacketCipher};
pub use directional::DirectionalKeys;
pub use header_protection::{
    header_sample, sample_at, HeaderCipher, HeaderProtection, SAMPLE_OFFSET,
};
pub use hkdf::{Digest, Hkdf};
pub use key_schedule::{
    derive_initial_secrets, derive_initial_secrets_with, derive_key, derive_key_with, free_key,
    Labels,
};
pub use secret::{derive_secret, Secret};
pub use suite::{AeadAlgorithm, HashAlgorithm};

/// AEAD nonce length; every supported AEAD uses 96-bit nonces.
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length.
pub const TAG_LEN: usize = 16;

/// Header protection sample length.
pub const SAMPLE_LEN: usize = 16;

/// Largest packet number QUIC can encode (2^62 - 1).
pub const MAX_PACKET_NUMBER: u64 = (1 << 62) - 1;
