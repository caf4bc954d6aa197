#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! QUIC packet protection: traffic secret derivation, payload AEAD and
//! header protection, with a key lifecycle manager on top.

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod crypto;
pub mod error;
pub mod keys;

pub use crypto::{
    derive_initial_secrets, derive_key, derive_secret, free_key, AeadAlgorithm, DirectionalKeys,
    HashAlgorithm, Labels, Secret,
};
pub use error::Error;
pub use keys::{ConnectionKeys, KeyPhase, Level, Role};
