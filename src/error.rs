/// Packet protection error.
///
/// Every variant except [`Error::AuthenticationFailure`] signals a
/// configuration or programming error at the call site. Authentication
/// failures are routine: the packet is dropped and the connection continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Hash or AEAD tag outside the supported set (MD5, SHA-1, SHA-224, or a
    /// cipher compiled out of this build).
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,
    /// Salt, connection ID, secret, sample or label length outside protocol bounds.
    #[error("invalid length")]
    InvalidLength,
    /// AEAD tag did not verify. No plaintext is released.
    #[error("authentication failure")]
    AuthenticationFailure,
    /// HKDF-Expand asked for more than 255 hash blocks.
    #[error("key derivation failure")]
    DerivationFailure,
    /// Caller-provided buffer too small.
    #[error("buffer too small, need {needed} bytes")]
    BufferTooSmall { needed: usize },
    /// Packet number above 2^62 - 1.
    #[error("packet number out of range")]
    InvalidPacketNumber,
}

impl Error {
    /// Whether the connection can continue after this error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Error::AuthenticationFailure)
    }
}
