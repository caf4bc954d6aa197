//! HMAC-based Key Derivation Function (RFC 5869) and the TLS 1.3
//! HKDF-Expand-Label construction built on it.

use zeroize::Zeroize;

use crate::crypto::suite::{HashAlgorithm, MAX_DIGEST_LEN};
use crate::error::Error;

/// Hash, HMAC and HKDF for one digest.
///
/// Implementations write `hash_len()` bytes into the front of `out`/`prk`;
/// callers pass buffers of at least that size.
pub trait Hkdf: Sync {
    /// Hash output length in bytes (e.g., 32 for SHA-256).
    fn hash_len(&self) -> usize;

    fn hash(&self, data: &[u8], out: &mut [u8]);

    fn hmac(&self, key: &[u8], data: &[u8], out: &mut [u8]) -> Result<(), Error>;

    /// HKDF-Extract: derive a pseudorandom key from salt and input keying material.
    fn extract(&self, salt: &[u8], ikm: &[u8], prk: &mut [u8]);

    /// HKDF-Expand: expand a pseudorandom key with info into output keying material.
    fn expand(&self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error>;
}

/// Hash, HMAC or PRK output, sized for the largest supported digest.
#[derive(Clone)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_LEN],
    len: usize,
}

impl Digest {
    fn empty(len: usize) -> Self {
        Self {
            bytes: [0u8; MAX_DIGEST_LEN],
            len,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl core::fmt::Debug for Digest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Digest").field("len", &self.len).finish_non_exhaustive()
    }
}

impl Drop for Digest {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

pub fn hash(alg: HashAlgorithm, data: &[u8]) -> Result<Digest, Error> {
    let hkdf = alg.hkdf()?;
    let mut out = Digest::empty(hkdf.hash_len());
    hkdf.hash(data, &mut out.bytes);
    Ok(out)
}

pub fn hmac(alg: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Digest, Error> {
    let hkdf = alg.hkdf()?;
    let mut out = Digest::empty(hkdf.hash_len());
    hkdf.hmac(key, data, &mut out.bytes)?;
    Ok(out)
}

/// HKDF-Extract. The PRK is one digest long.
pub fn extract(alg: HashAlgorithm, salt: &[u8], ikm: &[u8]) -> Result<Digest, Error> {
    let hkdf = alg.hkdf()?;
    let mut prk = Digest::empty(hkdf.hash_len());
    hkdf.extract(salt, ikm, &mut prk.bytes);
    Ok(prk)
}

/// HKDF-Expand into `okm`.
///
/// Fails with `DerivationFailure` when `okm` is longer than 255 digests and
/// with `InvalidLength` when `prk` is shorter than one digest.
pub fn expand(alg: HashAlgorithm, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
    let hkdf = alg.hkdf()?;
    if okm.len() > 255 * hkdf.hash_len() {
        return Err(Error::DerivationFailure);
    }
    hkdf.expand(prk, info, okm)
}

/// Label prefix of the TLS 1.3 key schedule.
pub const TLS13_LABEL_PREFIX: &[u8] = b"tls13 ";

// 2 (length) + 1 + 255 (label) + 1 + 255 (context)
const MAX_INFO_LEN: usize = 514;

/// HKDF-Expand-Label (RFC 8446 section 7.1).
///
/// Constructs the HkdfLabel structure:
///   uint16 length = out.len()
///   opaque label<7..255> = prefix + label
///   opaque context<0..255> = context
///
/// Then calls HKDF-Expand(secret, HkdfLabel, out.len()).
pub fn expand_label(
    alg: HashAlgorithm,
    secret: &[u8],
    prefix: &[u8],
    label: &[u8],
    context: &[u8],
    out: &mut [u8],
) -> Result<(), Error> {
    let full_label_len = prefix.len() + label.len();
    if full_label_len > 255 || context.len() > 255 || out.len() > u16::MAX as usize {
        return Err(Error::InvalidLength);
    }

    let mut info = [0u8; MAX_INFO_LEN];
    info[..2].copy_from_slice(&(out.len() as u16).to_be_bytes());
    info[2] = full_label_len as u8;
    let mut pos = 3;
    info[pos..pos + prefix.len()].copy_from_slice(prefix);
    pos += prefix.len();
    info[pos..pos + label.len()].copy_from_slice(label);
    pos += label.len();
    info[pos] = context.len() as u8;
    pos += 1;
    info[pos..pos + context.len()].copy_from_slice(context);
    pos += context.len();

    expand(alg, secret, &info[..pos], out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const JEFE: &[u8] = b"Jefe";
    const NOTHING: &[u8] = b"what do ya want for nothing?";

    // ---- RFC 4231 test case 2 ----

    #[test]
    fn hmac_sha256_jefe() {
        let mac = hmac(HashAlgorithm::Sha256, JEFE, NOTHING).unwrap();
        assert_eq!(
            mac.as_bytes(),
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn hmac_sha384_jefe() {
        let mac = hmac(HashAlgorithm::Sha384, JEFE, NOTHING).unwrap();
        assert_eq!(
            mac.as_bytes(),
            hex!(
                "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e"
                "8e2240ca5e69e2c78b3239ecfab21649"
            )
        );
    }

    #[test]
    fn hmac_sha512_jefe() {
        let mac = hmac(HashAlgorithm::Sha512, JEFE, NOTHING).unwrap();
        assert_eq!(
            mac.as_bytes(),
            hex!(
                "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554"
                "9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
            )
        );
    }

    #[test]
    fn sha256_empty() {
        let d = hash(HashAlgorithm::Sha256, b"").unwrap();
        assert_eq!(
            d.as_bytes(),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn sha384_output_len() {
        assert_eq!(hash(HashAlgorithm::Sha384, b"").unwrap().len(), 48);
    }

    // ---- RFC 5869 test case 1 ----

    #[test]
    fn hkdf_sha256_rfc5869_case1() {
        let ikm = [0x0bu8; 22];
        let salt = hex!("000102030405060708090a0b0c");
        let info = hex!("f0f1f2f3f4f5f6f7f8f9");

        let prk = extract(HashAlgorithm::Sha256, &salt, &ikm).unwrap();
        assert_eq!(
            prk.as_bytes(),
            hex!("077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5")
        );

        let mut okm = [0u8; 42];
        expand(HashAlgorithm::Sha256, prk.as_bytes(), &info, &mut okm).unwrap();
        assert_eq!(
            okm,
            hex!(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf"
                "34007208d5b887185865"
            )
        );
    }

    #[test]
    fn expand_rejects_oversized_output() {
        let prk = [0x42u8; 32];
        let mut okm = [0u8; 255 * 32 + 1];
        assert_eq!(
            expand(HashAlgorithm::Sha256, &prk, b"", &mut okm),
            Err(Error::DerivationFailure)
        );

        let mut okm = [0u8; 255 * 32];
        assert!(expand(HashAlgorithm::Sha256, &prk, b"", &mut okm).is_ok());
    }

    #[test]
    fn expand_rejects_short_prk() {
        let mut okm = [0u8; 16];
        assert_eq!(
            expand(HashAlgorithm::Sha256, &[0u8; 16], b"", &mut okm),
            Err(Error::InvalidLength)
        );
    }

    #[test]
    fn unsupported_hash_rejected() {
        assert_eq!(
            extract(HashAlgorithm::Sha1, b"salt", b"ikm").unwrap_err(),
            Error::UnsupportedAlgorithm
        );
        assert_eq!(
            hmac(HashAlgorithm::Md5, b"k", b"m").unwrap_err(),
            Error::UnsupportedAlgorithm
        );
    }

    // ---- HKDF-Expand-Label ----

    #[test]
    fn expand_label_rfc9001_client_in() {
        let dcid = hex!("8394c8f03e515708");
        let salt = hex!("38762cf7f55934b34d179ae6a4c80cadccbb7f0a");
        let initial_secret = extract(HashAlgorithm::Sha256, &salt, &dcid).unwrap();

        let mut client_secret = [0u8; 32];
        expand_label(
            HashAlgorithm::Sha256,
            initial_secret.as_bytes(),
            TLS13_LABEL_PREFIX,
            b"client in",
            &[],
            &mut client_secret,
        )
        .unwrap();

        assert_eq!(
            client_secret,
            hex!("c00cf151ca5be075ed0ebfb5c80323c42d6b7db67881289af4008f1f6c357aea")
        );
    }

    #[test]
    fn expand_label_rejects_long_label() {
        let mut out = [0u8; 32];
        let label = [b'a'; 250];
        assert_eq!(
            expand_label(
                HashAlgorithm::Sha256,
                &[0u8; 32],
                TLS13_LABEL_PREFIX,
                &label,
                &[],
                &mut out
            ),
            Err(Error::InvalidLength)
        );
    }

    #[test]
    fn expand_label_context_changes_output() {
        let secret = [0x11u8; 32];
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        expand_label(HashAlgorithm::Sha256, &secret, TLS13_LABEL_PREFIX, b"x", b"", &mut a)
            .unwrap();
        expand_label(HashAlgorithm::Sha256, &secret, TLS13_LABEL_PREFIX, b"x", b"c", &mut b)
            .unwrap();
        assert_ne!(a, b);
    }
}
