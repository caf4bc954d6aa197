#![no_main]

use libfuzzer_sys::fuzz_target;
use quic_protect::crypto::{derive_key, AeadAlgorithm, HashAlgorithm, Secret};
use quic_protect::Error;

fuzz_target!(|data: &[u8]| {
    // Opening arbitrary bytes must never panic and never authenticate.
    if data.len() < 3 {
        return;
    }
    let Some(hash) = HashAlgorithm::from_u8(3 + data[0] % 3) else {
        return;
    };
    let Some(aead) = AeadAlgorithm::from_u8(data[1] % 3) else {
        return;
    };
    let material = [0x42u8; 64];
    let Ok(secret) = Secret::new(hash, aead, &material[..hash.digest_len()]) else {
        return;
    };
    let Ok(keys) = derive_key(&secret) else {
        return;
    };

    let split = usize::from(data[2]).min(data.len() - 3);
    let (aad, ciphertext) = data[3..].split_at(split);
    let pn = u64::from(data[0]) << 8 | u64::from(data[1]);

    let mut out = [0u8; 2048];
    if ciphertext.len() > out.len() {
        return;
    }
    assert_eq!(
        keys.open(pn, aad, ciphertext, &mut out),
        Err(Error::AuthenticationFailure)
    );
    assert!(out.iter().all(|&b| b == 0));
});
