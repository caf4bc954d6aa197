#![no_main]

use libfuzzer_sys::fuzz_target;
use quic_protect::crypto::{derive_key, header_sample, AeadAlgorithm, HashAlgorithm, Secret};

fuzz_target!(|data: &[u8]| {
    // Sampling must reject short packets without panicking, and packet
    // number masking must be an involution.
    let Some((&pn_offset, packet)) = data.split_first() else {
        return;
    };
    let Ok(sample) = header_sample(packet, usize::from(pn_offset)) else {
        return;
    };

    for aead in AeadAlgorithm::ALL {
        let Ok(secret) = Secret::new(HashAlgorithm::Sha256, aead, &[7u8; 32]) else {
            continue;
        };
        let Ok(keys) = derive_key(&secret) else {
            continue;
        };
        // A successful sample implies at least 16 bytes of packet.
        let original = [packet[0], packet[1], packet[2], packet[3]];
        for len in 1..=4 {
            let mut pn = original;
            keys.xor_packet_number(&sample, &mut pn[..len]).unwrap();
            keys.xor_packet_number(&sample, &mut pn[..len]).unwrap();
            assert_eq!(pn, original);
        }
    }
});
