use rand::Rng;
use sha3::{Digest, Sha3_256};

use super::Pseudorandom;

const KEY_LENGTH: usize = 32; // 32 bytes

/// Fixed domain separator of the byte-output PRF. Bit-exact wire
/// compatibility constant; do not change.
const PRF_DOMAIN_SEP: [u8; 16] = [
    0x00, 0x01, 0x12, 0xff, 0x00, 0x01, 0xfa, 0xff, 0x00, 0xaf, 0x12, 0xff, 0x01, 0xfa, 0xff, 0x00,
];

/// A pseudorandom function with byte-string outputs, implemented using
/// SHA3-256:
///
/// `apply(K, e, i) = Truncate(SHA3-256(DS || K || e (BE) || i (BE)), OUTPUT_LEN)`
///
/// OUTPUT_LEN is in bytes and can be at most 32.
pub struct Sha3PRF<const OUTPUT_LEN: usize>;

impl<const OUTPUT_LEN: usize> Pseudorandom for Sha3PRF<OUTPUT_LEN> {
    type Key = [u8; KEY_LENGTH];
    type Domain = [u8; OUTPUT_LEN];

    fn key_gen<R: Rng>(rng: &mut R) -> Self::Key {
        rng.random()
    }

    fn apply(key: &Self::Key, epoch: u32, chain_index: u64) -> Self::Domain {
        let mut hasher = Sha3_256::new();

        hasher.update(PRF_DOMAIN_SEP);
        hasher.update(key);
        hasher.update(epoch.to_be_bytes());
        hasher.update(chain_index.to_be_bytes());

        let digest = hasher.finalize();
        std::array::from_fn(|i| digest[i])
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            OUTPUT_LEN <= 32,
            "SHA3 PRF: Output length must be at most 32 bytes"
        );
    }
}
