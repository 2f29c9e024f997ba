use crate::F;

use super::Pseudorandom;
use p3_field::PrimeCharacteristicRing;
use p3_field::PrimeField64;
use sha3::{
    Shake128,
    digest::{ExtendableOutput, Update, XofReader},
};

/// Number of pseudorandom bytes drawn for one pseudorandom field element
const PRF_BYTES_PER_FE: usize = 8;

const KEY_LENGTH: usize = 32; // 32 bytes

/// Fixed domain separator of the field-output PRF. Bit-exact wire
/// compatibility constant; do not change.
const PRF_DOMAIN_SEP: [u8; 16] = [
    0xae, 0xae, 0x22, 0xff, 0x00, 0x01, 0xfa, 0xff, 0x21, 0xaf, 0x12, 0x00, 0x01, 0x11, 0xff, 0x00,
];

/// A pseudorandom function mapping to field elements.
/// It is implemented using Shake128, absorbing
/// `DS || key || epoch (BE) || chain_index (BE)` and squeezing 8 bytes per
/// output element, each reduced modulo p.
pub struct ShakePRFtoF<const OUTPUT_LEN_FE: usize>;

impl<const OUTPUT_LEN_FE: usize> Pseudorandom for ShakePRFtoF<OUTPUT_LEN_FE> {
    type Key = [u8; KEY_LENGTH];
    type Domain = [F; OUTPUT_LEN_FE];

    fn key_gen<R: rand::Rng>(rng: &mut R) -> Self::Key {
        rng.random()
    }

    fn apply(key: &Self::Key, epoch: u32, chain_index: u64) -> Self::Domain {
        // Create a new SHAKE128 instance
        let mut hasher = Shake128::default();

        // Hash the domain separator
        hasher.update(&PRF_DOMAIN_SEP);

        // Hash the key
        hasher.update(key);

        // Hash the epoch
        hasher.update(&epoch.to_be_bytes());

        // Hash the chain index
        hasher.update(&chain_index.to_be_bytes());

        // Finalize the hash process and create an XofReader
        let mut xof_reader = hasher.finalize_xof();

        // Mapping bytes to field elements
        std::array::from_fn(|_| {
            // Buffer to store the output
            let mut buf = [0u8; PRF_BYTES_PER_FE];

            // Read the extended output into the buffer
            xof_reader.read(&mut buf);

            // Mapping bytes to a field element, by reduction modulo p
            F::from_u64(u64::from_be_bytes(buf) % F::ORDER_U64)
        })
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        // No check is needed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OUTPUT_LEN: usize = 7;
    type PRF = ShakePRFtoF<OUTPUT_LEN>;

    #[test]
    fn test_shake_to_field_prf_key_not_all_same() {
        const K: usize = 10;

        let mut rng = rand::rng();
        let mut all_same_count = 0;

        for _ in 0..K {
            let key = PRF::key_gen(&mut rng);

            let first = key[0];
            if key.iter().all(|&x| x == first) {
                all_same_count += 1;
            }
        }

        assert!(
            all_same_count < K,
            "PRF key had identical elements in all {} trials",
            K
        );
    }

    #[test]
    fn test_outputs_are_canonical_field_elements() {
        let mut rng = rand::rng();
        let key = PRF::key_gen(&mut rng);

        for index in 0..100 {
            let output = PRF::apply(&key, 3, index);
            for fe in output {
                assert!(fe.as_canonical_u64() < F::ORDER_U64);
            }
        }
    }

    proptest! {
        #[test]
        fn proptest_apply_properties(
            key in prop::array::uniform32(any::<u8>()),
            epoch in any::<u32>(),
            index1 in any::<u64>(),
            index2 in any::<u64>()
        ) {
            // check output has correct length
            let result1 = PRF::apply(&key, epoch, index1);
            prop_assert_eq!(result1.len(), OUTPUT_LEN);

            // check determinism: same inputs produce same output
            let result2 = PRF::apply(&key, epoch, index1);
            prop_assert_eq!(result1, result2);

            // check uniqueness: different indices produce different outputs
            let other = PRF::apply(&key, epoch, index2);
            if index1 == index2 {
                prop_assert_eq!(result1, other);
            } else {
                prop_assert_ne!(result1, other);
            }

            // check different epochs produce different outputs
            let other_epoch = PRF::apply(&key, epoch.wrapping_add(1), index1);
            prop_assert_ne!(result1, other_epoch);
        }
    }
}
