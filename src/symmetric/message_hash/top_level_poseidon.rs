use num_bigint::BigUint;
use p3_field::{PrimeCharacteristicRing, PrimeField64};
use rand::Rng;

use crate::array::FieldArray;
use crate::hypercube::{hypercube_find_layer, hypercube_part_size, map_to_vertex};
use crate::poseidon2_24;
use crate::symmetric::tweak_hash::poseidon::{SPONGE_WIDTH, poseidon_compress};
use crate::{F, MESSAGE_LENGTH};

use super::MessageHash;

use super::poseidon::{bytes_to_field_elements, epoch_tweak_field_elements};

/// A message hash that maps messages into the top layers of a hypercube.
///
/// It runs `POS_INVOCATIONS` independent Poseidon2 compressions, where
/// invocation `i` hashes `(i, P, tweak(epoch), rho, m)`. The concatenated
/// outputs are read as one big integer, reduced modulo the number of
/// vertices in layers `0..=FINAL_LAYER` of the hypercube
/// `[0, BASE-1]^DIMENSION`, and decoded into the vertex with that index.
/// The resulting coordinate vector is the chunk vector.
///
/// Restricting outputs to the top layers means a codeword's coordinate sum
/// is at least `(BASE - 1) * DIMENSION - FINAL_LAYER`; combined with a
/// target-sum check this makes encoding succeed exactly when the vertex
/// lands in layer `FINAL_LAYER`.
pub struct TopLevelPoseidonMessageHash<
    const POS_OUTPUT_LEN_PER_INV_FE: usize,
    const POS_INVOCATIONS: usize,
    const POS_OUTPUT_LEN_FE: usize,
    const DIMENSION: usize,
    const BASE: usize,
    const FINAL_LAYER: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
>;

impl<
    const POS_OUTPUT_LEN_PER_INV_FE: usize,
    const POS_INVOCATIONS: usize,
    const POS_OUTPUT_LEN_FE: usize,
    const DIMENSION: usize,
    const BASE: usize,
    const FINAL_LAYER: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
> MessageHash
    for TopLevelPoseidonMessageHash<
        POS_OUTPUT_LEN_PER_INV_FE,
        POS_INVOCATIONS,
        POS_OUTPUT_LEN_FE,
        DIMENSION,
        BASE,
        FINAL_LAYER,
        TWEAK_LEN_FE,
        MSG_LEN_FE,
        PARAMETER_LEN,
        RAND_LEN,
    >
{
    type Parameter = FieldArray<PARAMETER_LEN>;

    type Randomness = FieldArray<RAND_LEN>;

    const DIMENSION: usize = DIMENSION;

    const BASE: usize = BASE;

    fn rand<R: Rng>(rng: &mut R) -> Self::Randomness {
        FieldArray(rng.random())
    }

    fn apply(
        parameter: &Self::Parameter,
        epoch: u32,
        randomness: &Self::Randomness,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Vec<u8> {
        let perm = poseidon2_24();

        let epoch_fe = epoch_tweak_field_elements::<TWEAK_LEN_FE>(epoch);
        let message_fe = bytes_to_field_elements::<MSG_LEN_FE>(message);

        // one compression per invocation, distinguished by the leading counter
        let mut outputs = Vec::with_capacity(POS_OUTPUT_LEN_FE);
        for invocation in 0..POS_INVOCATIONS {
            let input: Vec<F> = std::iter::once(F::from_u64(invocation as u64))
                .chain(parameter.iter().copied())
                .chain(epoch_fe.iter().copied())
                .chain(randomness.iter().copied())
                .chain(message_fe.iter().copied())
                .collect();

            let output: [F; POS_OUTPUT_LEN_PER_INV_FE] = poseidon_compress(&perm, &input);
            outputs.extend_from_slice(&output);
        }

        // read the concatenated outputs as A = sum_i fe_i * p^i, and reduce
        // modulo the number of vertices in the top layers
        let p = BigUint::from(F::ORDER_U64);
        let mut acc = BigUint::from(0u32);
        for fe in outputs.iter().rev() {
            acc = acc * &p + BigUint::from(fe.as_canonical_u64());
        }
        let index = acc % hypercube_part_size(BASE, DIMENSION, FINAL_LAYER);

        // locate the layer, then decode the in-layer offset into a vertex
        let (layer, offset) = hypercube_find_layer(BASE, DIMENSION, &index);
        map_to_vertex(BASE, DIMENSION, layer, offset)
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        use crate::hypercube::MAX_DIMENSION;

        assert_eq!(
            POS_OUTPUT_LEN_FE,
            POS_INVOCATIONS * POS_OUTPUT_LEN_PER_INV_FE,
            "Top-Level Poseidon Message Hash: output length must be invocations times per-invocation length"
        );
        assert!(
            POS_OUTPUT_LEN_PER_INV_FE <= SPONGE_WIDTH,
            "Top-Level Poseidon Message Hash: per-invocation output exceeds the permutation width"
        );
        assert!(
            POS_INVOCATIONS <= 1 << 8,
            "Top-Level Poseidon Message Hash: at most 2^8 invocations supported"
        );
        assert!(
            1 + PARAMETER_LEN + TWEAK_LEN_FE + RAND_LEN + MSG_LEN_FE <= SPONGE_WIDTH,
            "Top-Level Poseidon Message Hash: compression input exceeds the permutation width"
        );
        assert!(
            BASE <= 1 << 8,
            "Top-Level Poseidon Message Hash: Base must be at most 2^8"
        );
        assert!(
            DIMENSION <= MAX_DIMENSION,
            "Top-Level Poseidon Message Hash: Dimension exceeds the tabulated hypercube sizes"
        );
        assert!(
            FINAL_LAYER <= (BASE - 1) * DIMENSION,
            "Top-Level Poseidon Message Hash: final layer out of range"
        );

        // the accumulated output must dominate the reduced domain
        let part_bits = hypercube_part_size(BASE, DIMENSION, FINAL_LAYER).bits();
        let output_bits = (POS_OUTPUT_LEN_FE as u64) * 30;
        assert!(
            output_bits >= part_bits,
            "Top-Level Poseidon Message Hash: not enough output to cover the top layers"
        );
    }
}

// Example instantiation: dimension 64, base 8, top 225 layers
pub type TopLevelPoseidonMessageHash64x8 =
    TopLevelPoseidonMessageHash<13, 2, 26, 64, 8, 224, 2, 9, 5, 5>;

#[cfg(test)]
mod tests {
    use super::*;

    type TestMH = TopLevelPoseidonMessageHash64x8;

    #[test]
    fn test_internal_consistency() {
        TestMH::internal_consistency_check();
    }

    #[test]
    fn test_apply_outputs_top_layer_vertex() {
        let mut rng = rand::rng();

        let parameter = FieldArray(rng.random());
        let randomness = TestMH::rand(&mut rng);
        let message: [u8; MESSAGE_LENGTH] = rng.random();

        let chunks = TestMH::apply(&parameter, 3, &randomness, &message);

        assert_eq!(chunks.len(), TestMH::DIMENSION);
        for &chunk in &chunks {
            assert!((chunk as usize) < TestMH::BASE);
        }

        // the vertex must lie in one of the layers 0..=FINAL_LAYER, i.e.
        // its coordinate sum is at least (BASE - 1) * DIMENSION - FINAL_LAYER
        let sum: usize = chunks.iter().map(|&x| x as usize).sum();
        assert!(sum >= (TestMH::BASE - 1) * TestMH::DIMENSION - 224);
    }

    #[test]
    fn test_apply_deterministic() {
        let mut rng = rand::rng();

        let parameter = FieldArray(rng.random());
        let randomness = TestMH::rand(&mut rng);
        let message: [u8; MESSAGE_LENGTH] = rng.random();

        let first = TestMH::apply(&parameter, 3, &randomness, &message);
        let second = TestMH::apply(&parameter, 3, &randomness, &message);
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_distinguishes_inputs() {
        let mut rng = rand::rng();

        let parameter = FieldArray(rng.random());
        let randomness = TestMH::rand(&mut rng);
        let other_randomness = TestMH::rand(&mut rng);
        let message: [u8; MESSAGE_LENGTH] = rng.random();

        let base = TestMH::apply(&parameter, 3, &randomness, &message);

        assert_ne!(base, TestMH::apply(&parameter, 4, &randomness, &message));
        assert_ne!(
            base,
            TestMH::apply(&parameter, 3, &other_randomness, &message)
        );
    }
}
