use num_bigint::BigUint;
use p3_field::{PrimeCharacteristicRing, PrimeField64};
use rand::Rng;

use crate::array::FieldArray;
use crate::poseidon2_24;
use crate::symmetric::tweak_hash::poseidon::{SPONGE_WIDTH, poseidon_sponge};
use crate::{F, MESSAGE_LENGTH, TWEAK_SEPARATOR_FOR_MESSAGE_HASH};

use super::MessageHash;

/// Converts a byte string into `NUM_FE` field elements: the bytes are read
/// as one little-endian integer, which is then decomposed in base p.
pub(crate) fn bytes_to_field_elements<const NUM_FE: usize>(bytes: &[u8]) -> [F; NUM_FE] {
    let p = BigUint::from(F::ORDER_U64);
    let mut acc = BigUint::from_bytes_le(bytes);

    std::array::from_fn(|_| {
        let digit = u64::try_from(&acc % &p).expect("base-p digit fits in u64");
        acc /= &p;
        F::from_u64(digit)
    })
}

/// Encodes an epoch as `TWEAK_LEN_FE` field elements: the integer
/// `(epoch << 8) | 0x02` is decomposed in base p. The low byte is the
/// message-hash separator, keeping these tweaks disjoint from chain and tree
/// tweaks.
pub(crate) fn epoch_tweak_field_elements<const TWEAK_LEN_FE: usize>(
    epoch: u32,
) -> [F; TWEAK_LEN_FE] {
    let mut acc = ((epoch as u64) << 8) | (TWEAK_SEPARATOR_FOR_MESSAGE_HASH as u64);

    std::array::from_fn(|_| {
        let digit = acc % F::ORDER_U64;
        acc /= F::ORDER_U64;
        F::from_u64(digit)
    })
}

/// Interprets field elements as the integer `A = sum_i fe_i * p^i` and
/// returns the first `num_chunks` base-`base` digits of `A`, least
/// significant digit first.
pub(crate) fn field_elements_to_chunks(
    field_elements: &[F],
    base: usize,
    num_chunks: usize,
) -> Vec<u8> {
    let p = BigUint::from(F::ORDER_U64);
    let base_big = BigUint::from(base);

    // accumulate with fe_0 as the least significant digit
    let mut acc = BigUint::from(0u32);
    for fe in field_elements.iter().rev() {
        acc = acc * &p + BigUint::from(fe.as_canonical_u64());
    }

    let mut chunks = Vec::with_capacity(num_chunks);
    for _ in 0..num_chunks {
        let digit = u64::try_from(&acc % &base_big).expect("digit fits in u64");
        chunks.push(digit as u8);
        acc /= &base_big;
    }
    chunks
}

/// A message hash implemented using a Poseidon2 sponge.
///
/// The sponge capacity is initialized with the parameter followed by the
/// epoch tweak; the rate absorbs `rho || message` (the message converted to
/// field elements by base-p decomposition). The squeezed elements are read
/// as one big integer and written in base `BASE` to produce the chunks.
///
/// Lengths with the `_FE` suffix, PARAMETER_LEN, and RAND_LEN are in the
/// unit "number of field elements".
pub struct PoseidonMessageHash<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const HASH_LEN_FE: usize,
    const NUM_CHUNKS: usize,
    const BASE: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
>;

impl<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const HASH_LEN_FE: usize,
    const NUM_CHUNKS: usize,
    const BASE: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
> MessageHash
    for PoseidonMessageHash<
        PARAMETER_LEN,
        RAND_LEN,
        HASH_LEN_FE,
        NUM_CHUNKS,
        BASE,
        TWEAK_LEN_FE,
        MSG_LEN_FE,
    >
{
    type Parameter = FieldArray<PARAMETER_LEN>;

    type Randomness = FieldArray<RAND_LEN>;

    const DIMENSION: usize = NUM_CHUNKS;

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

        let message_fe = bytes_to_field_elements::<MSG_LEN_FE>(message);
        let epoch_fe = epoch_tweak_field_elements::<TWEAK_LEN_FE>(epoch);

        // capacity = parameter || epoch tweak, absorbed input = rho || message
        let capacity_value: Vec<F> = parameter.iter().chain(epoch_fe.iter()).copied().collect();
        let input: Vec<F> = randomness
            .iter()
            .chain(message_fe.iter())
            .copied()
            .collect();

        let hash: [F; HASH_LEN_FE] = poseidon_sponge(&perm, &capacity_value, &input);

        field_elements_to_chunks(&hash, BASE, NUM_CHUNKS)
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            BASE <= 1 << 8,
            "Poseidon Message Hash: Base must be at most 2^8"
        );
        assert!(
            NUM_CHUNKS <= 1 << 8,
            "Poseidon Message Hash: Dimension must be at most 2^8"
        );
        assert!(
            PARAMETER_LEN + TWEAK_LEN_FE < SPONGE_WIDTH,
            "Poseidon Message Hash: Parameter and tweak exceed the sponge capacity"
        );
        assert!(
            HASH_LEN_FE <= SPONGE_WIDTH - PARAMETER_LEN - TWEAK_LEN_FE,
            "Poseidon Message Hash: Output length exceeds the sponge rate"
        );

        // the message must fit into MSG_LEN_FE field elements
        let bits_per_fe = f64::floor(f64::log2(F::ORDER_U64 as f64));
        assert!(
            bits_per_fe * (MSG_LEN_FE as f64) >= (8 * MESSAGE_LENGTH) as f64,
            "Poseidon Message Hash: not enough field elements to encode the message"
        );
    }
}

// Example instantiations, dimensioned for chunk sizes 1, 2, 4, and base 256
pub type PoseidonMessageHashW1 = PoseidonMessageHash<5, 5, 5, 155, 2, 2, 9>;
pub type PoseidonMessageHashW2 = PoseidonMessageHash<5, 5, 5, 78, 4, 2, 9>;
pub type PoseidonMessageHashW4 = PoseidonMessageHash<5, 5, 5, 39, 16, 2, 9>;
pub type PoseidonMessageHash256 = PoseidonMessageHash<5, 5, 5, 32, 256, 2, 9>;
