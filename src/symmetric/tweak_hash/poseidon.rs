use p3_field::{PrimeCharacteristicRing, PrimeField64};
use p3_symmetric::CryptographicPermutation;
use rand::Rng;

use crate::TWEAK_SEPARATOR_FOR_CHAIN_HASH;
use crate::TWEAK_SEPARATOR_FOR_TREE_HASH;
use crate::array::FieldArray;
use crate::poseidon2_24;
use crate::F;

use super::TweakableHash;

/// The state width of the permutation used for hashing. A single width
/// covers chain steps (one block), sibling merges (two blocks), and the
/// sponge over a long vector of chain ends.
pub(crate) const SPONGE_WIDTH: usize = 24;

/// Enum to implement tweaks.
#[derive(Debug)]
pub enum PoseidonTweak {
    TreeTweak {
        level: u8,
        pos_in_level: u32,
    },
    ChainTweak {
        epoch: u32,
        chain_index: u8,
        pos_in_chain: u8,
    },
}

impl PoseidonTweak {
    pub fn to_field_elements<const TWEAK_LEN: usize>(&self) -> [F; TWEAK_LEN] {
        // We first represent the entire tweak as one big integer
        let mut acc = match self {
            Self::TreeTweak {
                level,
                pos_in_level,
            } => {
                ((*level as u128) << 40)
                    | ((*pos_in_level as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_TREE_HASH as u128)
            }
            Self::ChainTweak {
                epoch,
                chain_index,
                pos_in_chain,
            } => {
                ((*epoch as u128) << 24)
                    | ((*chain_index as u128) << 16)
                    | ((*pos_in_chain as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_CHAIN_HASH as u128)
            }
        };

        // Now we interpret this integer in base-p to get field elements
        std::array::from_fn(|_| {
            let digit = (acc % F::ORDER_U64 as u128) as u64;
            acc /= F::ORDER_U64 as u128;
            F::from_u64(digit)
        })
    }
}

/// Poseidon Compression Function
///
/// Computes:
///     PoseidonCompress(x) = Truncate(PoseidonPermute(x) + x)
///
/// The input is zero-padded to the permutation width. Inputs that are
/// distinct but identical after zero-padding (e.g. `[A, B]` and `[A, B, 0]`)
/// produce the same output; callers needing to distinguish them must encode
/// the length into the input.
///
/// Panics:
/// - If `input.len() > SPONGE_WIDTH`
/// - If `OUT_LEN > SPONGE_WIDTH`
pub(crate) fn poseidon_compress<P, const OUT_LEN: usize>(perm: &P, input: &[F]) -> [F; OUT_LEN]
where
    P: CryptographicPermutation<[F; SPONGE_WIDTH]>,
{
    assert!(
        input.len() <= SPONGE_WIDTH,
        "Poseidon Compression: Input longer than permutation width."
    );

    // Copy the input into a fixed-width buffer, zero-padding unused elements.
    let mut padded_input = [F::ZERO; SPONGE_WIDTH];
    padded_input[..input.len()].copy_from_slice(input);

    // Permute, then feed the input forward into the state.
    let mut state = padded_input;
    perm.permute_mut(&mut state);
    for i in 0..SPONGE_WIDTH {
        state[i] += padded_input[i];
    }

    // Truncate and return the first `OUT_LEN` elements of the state.
    state[..OUT_LEN]
        .try_into()
        .expect("OUT_LEN is larger than permutation width")
}

/// Poseidon Sponge Hash Function
///
/// Absorbs an arbitrary-length input using the Poseidon sponge construction
/// and outputs `OUT_LEN` field elements. Domain separation is achieved by
/// injecting a `capacity_value` into the state.
///
/// ### Sponge Construction
/// This follows the classic sponge structure:
/// - **Absorption**: inputs are added chunk-by-chunk into the first `rate`
///   elements of the state, with one permutation per chunk. The final chunk
///   is implicitly zero-padded: padding only ever adds zero to the state.
/// - **Squeezing**: outputs are read from the first `rate` elements of the
///   state, permuted as needed.
///
/// ### Panics
/// - If `capacity_value.len() >= SPONGE_WIDTH`
pub(crate) fn poseidon_sponge<P, const OUT_LEN: usize>(
    perm: &P,
    capacity_value: &[F],
    input: &[F],
) -> [F; OUT_LEN]
where
    P: CryptographicPermutation<[F; SPONGE_WIDTH]>,
{
    // The capacity length must be strictly smaller than the width so that
    // the rate is non-zero.
    assert!(
        capacity_value.len() < SPONGE_WIDTH,
        "Poseidon Sponge: Capacity length must be smaller than the state width."
    );
    let rate = SPONGE_WIDTH - capacity_value.len();

    // initialize: capacity part of the state holds the capacity value
    let mut state = [F::ZERO; SPONGE_WIDTH];
    state[rate..].copy_from_slice(capacity_value);

    // absorb all full chunks
    let mut chunks = input.chunks_exact(rate);
    for chunk in &mut chunks {
        for (i, x) in chunk.iter().enumerate() {
            state[i] += *x;
        }
        perm.permute_mut(&mut state);
    }

    // absorb the remainder, if any
    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        for (i, x) in remainder.iter().enumerate() {
            state[i] += *x;
        }
        perm.permute_mut(&mut state);
    }

    // squeeze
    let mut out = [F::ZERO; OUT_LEN];
    let mut out_idx = 0;
    while out_idx < OUT_LEN {
        let chunk_size = (OUT_LEN - out_idx).min(rate);
        out[out_idx..out_idx + chunk_size].copy_from_slice(&state[..chunk_size]);
        out_idx += chunk_size;
        if out_idx < OUT_LEN {
            perm.permute_mut(&mut state);
        }
    }
    out
}

/// A tweakable hash function implemented using Poseidon2 over BabyBear.
///
/// All hashing runs through a width-24 sponge whose capacity is initialized
/// with the parameter followed by the tweak, so every `(P, T)` pair keys an
/// independent-looking function.
///
/// Note: HASH_LEN, TWEAK_LEN, and PARAMETER_LEN must be given in the unit
/// "number of field elements".
#[derive(Clone)]
pub struct PoseidonTweakHash<
    const PARAMETER_LEN: usize,
    const HASH_LEN: usize,
    const TWEAK_LEN: usize,
>;

impl<const PARAMETER_LEN: usize, const HASH_LEN: usize, const TWEAK_LEN: usize> TweakableHash
    for PoseidonTweakHash<PARAMETER_LEN, HASH_LEN, TWEAK_LEN>
{
    type Parameter = FieldArray<PARAMETER_LEN>;

    type Tweak = PoseidonTweak;

    type Domain = FieldArray<HASH_LEN>;

    fn rand_parameter<R: Rng>(rng: &mut R) -> Self::Parameter {
        FieldArray(rng.random())
    }

    fn rand_domain<R: Rng>(rng: &mut R) -> Self::Domain {
        FieldArray(rng.random())
    }

    fn tree_tweak(level: u8, pos_in_level: u32) -> Self::Tweak {
        PoseidonTweak::TreeTweak {
            level,
            pos_in_level,
        }
    }

    fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self::Tweak {
        PoseidonTweak::ChainTweak {
            epoch,
            chain_index,
            pos_in_chain,
        }
    }

    fn apply(
        parameter: &Self::Parameter,
        tweak: &Self::Tweak,
        message: &[Self::Domain],
    ) -> Self::Domain {
        let perm = poseidon2_24();

        // capacity = parameter || tweak, absorbed input = message blocks
        let tweak_fe = tweak.to_field_elements::<TWEAK_LEN>();
        let capacity_value: Vec<F> = parameter
            .iter()
            .chain(tweak_fe.iter())
            .copied()
            .collect();
        let input: Vec<F> = message.iter().flat_map(|block| block.iter()).copied().collect();

        FieldArray(poseidon_sponge::<_, HASH_LEN>(&perm, &capacity_value, &input))
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            PARAMETER_LEN + TWEAK_LEN < SPONGE_WIDTH,
            "Poseidon Tweak Hash: Parameter and tweak exceed the sponge capacity"
        );
        assert!(
            HASH_LEN <= SPONGE_WIDTH - PARAMETER_LEN - TWEAK_LEN,
            "Poseidon Tweak Hash: Output length exceeds the sponge rate"
        );

        let bits_per_fe = f64::floor(f64::log2(F::ORDER_U64 as f64));
        let bits_for_tree_tweak = f64::from(32 + 8_u32);
        let bits_for_chain_tweak = f64::from(32 + 8 + 8 + 8_u32);
        let tweak_fe_bits = bits_per_fe * f64::from(TWEAK_LEN as u32);
        assert!(
            tweak_fe_bits >= bits_for_tree_tweak,
            "Poseidon Tweak Hash: not enough field elements to encode the tree tweak"
        );
        assert!(
            tweak_fe_bits >= bits_for_chain_tweak,
            "Poseidon Tweak Hash: not enough field elements to encode the chain tweak"
        );
    }
}

// Example instantiations
#[cfg(test)]
pub type PoseidonTweak57 = PoseidonTweakHash<5, 7, 2>;
#[cfg(test)]
pub type PoseidonTweak44 = PoseidonTweakHash<4, 4, 3>;
