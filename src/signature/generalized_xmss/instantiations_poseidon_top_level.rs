//! Instantiations based on the top-level Poseidon2 message hash: messages
//! are mapped into the top layers of a hypercube, and the target-sum check
//! degenerates into a layer check.

use super::GeneralizedXMSSSignatureScheme;
use crate::{
    inc_encoding::target_sum::TargetSumEncoding,
    symmetric::{
        message_hash::top_level_poseidon::TopLevelPoseidonMessageHash64x8,
        prf::shake_to_field::ShakePRFtoF, tweak_hash::poseidon::PoseidonTweakHash,
    },
};

const HASH_LEN_FE: usize = 7;

type Prf = ShakePRFtoF<HASH_LEN_FE>;
type Th = PoseidonTweakHash<5, HASH_LEN_FE, 2>;

/// Instantiations with lifetime 2^18
pub mod lifetime_2_to_the_18 {
    use super::*;

    const LOG_LIFETIME: usize = 18;

    /// Dimension 64, base 8, final layer 224. The message hash restricts
    /// outputs to layers 0..=224, whose vertices have chunk sum at least
    /// `7 * 64 - 224 = 224`; the target sum of 224 therefore accepts
    /// exactly the vertices in layer 224.
    pub type SIGTopLevelTargetSumLifetime18Dim64Base8 = GeneralizedXMSSSignatureScheme<
        Prf,
        TargetSumEncoding<TopLevelPoseidonMessageHash64x8, 224>,
        Th,
        LOG_LIFETIME,
    >;
}
