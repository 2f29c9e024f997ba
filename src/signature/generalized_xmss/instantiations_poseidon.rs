//! Instantiations based on the Poseidon2 tweakable hash over BabyBear.
//! Parameters are 5 field elements, hashes 7 field elements, tweaks 2 field
//! elements, and messages are encoded into 9 field elements.

use super::GeneralizedXMSSSignatureScheme;
use crate::{
    inc_encoding::{basic_winternitz::WinternitzEncoding, target_sum::TargetSumEncoding},
    symmetric::{
        message_hash::poseidon::{
            PoseidonMessageHash256, PoseidonMessageHashW1, PoseidonMessageHashW2,
            PoseidonMessageHashW4,
        },
        prf::shake_to_field::ShakePRFtoF,
        tweak_hash::poseidon::PoseidonTweakHash,
    },
};

const HASH_LEN_FE: usize = 7;

type Prf = ShakePRFtoF<HASH_LEN_FE>;
type Th = PoseidonTweakHash<5, HASH_LEN_FE, 2>;

/// Instantiations with lifetime 2^18
pub mod lifetime_2_to_the_18 {
    use super::*;

    const LOG_LIFETIME: usize = 18;

    /// Instantiations based on the basic Winternitz encoding
    pub mod winternitz {
        use super::*;

        /// 155 binary message chunks, 8 checksum chunks
        pub type SIGWinternitzLifetime18W1 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<PoseidonMessageHashW1, 1, 8>,
            Th,
            LOG_LIFETIME,
        >;

        /// 78 message chunks of 2 bits, 4 checksum chunks
        pub type SIGWinternitzLifetime18W2 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<PoseidonMessageHashW2, 2, 4>,
            Th,
            LOG_LIFETIME,
        >;

        /// 39 message chunks of 4 bits, 3 checksum chunks
        pub type SIGWinternitzLifetime18W4 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<PoseidonMessageHashW4, 4, 3>,
            Th,
            LOG_LIFETIME,
        >;
    }

    /// Instantiations based on the Target-Sum encoding
    pub mod target_sum {
        use super::*;

        /// 32 chunks with base 256, target at the expected sum
        /// `compute_optimal_target(32, 8, 1.0) = 4080`
        pub type SIGTargetSumLifetime18W8NoOff = GeneralizedXMSSSignatureScheme<
            Prf,
            TargetSumEncoding<PoseidonMessageHash256, 4080>,
            Th,
            LOG_LIFETIME,
        >;
    }
}
