//! Instantiations based on the SHA3 tweakable hash, with parameter and hash
//! length 24 bytes (192 bits). Message hashes extract as many bits from
//! SHA3-256 as the chunk layout needs.

use super::GeneralizedXMSSSignatureScheme;
use crate::{
    inc_encoding::{basic_winternitz::WinternitzEncoding, target_sum::TargetSumEncoding},
    symmetric::{message_hash::sha::Sha3MessageHash, prf::sha::Sha3PRF, tweak_hash::sha::Sha3TweakHash},
};

const PARAMETER_LEN: usize = 24;
const HASH_LEN: usize = 24;
const RAND_LEN: usize = 24;

type Prf = Sha3PRF<HASH_LEN>;
type Th = Sha3TweakHash<PARAMETER_LEN, HASH_LEN>;
type Mh<const NUM_CHUNKS: usize, const CHUNK_SIZE: usize> =
    Sha3MessageHash<PARAMETER_LEN, RAND_LEN, NUM_CHUNKS, CHUNK_SIZE>;

/// Instantiations with lifetime 2^18
pub mod lifetime_2_to_the_18 {
    use super::*;

    const LOG_LIFETIME: usize = 18;

    /// Instantiations based on the basic Winternitz encoding
    pub mod winternitz {
        use super::*;

        /// 192 binary message chunks, 8 checksum chunks
        pub type SIGWinternitzLifetime18W1 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<Mh<192, 1>, 1, 8>,
            Th,
            LOG_LIFETIME,
        >;

        /// 96 message chunks of 2 bits, 5 checksum chunks
        pub type SIGWinternitzLifetime18W2 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<Mh<96, 2>, 2, 5>,
            Th,
            LOG_LIFETIME,
        >;

        /// 64 message chunks of 4 bits, 3 checksum chunks
        pub type SIGWinternitzLifetime18W4 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<Mh<64, 4>, 4, 3>,
            Th,
            LOG_LIFETIME,
        >;

        /// 32 message chunks of 8 bits, 2 checksum chunks
        pub type SIGWinternitzLifetime18W8 = GeneralizedXMSSSignatureScheme<
            Prf,
            WinternitzEncoding<Mh<32, 8>, 8, 2>,
            Th,
            LOG_LIFETIME,
        >;
    }

    /// Instantiations based on the Target-Sum encoding
    pub mod target_sum {
        use super::*;

        /// 64 chunks of 4 bits, target at the expected sum
        /// `compute_optimal_target(64, 4, 1.0) = 480`
        pub type SIGTargetSumLifetime18W4NoOff = GeneralizedXMSSSignatureScheme<
            Prf,
            TargetSumEncoding<Mh<64, 4>, 480>,
            Th,
            LOG_LIFETIME,
        >;

        /// 64 chunks of 4 bits, target 10% above the expected sum
        /// `compute_optimal_target(64, 4, 1.1) = 528`: more signing
        /// retries, shorter verification
        pub type SIGTargetSumLifetime18W4Off10 = GeneralizedXMSSSignatureScheme<
            Prf,
            TargetSumEncoding<Mh<64, 4>, 528>,
            Th,
            LOG_LIFETIME,
        >;
    }
}

#[cfg(test)]
mod tests {
    use super::lifetime_2_to_the_18::{target_sum::*, winternitz::*};
    use crate::signature::SignatureScheme;

    #[test]
    fn test_internal_consistency_winternitz() {
        SIGWinternitzLifetime18W1::internal_consistency_check();
        SIGWinternitzLifetime18W2::internal_consistency_check();
        SIGWinternitzLifetime18W4::internal_consistency_check();
        SIGWinternitzLifetime18W8::internal_consistency_check();
    }

    #[test]
    fn test_internal_consistency_target_sum() {
        SIGTargetSumLifetime18W4NoOff::internal_consistency_check();
        SIGTargetSumLifetime18W4Off10::internal_consistency_check();
    }
}
