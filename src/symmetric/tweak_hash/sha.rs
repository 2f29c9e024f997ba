use rand::Rng;
use sha3::{Digest, Sha3_256};

use crate::TWEAK_SEPARATOR_FOR_CHAIN_HASH;
use crate::TWEAK_SEPARATOR_FOR_TREE_HASH;

use super::TweakableHash;

/// Enum to implement tweaks for the byte-oriented SHA3 tweakable hash.
///
/// The byte encodings are wire-exact: a 1-byte separator, followed by the
/// tweak coordinates. Epochs are big-endian here. Changing either breaks
/// interoperability with other implementations.
#[derive(Debug)]
pub enum Sha3Tweak {
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

impl Sha3Tweak {
    /// Serializes the tweak:
    /// - tree:  `0x01 || level || pos_in_level (BE)`
    /// - chain: `0x00 || epoch (BE) || chain_index || pos_in_chain`
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::TreeTweak {
                level,
                pos_in_level,
            } => {
                let mut bytes = Vec::with_capacity(6);
                bytes.push(TWEAK_SEPARATOR_FOR_TREE_HASH);
                bytes.push(*level);
                bytes.extend_from_slice(&pos_in_level.to_be_bytes());
                bytes
            }
            Self::ChainTweak {
                epoch,
                chain_index,
                pos_in_chain,
            } => {
                let mut bytes = Vec::with_capacity(7);
                bytes.push(TWEAK_SEPARATOR_FOR_CHAIN_HASH);
                bytes.extend_from_slice(&epoch.to_be_bytes());
                bytes.push(*chain_index);
                bytes.push(*pos_in_chain);
                bytes
            }
        }
    }
}

/// A tweakable hash function implemented using SHA3-256:
///
/// `apply(P, T, M) = Truncate(SHA3-256(P || T || M), HASH_LEN)`
///
/// Note: PARAMETER_LEN and HASH_LEN must be given in bytes,
/// and HASH_LEN can be at most 32.
#[derive(Clone)]
pub struct Sha3TweakHash<const PARAMETER_LEN: usize, const HASH_LEN: usize>;

impl<const PARAMETER_LEN: usize, const HASH_LEN: usize> TweakableHash
    for Sha3TweakHash<PARAMETER_LEN, HASH_LEN>
where
    [u8; PARAMETER_LEN]: serde::Serialize + serde::de::DeserializeOwned + ssz::Encode + ssz::Decode,
    [u8; HASH_LEN]: serde::Serialize + serde::de::DeserializeOwned + ssz::Encode + ssz::Decode,
{
    type Parameter = [u8; PARAMETER_LEN];

    type Tweak = Sha3Tweak;

    type Domain = [u8; HASH_LEN];

    fn rand_parameter<R: Rng>(rng: &mut R) -> Self::Parameter {
        rng.random()
    }

    fn rand_domain<R: Rng>(rng: &mut R) -> Self::Domain {
        rng.random()
    }

    fn tree_tweak(level: u8, pos_in_level: u32) -> Self::Tweak {
        Sha3Tweak::TreeTweak {
            level,
            pos_in_level,
        }
    }

    fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self::Tweak {
        Sha3Tweak::ChainTweak {
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
        let mut hasher = Sha3_256::new();

        hasher.update(parameter);
        hasher.update(tweak.to_bytes());
        for block in message {
            hasher.update(block);
        }

        let digest = hasher.finalize();
        std::array::from_fn(|i| digest[i])
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            HASH_LEN <= 32,
            "SHA3 Tweak Hash: Hash length must be at most 32 bytes"
        );
        assert!(
            HASH_LEN > 0 && PARAMETER_LEN > 0,
            "SHA3 Tweak Hash: Parameter and hash lengths must be non-zero"
        );
    }
}

// Example instantiations
pub type Sha3Tweak128192 = Sha3TweakHash<16, 24>;
pub type Sha3Tweak192192 = Sha3TweakHash<24, 24>;
