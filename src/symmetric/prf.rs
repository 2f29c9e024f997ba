use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use ssz::{Decode, Encode};

/// Trait to model a pseudorandom function.
///
/// The PRF is used to derive the secret start of each hash chain from a
/// single key: one output per `(epoch, chain_index)` pair. Outputs must look
/// independent across distinct pairs, and derivation must be deterministic so
/// that signing can re-derive exactly what key generation committed to.
pub trait Pseudorandom {
    /// The secret key of the PRF.
    type Key: Clone + Send + Sync + Serialize + DeserializeOwned + Encode + Decode;

    /// The output of the PRF.
    type Domain: Copy + Send + Sync;

    /// Samples a fresh PRF key.
    fn key_gen<R: Rng>(rng: &mut R) -> Self::Key;

    /// Evaluates the PRF at the given epoch and chain index.
    fn apply(key: &Self::Key, epoch: u32, chain_index: u64) -> Self::Domain;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod sha;
pub mod shake_to_field;
