use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use ssz::{Decode, Encode};

use crate::MESSAGE_LENGTH;

/// Trait to model incomparable encoding schemes.
///
/// An incomparable encoding maps a message (together with a parameter, a
/// randomness, and an epoch) to a codeword: a vector of DIMENSION chunks,
/// each in `0..BASE`. Incomparability means that for no two distinct
/// codewords `x` and `y` we have `x[i] <= y[i]` for all `i`. This is what
/// makes signatures one-time secure: a forger cannot walk an honest
/// signature's chains forward into a valid signature for another message.
///
/// Encodings are allowed to fail, in which case the caller retries with a
/// fresh randomness, up to MAX_TRIES attempts.
pub trait IncomparableEncoding {
    type Parameter;

    type Randomness: Copy + PartialEq + Serialize + DeserializeOwned + Encode + Decode;

    type Error;

    /// number of chunks in a codeword
    const DIMENSION: usize;

    /// how often one should try at most before giving up.
    /// Must be at least 1.
    const MAX_TRIES: usize;

    /// chunks of the codeword are in 0..BASE
    const BASE: usize;

    /// whether encoding can fail and needs the retry loop.
    /// If false, `encode` must succeed on the first attempt.
    const NEEDS_RETRY: bool;

    /// Samples an encoding randomness.
    fn rand<R: Rng>(rng: &mut R) -> Self::Randomness;

    /// Applies the incomparable encoding to a message.
    /// May return an error, in which case the caller should retry
    /// with a fresh randomness.
    fn encode(
        parameter: &Self::Parameter,
        message: &[u8; MESSAGE_LENGTH],
        randomness: &Self::Randomness,
        epoch: u32,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod basic_winternitz;
pub mod target_sum;
