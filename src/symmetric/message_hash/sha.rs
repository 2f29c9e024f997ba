use rand::Rng;
use sha3::{Digest, Sha3_256};

use crate::{MESSAGE_LENGTH, TWEAK_SEPARATOR_FOR_MESSAGE_HASH};

use super::{MessageHash, bytes_to_chunks};

/// A message hash implemented using SHA3-256:
///
/// `apply(P, e, rho, m) = Truncate(SHA3-256(rho || P || 0x02 || e || m), NUM_CHUNKS * CHUNK_SIZE bits)`
///
/// The epoch in the message tweak is encoded little-endian, in contrast to
/// the big-endian epochs of chain and tree tweaks. This asymmetry is
/// deliberate and wire-exact; do not change it.
///
/// The digest is truncated to exactly `NUM_CHUNKS * CHUNK_SIZE` bits (the
/// final byte is masked) and then split into chunks of `CHUNK_SIZE` bits,
/// LSB-first within each byte.
///
/// PARAMETER_LEN and RAND_LEN are in bytes, and CHUNK_SIZE must be 1, 2, 4,
/// or 8.
pub struct Sha3MessageHash<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const NUM_CHUNKS: usize,
    const CHUNK_SIZE: usize,
>;

impl<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const NUM_CHUNKS: usize,
    const CHUNK_SIZE: usize,
> MessageHash for Sha3MessageHash<PARAMETER_LEN, RAND_LEN, NUM_CHUNKS, CHUNK_SIZE>
where
    [u8; PARAMETER_LEN]: serde::Serialize + serde::de::DeserializeOwned,
    [u8; RAND_LEN]: serde::Serialize + serde::de::DeserializeOwned + ssz::Encode + ssz::Decode,
{
    type Parameter = [u8; PARAMETER_LEN];

    type Randomness = [u8; RAND_LEN];

    const DIMENSION: usize = NUM_CHUNKS;

    const BASE: usize = 1 << CHUNK_SIZE;

    fn rand<R: Rng>(rng: &mut R) -> Self::Randomness {
        rng.random()
    }

    fn apply(
        parameter: &Self::Parameter,
        epoch: u32,
        randomness: &Self::Randomness,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Vec<u8> {
        let mut hasher = Sha3_256::new();

        hasher.update(randomness);
        hasher.update(parameter);
        // message tweak: separator, then the epoch little-endian
        hasher.update([TWEAK_SEPARATOR_FOR_MESSAGE_HASH]);
        hasher.update(epoch.to_le_bytes());
        hasher.update(message);

        let digest = hasher.finalize();

        // truncate to exactly NUM_CHUNKS * CHUNK_SIZE bits
        let num_bits = NUM_CHUNKS * CHUNK_SIZE;
        let num_bytes = num_bits.div_ceil(8);
        let mut truncated = digest[..num_bytes].to_vec();
        let remaining_bits = num_bits % 8;
        if remaining_bits > 0 {
            let mask = ((1u16 << remaining_bits) - 1) as u8;
            truncated[num_bytes - 1] &= mask;
        }

        // split into chunks and keep exactly DIMENSION many
        let mut chunks = bytes_to_chunks(&truncated, CHUNK_SIZE);
        chunks.truncate(NUM_CHUNKS);
        chunks
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            [1, 2, 4, 8].contains(&CHUNK_SIZE),
            "SHA3 Message Hash: Chunk size must be 1, 2, 4, or 8"
        );
        assert!(
            Self::DIMENSION <= 1 << 8,
            "SHA3 Message Hash: Dimension must be at most 2^8"
        );
        assert!(
            (NUM_CHUNKS * CHUNK_SIZE).div_ceil(8) <= 32,
            "SHA3 Message Hash: Cannot extract more than 32 bytes from SHA3-256"
        );
    }
}

// Example instantiations
pub type Sha3MessageHash192x3 = Sha3MessageHash<24, 24, 48, 4>;
