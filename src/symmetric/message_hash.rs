use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use ssz::{Decode, Encode};

use crate::MESSAGE_LENGTH;

/// Trait to model a hash function used for message hashing.
///
/// This is a variant of a tweakable hash function that we use for
/// message hashing. Specifically, it contains one more input,
/// and is always executed with respect to epochs, i.e., tweaks
/// are implicitly derived from the epoch.
///
/// Note that BASE must be at most 2^8, as we encode chunks as u8.
pub trait MessageHash {
    type Parameter: Clone + Sized + Serialize + DeserializeOwned;
    type Randomness: Copy + PartialEq + Serialize + DeserializeOwned + Encode + Decode;

    /// number of entries in a hash
    const DIMENSION: usize;

    /// each hash entry is between 0 and BASE - 1
    const BASE: usize;

    /// Generates a random randomness `rho`, to be freshly
    /// sampled for each encoding attempt.
    fn rand<R: Rng>(rng: &mut R) -> Self::Randomness;

    /// Applies the message hash to a parameter, an epoch,
    /// a randomness, and a message. It outputs a list of chunks.
    /// The list contains DIMENSION many elements, each between
    /// 0 and BASE - 1 (inclusive).
    fn apply(
        parameter: &Self::Parameter,
        epoch: u32,
        randomness: &Self::Randomness,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Vec<u8>;

    /// Function to check internal consistency of any given parameters
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

/// Splits a byte slice into chunks of `chunk_size` bits, where
/// `chunk_size` must be 1, 2, 4, or 8. Chunks are taken LSB-first
/// within each byte: the first chunk of a byte is its lowest bits.
pub fn bytes_to_chunks(bytes: &[u8], chunk_size: usize) -> Vec<u8> {
    assert!(
        [1, 2, 4, 8].contains(&chunk_size),
        "Bytes to chunks: chunk size must be 1, 2, 4, or 8"
    );

    let chunks_per_byte = 8 / chunk_size;
    let mask: u8 = ((1u16 << chunk_size) - 1) as u8;

    let mut chunks = Vec::with_capacity(bytes.len() * chunks_per_byte);
    for &byte in bytes {
        for chunk_index in 0..chunks_per_byte {
            chunks.push((byte >> (chunk_index * chunk_size)) & mask);
        }
    }
    chunks
}

pub mod poseidon;
pub mod sha;
pub mod top_level_poseidon;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_chunks_bit_exact() {
        // LSB-first two-bit chunks of 0b01101100, 0b10100110
        let bytes = [0b0110_1100u8, 0b1010_0110u8];
        let chunks = bytes_to_chunks(&bytes, 2);
        assert_eq!(
            chunks,
            vec![0b00, 0b11, 0b10, 0b01, 0b10, 0b01, 0b10, 0b10]
        );
    }

    #[test]
    fn test_bytes_to_chunks_sizes() {
        let bytes = [0xF0u8, 0x0Fu8];

        assert_eq!(bytes_to_chunks(&bytes, 8), vec![0xF0, 0x0F]);
        assert_eq!(bytes_to_chunks(&bytes, 4), vec![0x0, 0xF, 0xF, 0x0]);
        assert_eq!(bytes_to_chunks(&bytes, 1).len(), 16);

        // one-bit chunks enumerate the bits, LSB-first
        let bits = bytes_to_chunks(&[0b1000_0001u8], 1);
        assert_eq!(bits, vec![1, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_bytes_to_chunks_reassembles() {
        // chunks, read LSB-first, must reassemble to the original bytes
        let bytes = [0x3Au8, 0x7Fu8, 0x00u8, 0xFFu8];
        for chunk_size in [1usize, 2, 4, 8] {
            let chunks = bytes_to_chunks(&bytes, chunk_size);
            let chunks_per_byte = 8 / chunk_size;
            for (byte_index, &byte) in bytes.iter().enumerate() {
                let mut reassembled: u8 = 0;
                for chunk_index in 0..chunks_per_byte {
                    reassembled |=
                        chunks[byte_index * chunks_per_byte + chunk_index] << (chunk_index * chunk_size);
                }
                assert_eq!(reassembled, byte, "chunk size {chunk_size}");
            }
        }
    }
}
