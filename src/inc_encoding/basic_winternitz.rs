use crate::{
    MESSAGE_LENGTH,
    symmetric::message_hash::{MessageHash, bytes_to_chunks},
};

use super::IncomparableEncoding;

/// Incomparable Encoding Scheme based on the basic Winternitz scheme, implemented from a given message hash.
/// CHUNK_SIZE must be 1, 2, 4, or 8 and MH::BASE must be 2^CHUNK_SIZE.
/// NUM_CHUNKS_CHECKSUM is the precomputed number of checksum chunks, namely
///
/// ```ignore
///     floor(log_base(MH::DIMENSION * (MH::BASE - 1))) + 1
/// ```
///
/// Incomparability holds because the checksum is complementary: raising any
/// message chunk strictly lowers the checksum, so no codeword dominates
/// another coordinate-wise.
pub struct WinternitzEncoding<
    MH: MessageHash,
    const CHUNK_SIZE: usize,
    const NUM_CHUNKS_CHECKSUM: usize,
> {
    _marker_mh: std::marker::PhantomData<MH>,
}

impl<MH: MessageHash, const CHUNK_SIZE: usize, const NUM_CHUNKS_CHECKSUM: usize>
    IncomparableEncoding for WinternitzEncoding<MH, CHUNK_SIZE, NUM_CHUNKS_CHECKSUM>
{
    type Parameter = MH::Parameter;

    type Randomness = MH::Randomness;

    type Error = ();

    const DIMENSION: usize = MH::DIMENSION + NUM_CHUNKS_CHECKSUM;

    const MAX_TRIES: usize = 1;

    const BASE: usize = MH::BASE;

    const NEEDS_RETRY: bool = false;

    fn rand<R: rand::Rng>(rng: &mut R) -> Self::Randomness {
        MH::rand(rng)
    }

    fn encode(
        parameter: &Self::Parameter,
        message: &[u8; MESSAGE_LENGTH],
        randomness: &Self::Randomness,
        epoch: u32,
    ) -> Result<Vec<u8>, Self::Error> {
        // apply the message hash to get chunks
        let mut chunks_message = MH::apply(parameter, epoch, randomness, message);

        // compute checksum and split into chunks in little endian
        let checksum: u64 = chunks_message
            .iter()
            .map(|&x| Self::BASE as u64 - 1 - x as u64)
            .sum();
        let checksum_bytes = checksum.to_le_bytes();
        let chunks_checksum = bytes_to_chunks(&checksum_bytes, CHUNK_SIZE);

        // append checksum chunks (truncate to the expected number)
        chunks_message.extend_from_slice(&chunks_checksum[..NUM_CHUNKS_CHECKSUM]);

        Ok(chunks_message)
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            [1, 2, 4, 8].contains(&CHUNK_SIZE),
            "Winternitz Encoding: Chunk Size must be 1, 2, 4, or 8"
        );
        assert!(
            Self::DIMENSION <= 1 << 8,
            "Winternitz Encoding: Dimension must be at most 2^8"
        );
        assert!(
            MH::BASE == Self::BASE && MH::BASE == 1 << CHUNK_SIZE,
            "Winternitz Encoding: Base and chunk size not consistent with message hash"
        );

        // the checksum width must be exactly the number of base-BASE digits
        // of the largest possible checksum
        let max_checksum = MH::DIMENSION * (Self::BASE - 1);
        let mut expected_checksum_chunks = 0;
        let mut value = max_checksum;
        while value > 0 {
            value /= Self::BASE;
            expected_checksum_chunks += 1;
        }
        assert!(
            NUM_CHUNKS_CHECKSUM == expected_checksum_chunks,
            "Winternitz Encoding: Wrong number of checksum chunks"
        );

        MH::internal_consistency_check();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetric::message_hash::sha::Sha3MessageHash192x3;
    use rand::Rng;

    // 48 message chunks of 4 bits: max checksum 48 * 15 = 720, which has
    // 3 digits in base 16
    type TestEncoding = WinternitzEncoding<Sha3MessageHash192x3, 4, 3>;

    #[test]
    fn test_internal_consistency() {
        TestEncoding::internal_consistency_check();
    }

    #[test]
    fn test_encode_dimension_and_range() {
        let mut rng = rand::rng();

        let parameter: [u8; 24] = rng.random();
        let message: [u8; MESSAGE_LENGTH] = rng.random();
        let randomness = TestEncoding::rand(&mut rng);

        let codeword = TestEncoding::encode(&parameter, &message, &randomness, 0)
            .expect("Winternitz encoding must not fail");

        assert_eq!(codeword.len(), TestEncoding::DIMENSION);
        for &chunk in &codeword {
            assert!((chunk as usize) < TestEncoding::BASE);
        }
    }

    #[test]
    fn test_checksum_is_complementary() {
        let mut rng = rand::rng();

        let parameter: [u8; 24] = rng.random();
        let message: [u8; MESSAGE_LENGTH] = rng.random();
        let randomness = TestEncoding::rand(&mut rng);

        let codeword = TestEncoding::encode(&parameter, &message, &randomness, 3).unwrap();

        // reassemble the checksum from its little-endian digits and compare
        // to the complement sum of the message chunks
        let message_chunks = &codeword[..48];
        let checksum_chunks = &codeword[48..];

        let expected_checksum: u64 = message_chunks
            .iter()
            .map(|&x| TestEncoding::BASE as u64 - 1 - x as u64)
            .sum();

        let mut checksum: u64 = 0;
        for (i, &digit) in checksum_chunks.iter().enumerate() {
            checksum += (digit as u64) << (4 * i);
        }

        assert_eq!(checksum, expected_checksum);
    }

    #[test]
    fn test_encode_deterministic() {
        let mut rng = rand::rng();

        let parameter: [u8; 24] = rng.random();
        let message: [u8; MESSAGE_LENGTH] = rng.random();
        let randomness = TestEncoding::rand(&mut rng);

        let first = TestEncoding::encode(&parameter, &message, &randomness, 0).unwrap();
        let second = TestEncoding::encode(&parameter, &message, &randomness, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_codewords_incomparable() {
        // sample pairs of codewords and check that no one dominates the
        // other coordinate-wise (unless they are equal)
        let mut rng = rand::rng();

        let parameter: [u8; 24] = rng.random();

        for _ in 0..50 {
            let message1: [u8; MESSAGE_LENGTH] = rng.random();
            let message2: [u8; MESSAGE_LENGTH] = rng.random();
            let randomness = TestEncoding::rand(&mut rng);

            let x = TestEncoding::encode(&parameter, &message1, &randomness, 0).unwrap();
            let y = TestEncoding::encode(&parameter, &message2, &randomness, 0).unwrap();

            if x == y {
                continue;
            }

            let x_dominates = x.iter().zip(y.iter()).all(|(a, b)| a >= b);
            let y_dominates = x.iter().zip(y.iter()).all(|(a, b)| a <= b);
            assert!(
                !x_dominates && !y_dominates,
                "found comparable codewords {x:?} and {y:?}"
            );
        }
    }
}
