//! Canonical byte serialization for keys, signatures, trees, and openings.

use serde::{Serialize, de::DeserializeOwned};
use ssz::{Decode, DecodeError, Encode};

/// Marker trait for types with a canonical byte representation.
///
/// The canonical form is the type's SSZ encoding: field elements in
/// canonical (non-Montgomery) `u32` form, all integers little-endian,
/// composite structures following SSZ container layout. Serde support is
/// required alongside so the same types also work with structured formats.
///
/// The stored form does not describe the hash primitive it belongs to;
/// callers must know the scheme before decoding (and supply the primitive
/// out-of-band when reconstructing keys).
pub trait Serializable: Serialize + DeserializeOwned + Encode + Decode + Sized {}

/// Encodes a value into its canonical byte form.
pub fn to_bytes<T: Serializable>(value: &T) -> Vec<u8> {
    value.as_ssz_bytes()
}

/// Decodes a value from its canonical byte form, rejecting malformed input.
pub fn from_bytes<T: Serializable>(bytes: &[u8]) -> Result<T, DecodeError> {
    T::from_ssz_bytes(bytes)
}

// Raw byte strings used as PRF keys and SHA3-side parameters are already
// their own canonical form.
impl Serializable for [u8; 16] {}
impl Serializable for [u8; 24] {}
impl Serializable for [u8; 32] {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_arrays_roundtrip() {
        let key: [u8; 32] = std::array::from_fn(|i| i as u8);

        let encoded = to_bytes(&key);
        assert_eq!(encoded, key.to_vec());

        let decoded: [u8; 32] = from_bytes(&encoded).expect("canonical bytes decode");
        assert_eq!(decoded, key);

        // a truncated buffer is rejected
        assert!(from_bytes::<[u8; 32]>(&encoded[..31]).is_err());
    }
}
