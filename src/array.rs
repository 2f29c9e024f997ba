use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::F;
use p3_field::{PrimeCharacteristicRing, PrimeField32, RawDataSerializable};

/// A fixed-length vector of field elements, used for hash parameters,
/// domain elements, and randomness on the Poseidon side.
///
/// Every serialized form goes through one canonical byte layout: each
/// element as its canonical (non-Montgomery) `u32`, little-endian, for a
/// total of `N * 4` bytes. SSZ and serde both read and write exactly this
/// layout, so the two encodings agree byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FieldArray<const N: usize>(pub [F; N]);

impl<const N: usize> FieldArray<N> {
    /// Byte length of the canonical encoding.
    const BYTES: usize = N * F::NUM_BYTES;

    /// Appends the canonical little-endian byte form to `buf`.
    fn write_canonical(&self, buf: &mut Vec<u8>) {
        buf.reserve(Self::BYTES);
        for elem in &self.0 {
            buf.extend_from_slice(&elem.as_canonical_u32().to_le_bytes());
        }
    }

    /// Parses the canonical byte form. Returns `None` unless `bytes` is
    /// exactly `N * 4` bytes long.
    fn read_canonical(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::BYTES {
            return None;
        }

        let mut elems = [F::ZERO; N];
        for (elem, chunk) in elems.iter_mut().zip(bytes.chunks_exact(F::NUM_BYTES)) {
            let word = u32::from_le_bytes(chunk.try_into().ok()?);
            *elem = F::new(word);
        }
        Some(Self(elems))
    }
}

impl<const N: usize> Deref for FieldArray<N> {
    type Target = [F; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for FieldArray<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<[F; N]> for FieldArray<N> {
    fn from(arr: [F; N]) -> Self {
        Self(arr)
    }
}

impl<const N: usize> From<FieldArray<N>> for [F; N] {
    fn from(field_array: FieldArray<N>) -> Self {
        field_array.0
    }
}

impl<const N: usize> Encode for FieldArray<N> {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        Self::BYTES
    }

    fn ssz_bytes_len(&self) -> usize {
        Self::BYTES
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        self.write_canonical(buf);
    }
}

impl<const N: usize> Decode for FieldArray<N> {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        Self::BYTES
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::read_canonical(bytes).ok_or(DecodeError::InvalidByteLength {
            len: bytes.len(),
            expected: Self::BYTES,
        })
    }
}

impl<const N: usize> Serialize for FieldArray<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut buf = Vec::with_capacity(Self::BYTES);
        self.write_canonical(&mut buf);
        serializer.serialize_bytes(&buf)
    }
}

/// Visitor accepting the canonical byte form either as one byte buffer or
/// as a sequence of bytes (human-readable formats deliver the latter).
struct CanonicalBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for CanonicalBytesVisitor<N> {
    type Value = FieldArray<N>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} bytes encoding {} canonical field elements",
            FieldArray::<N>::BYTES,
            N
        )
    }

    fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Self::Value, E>
    where
        E: DeError,
    {
        FieldArray::read_canonical(bytes)
            .ok_or_else(|| E::invalid_length(bytes.len(), &self))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut buf = Vec::with_capacity(FieldArray::<N>::BYTES);
        while let Some(byte) = seq.next_element::<u8>()? {
            buf.push(byte);
        }
        FieldArray::read_canonical(&buf)
            .ok_or_else(|| A::Error::invalid_length(buf.len(), &self))
    }
}

impl<'de, const N: usize> Deserialize<'de> for FieldArray<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_bytes(CanonicalBytesVisitor::<N>)
    }
}
