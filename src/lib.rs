use p3_baby_bear::{BabyBear, Poseidon2BabyBear, default_babybear_poseidon2_24};
use std::sync::OnceLock;

/// Message length in bytes, for messages that we want to sign.
pub const MESSAGE_LENGTH: usize = 32;

pub const TWEAK_SEPARATOR_FOR_MESSAGE_HASH: u8 = 0x02;
pub const TWEAK_SEPARATOR_FOR_TREE_HASH: u8 = 0x01;
pub const TWEAK_SEPARATOR_FOR_CHAIN_HASH: u8 = 0x00;

type F = BabyBear;

pub(crate) mod array;
pub(crate) mod hypercube;
pub mod inc_encoding;
pub mod serialization;
pub mod signature;
pub mod symmetric;

// Cached Poseidon2 permutation.
//
// We cache the default Plonky3 Poseidon2 instance once and return a clone.
// Returning by value preserves existing call sites that take `&perm`.
//
// Width 24 is the only width this crate needs: chain steps, tree nodes, and
// message hashing all go through the same width-24 sponge or feed-forward
// compression.

/// A lazily-initialized, thread-safe cache for the Poseidon2 permutation with a width of 24.
static POSEIDON2_24: OnceLock<Poseidon2BabyBear<24>> = OnceLock::new();

/// Errors returned when initializing a custom Poseidon2 permutation.
#[derive(Debug, thiserror::Error)]
pub enum Poseidon2InitError {
    #[error("Poseidon2 permutation for width {width} was already initialized")]
    AlreadyInitialized { width: usize },
}

/// Initialize the width-24 Poseidon2 permutation used by this crate.
///
/// This must be called before the first use of the permutation (i.e. before any code paths that
/// compute message/tweak hashes). If not called, the default Plonky3 permutation is used.
pub fn init_poseidon2_24(perm: Poseidon2BabyBear<24>) -> Result<(), Poseidon2InitError> {
    POSEIDON2_24
        .set(perm)
        .map_err(|_| Poseidon2InitError::AlreadyInitialized { width: 24 })
}

/// Initialize the width-24 Poseidon2 permutation using a constructor.
///
/// The constructor will only be called if the permutation has not been initialized yet.
pub fn init_poseidon2_24_with<B>(builder: B) -> Result<(), Poseidon2InitError>
where
    B: FnOnce() -> Poseidon2BabyBear<24>,
{
    if POSEIDON2_24.get().is_some() {
        return Err(Poseidon2InitError::AlreadyInitialized { width: 24 });
    }
    init_poseidon2_24(builder())
}

/// Poseidon2 permutation (width 24)
pub(crate) fn poseidon2_24() -> Poseidon2BabyBear<24> {
    POSEIDON2_24
        .get_or_init(default_babybear_poseidon2_24)
        .clone()
}
