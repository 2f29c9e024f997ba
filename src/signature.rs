use rand::Rng;
use thiserror::Error;

use crate::MESSAGE_LENGTH;

/// Errors that can occur during signing.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key does not cover the requested epoch.
    #[error("signing failed: key is not active in epoch {epoch}")]
    NotActive { epoch: u32 },

    /// No valid encoding was found within the allowed number of attempts.
    #[error("signing failed: no valid encoding found within {attempts} attempts")]
    EncodingAttemptsExceeded { attempts: usize },
}

/// Trait to model a synchronized signature scheme.
///
/// In a synchronized signature scheme, we sign with respect to
/// epochs, and signing is allowed at most once per epoch. A key
/// covers a contiguous range of epochs fixed at key generation,
/// and the key's lifetime bounds how large that range can be.
///
/// The scheme does not track which epochs have been used. The
/// caller owns that bookkeeping; signing the same epoch for two
/// different messages is a security failure, just as reusing a
/// one-time key would be.
pub trait SignatureScheme {
    type PublicKey;
    type SecretKey;
    type Signature;

    /// Total number of epochs supported by the scheme.
    const LIFETIME: u64;

    /// Generates a new key pair, active for the epochs
    /// `activation_epoch..activation_epoch + num_active_epochs`.
    /// This range must be within `0..LIFETIME`.
    fn key_gen<R: Rng>(
        rng: &mut R,
        activation_epoch: usize,
        num_active_epochs: usize,
    ) -> (Self::PublicKey, Self::SecretKey);

    /// Signs a message with respect to an epoch. The epoch must be
    /// within the activation range of the key.
    ///
    /// The RNG is used to sample fresh encoding randomness per attempt;
    /// signing the same (epoch, message) pair twice may yield different
    /// signatures, all of which verify.
    fn sign<R: Rng>(
        rng: &mut R,
        sk: &Self::SecretKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Result<Self::Signature, SigningError>;

    /// Verifies a signature with respect to a public key, an epoch, and a
    /// message. Never panics on malformed signatures: any defect maps to
    /// `false`.
    fn verify(
        pk: &Self::PublicKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
        sig: &Self::Signature,
    ) -> bool;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod generalized_xmss;
