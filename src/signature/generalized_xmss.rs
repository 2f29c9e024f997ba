use std::marker::PhantomData;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    MESSAGE_LENGTH,
    inc_encoding::IncomparableEncoding,
    serialization::Serializable,
    symmetric::{
        prf::Pseudorandom,
        tweak_hash::{TweakableHash, chain},
        tweak_hash_tree::{HashTree, HashTreeOpening, hash_tree_verify},
    },
};

use super::{SignatureScheme, SigningError};

use ssz::{Decode, DecodeError, Encode};

/// Implementation of the generalized XMSS signature scheme
/// from any incomparable encoding scheme and any tweakable hash
///
/// It also uses a PRF for key generation, and one has to specify
/// the (base 2 log of the) key lifetime.
///
/// Note: lifetimes beyond 2^32 are not supported.
pub struct GeneralizedXMSSSignatureScheme<
    PRF: Pseudorandom,
    IE: IncomparableEncoding,
    TH: TweakableHash,
    const LOG_LIFETIME: usize,
> {
    _prf: PhantomData<PRF>,
    _ie: PhantomData<IE>,
    _th: PhantomData<TH>,
}

/// Signature for GeneralizedXMSSSignatureScheme
/// It contains a Merkle authentication path, encoding randomness, and a list of hashes
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct GeneralizedXMSSSignature<IE: IncomparableEncoding, TH: TweakableHash> {
    path: HashTreeOpening<TH>,
    rho: IE::Randomness,
    hashes: Vec<TH::Domain>,
}

impl<IE: IncomparableEncoding, TH: TweakableHash> Encode for GeneralizedXMSSSignature<IE, TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        // SSZ Container: offset (4) + rho (fixed) + offset (4) + variable data
        let offset_size = 4;
        let rho_size = self.rho.ssz_bytes_len();
        let path_size = self.path.ssz_bytes_len();
        let hashes_size = self.hashes.ssz_bytes_len();

        offset_size + rho_size + offset_size + path_size + hashes_size
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        // Appends the SSZ encoding to the buffer.
        //
        // SSZ Container encoding with fields interleaved in declaration order:
        // - Field 1 (path): variable → write offset
        // - Field 2 (rho): fixed → write data
        // - Field 3 (hashes): variable → write offset
        //
        // Then write variable data in order: path, hashes

        // Calculate offsets (start of variable data)
        let rho_size = self.rho.ssz_bytes_len();
        // offset + rho + offset
        let fixed_size = 4 + rho_size + 4;

        let offset_path = fixed_size;
        let offset_hashes = offset_path + self.path.ssz_bytes_len();

        // 1. Encode offset for first variable field: path
        buf.extend_from_slice(&(offset_path as u32).to_le_bytes());

        // 2. Encode fixed field: rho
        self.rho.ssz_append(buf);

        // 3. Encode offset for second variable field: hashes
        buf.extend_from_slice(&(offset_hashes as u32).to_le_bytes());

        // 4. Encode variable data in order
        self.path.ssz_append(buf);
        self.hashes.ssz_append(buf);
    }
}

impl<IE: IncomparableEncoding, TH: TweakableHash> Decode for GeneralizedXMSSSignature<IE, TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        // Decodes a generalized XMSS signature from SSZ bytes.
        //
        // Fields are interleaved: offset_path → rho → offset_hashes → variable data

        // Get fixed size of rho field
        let rho_size = if <IE::Randomness as Encode>::is_ssz_fixed_len() {
            <IE::Randomness as Encode>::ssz_fixed_len()
        } else {
            return Err(DecodeError::BytesInvalid(
                "IE::Randomness must be fixed length".into(),
            ));
        };

        // Minimum size: offset (4) + rho (fixed) + offset (4)
        let min_size = 4 + rho_size + 4;
        if bytes.len() < min_size {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: min_size,
            });
        }

        // 1. Read offset for first variable field: path
        let offset_path = u32::from_le_bytes(bytes[0..4].try_into().map_err(|_| {
            DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 4,
            }
        })?) as usize;

        // 2. Decode fixed field: rho
        let rho = IE::Randomness::from_ssz_bytes(&bytes[4..4 + rho_size])?;

        // 3. Read offset for second variable field: hashes
        let offset_hashes =
            u32::from_le_bytes(bytes[4 + rho_size..8 + rho_size].try_into().map_err(|_| {
                DecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: 8 + rho_size,
                }
            })?) as usize;

        // Validate offset_path points to end of fixed part
        let expected_offset_path = 4 + rho_size + 4;
        if offset_path != expected_offset_path {
            return Err(DecodeError::InvalidByteLength {
                len: offset_path,
                expected: expected_offset_path,
            });
        }

        // Panic safety: Ensure offsets are monotonic and within bounds
        // This prevents panic when creating slices below
        if offset_path > offset_hashes || offset_hashes > bytes.len() {
            return Err(DecodeError::BytesInvalid(format!(
                "Invalid variable offsets: path={} hashes={} len={}",
                offset_path,
                offset_hashes,
                bytes.len()
            )));
        }

        // 4. Decode variable fields (now safe after bounds check)
        let path = HashTreeOpening::<TH>::from_ssz_bytes(&bytes[offset_path..offset_hashes])?;
        let hashes = Vec::<TH::Domain>::from_ssz_bytes(&bytes[offset_hashes..])?;

        Ok(Self { path, rho, hashes })
    }
}

/// Public key for GeneralizedXMSSSignatureScheme
/// It contains a Merkle root and a parameter for the tweakable hash
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct GeneralizedXMSSPublicKey<TH: TweakableHash> {
    root: TH::Domain,
    parameter: TH::Parameter,
}

/// Secret key for GeneralizedXMSSSignatureScheme
/// It contains a PRF key and the full padded Merkle tree over the active
/// epochs, together with the activation range.
///
/// Note: one may choose to regenerate the tree on the fly, but this
/// would be costly for signatures.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct GeneralizedXMSSSecretKey<
    PRF: Pseudorandom,
    IE: IncomparableEncoding,
    TH: TweakableHash,
    const LOG_LIFETIME: usize,
> {
    prf_key: PRF::Key,
    parameter: TH::Parameter,
    activation_epoch: u64,
    num_active_epochs: u64,
    tree: HashTree<TH>,
    _encoding_type: PhantomData<IE>,
}

impl<PRF: Pseudorandom, IE: IncomparableEncoding, TH: TweakableHash, const LOG_LIFETIME: usize>
    GeneralizedXMSSSecretKey<PRF, IE, TH, LOG_LIFETIME>
{
    /// The epochs this key can sign for.
    pub fn activation_interval(&self) -> std::ops::Range<u64> {
        self.activation_epoch..self.activation_epoch + self.num_active_epochs
    }
}

impl<PRF: Pseudorandom, IE: IncomparableEncoding, TH: TweakableHash, const LOG_LIFETIME: usize>
    Encode for GeneralizedXMSSSecretKey<PRF, IE, TH, LOG_LIFETIME>
{
    fn is_ssz_fixed_len() -> bool {
        // It has variable length due to the HashTree field
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        // Fixed-length fields (using u64 for platform independence),
        // plus a 4-byte offset for the variable-length tree
        let prf_key_size = self.prf_key.ssz_bytes_len();
        let parameter_size = self.parameter.ssz_bytes_len();
        let activation_epoch_size = 8; // u64
        let num_active_epochs_size = 8; // u64
        let offset_size = 4;
        let tree_size = self.tree.ssz_bytes_len();

        prf_key_size
            + parameter_size
            + activation_epoch_size
            + num_active_epochs_size
            + offset_size
            + tree_size
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        // Appends the SSZ encoding to the buffer.
        //
        // SSZ Container encoding with fields interleaved in declaration order:
        // - Field 1 (prf_key): fixed → write data
        // - Field 2 (parameter): fixed → write data
        // - Field 3 (activation_epoch): fixed → write data
        // - Field 4 (num_active_epochs): fixed → write data
        // - Field 5 (tree): variable → write offset
        //
        // Then write the variable data: tree

        let prf_key_size = self.prf_key.ssz_bytes_len();
        let parameter_size = self.parameter.ssz_bytes_len();

        // Start of variable data
        let offset_tree = prf_key_size + parameter_size + 8 + 8 + 4;

        // 1. Encode fixed field: prf_key
        self.prf_key.ssz_append(buf);

        // 2. Encode fixed field: parameter
        self.parameter.ssz_append(buf);

        // 3. Encode fixed field: activation_epoch (u64)
        buf.extend_from_slice(&self.activation_epoch.to_le_bytes());

        // 4. Encode fixed field: num_active_epochs (u64)
        buf.extend_from_slice(&self.num_active_epochs.to_le_bytes());

        // 5. Encode offset for variable field: tree
        buf.extend_from_slice(&(offset_tree as u32).to_le_bytes());

        // 6. Encode variable data: tree
        self.tree.ssz_append(buf);
    }
}

impl<PRF: Pseudorandom, IE: IncomparableEncoding, TH: TweakableHash, const LOG_LIFETIME: usize>
    Decode for GeneralizedXMSSSecretKey<PRF, IE, TH, LOG_LIFETIME>
{
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        // Decodes a generalized XMSS secret key from SSZ bytes.
        //
        // Fields are interleaved:
        // - prf_key
        // - parameter
        // - activation_epoch
        // - num_active_epochs
        // - offset_tree
        // - variable data: tree

        // Get fixed sizes for prf_key and parameter
        let prf_key_size = if <PRF::Key as Encode>::is_ssz_fixed_len() {
            <PRF::Key as Encode>::ssz_fixed_len()
        } else {
            return Err(DecodeError::BytesInvalid(
                "PRF::Key must be fixed length".into(),
            ));
        };

        let parameter_size = if <TH::Parameter as Encode>::is_ssz_fixed_len() {
            <TH::Parameter as Encode>::ssz_fixed_len()
        } else {
            return Err(DecodeError::BytesInvalid(
                "TH::Parameter must be fixed length".into(),
            ));
        };

        // Minimum size: prf_key + parameter + 2×u64 (16) + offset (4)
        let min_fixed_size = prf_key_size + parameter_size + 16 + 4;
        if bytes.len() < min_fixed_size {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: min_fixed_size,
            });
        }

        // Track current position
        let mut pos = 0;

        // 1. Decode fixed field: prf_key
        let prf_key = PRF::Key::from_ssz_bytes(&bytes[pos..pos + prf_key_size])?;
        pos += prf_key_size;

        // 2. Decode fixed field: parameter
        let parameter = TH::Parameter::from_ssz_bytes(&bytes[pos..pos + parameter_size])?;
        pos += parameter_size;

        // 3. Decode fixed field: activation_epoch (u64)
        let activation_epoch =
            u64::from_le_bytes(bytes[pos..pos + 8].try_into().map_err(|_| {
                DecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: pos + 8,
                }
            })?);
        pos += 8;

        // 4. Decode fixed field: num_active_epochs (u64)
        let num_active_epochs =
            u64::from_le_bytes(bytes[pos..pos + 8].try_into().map_err(|_| {
                DecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: pos + 8,
                }
            })?);
        pos += 8;

        // 5. Read offset for variable field: tree
        let offset_tree = u32::from_le_bytes(bytes[pos..pos + 4].try_into().map_err(|_| {
            DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: pos + 4,
            }
        })?) as usize;
        pos += 4;

        // Validate that fixed part ends at the offset
        if pos != offset_tree {
            return Err(DecodeError::InvalidByteLength {
                len: pos,
                expected: offset_tree,
            });
        }

        // Panic safety: the offset must be within bounds
        if offset_tree > bytes.len() {
            return Err(DecodeError::BytesInvalid(format!(
                "Invalid variable offset: tree={} len={}",
                offset_tree,
                bytes.len()
            )));
        }

        // 6. Decode variable field: tree
        let tree = HashTree::<TH>::from_ssz_bytes(&bytes[offset_tree..])?;

        Ok(Self {
            prf_key,
            parameter,
            activation_epoch,
            num_active_epochs,
            tree,
            _encoding_type: PhantomData,
        })
    }
}

impl<
    PRF: Pseudorandom,
    IE: IncomparableEncoding + Sync + Send,
    TH: TweakableHash,
    const LOG_LIFETIME: usize,
> SignatureScheme for GeneralizedXMSSSignatureScheme<PRF, IE, TH, LOG_LIFETIME>
where
    PRF::Domain: Into<TH::Domain>,
    TH::Parameter: Into<IE::Parameter>,
{
    type PublicKey = GeneralizedXMSSPublicKey<TH>;

    type SecretKey = GeneralizedXMSSSecretKey<PRF, IE, TH, LOG_LIFETIME>;

    type Signature = GeneralizedXMSSSignature<IE, TH>;

    const LIFETIME: u64 = 1 << LOG_LIFETIME;

    fn key_gen<R: Rng>(
        rng: &mut R,
        activation_epoch: usize,
        num_active_epochs: usize,
    ) -> (Self::PublicKey, Self::SecretKey) {
        // checks for `activation_epoch` and `num_active_epochs`
        assert!(
            LOG_LIFETIME <= 32,
            "Key gen: lifetimes beyond 2^32 are not supported"
        );
        assert!(
            num_active_epochs >= 1,
            "Key gen: at least one active epoch is needed"
        );
        assert!(
            activation_epoch + num_active_epochs <= Self::LIFETIME as usize,
            "Key gen: `activation_epoch` and `num_active_epochs` are invalid for this lifetime"
        );

        // we need a random parameter to be used for the tweakable hash
        let parameter = TH::rand_parameter(rng);

        // we need a PRF key to generate our list of actual secret keys
        let prf_key = PRF::key_gen(rng);

        // For each active epoch, we derive all chain starts from the PRF,
        // walk the chains to their ends, and hash the ends to obtain the
        // epoch's leaf. This is done for all epochs in parallel.
        let num_chains = IE::DIMENSION;
        let chain_length = IE::BASE;
        let epochs: Vec<u32> = (activation_epoch..activation_epoch + num_active_epochs)
            .map(|e| e as u32)
            .collect();
        let leaf_hashes = TH::compute_tree_leaves::<PRF>(
            &prf_key,
            &parameter,
            &epochs,
            num_chains,
            chain_length,
        );

        // now build the sparse tree on top of the leaf hashes. Its padding
        // nodes are sampled here and become part of the secret key.
        let tree = HashTree::new(rng, LOG_LIFETIME, activation_epoch, &parameter, leaf_hashes);
        let root = tree.root();

        // assemble public key and secret key
        let pk = GeneralizedXMSSPublicKey { root, parameter };
        let sk = GeneralizedXMSSSecretKey {
            prf_key,
            parameter,
            activation_epoch: activation_epoch as u64,
            num_active_epochs: num_active_epochs as u64,
            tree,
            _encoding_type: PhantomData,
        };

        (pk, sk)
    }

    fn sign<R: Rng>(
        rng: &mut R,
        sk: &Self::SecretKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Result<Self::Signature, SigningError> {
        // check that epoch is indeed a valid epoch in the activation range
        if !sk.activation_interval().contains(&(epoch as u64)) {
            return Err(SigningError::NotActive { epoch });
        }

        // first component of the signature is the Merkle path that
        // opens the one-time pk for that epoch, where the one-time pk
        // will be recomputed by the verifier from the signature.
        let path = sk.tree.path(epoch);

        // now, we need to encode our message using the incomparable encoding.
        // we retry with fresh randomness until we get a valid codeword,
        // or until we give up.
        let max_tries = IE::MAX_TRIES;
        let mut attempts = 0;
        let mut x = None;
        let mut rho = None;
        while attempts < max_tries {
            let curr_rho = IE::rand(rng);
            let curr_x = IE::encode(&sk.parameter.into(), message, &curr_rho, epoch);

            // check if we have found a valid codeword, and if so, stop searching
            if let Ok(codeword) = curr_x {
                rho = Some(curr_rho);
                x = Some(codeword);
                break;
            }

            attempts += 1;
        }

        // if we have not found a valid codeword, return an error
        let (Some(x), Some(rho)) = (x, rho) else {
            return Err(SigningError::EncodingAttemptsExceeded {
                attempts: max_tries,
            });
        };

        // we will include rho in the signature, and
        // we use x to determine how far the signer walks in the chains
        let num_chains = IE::DIMENSION;
        assert!(
            x.len() == num_chains,
            "Encoding is broken: returned too many or too few chunks."
        );

        // In parallel, compute the hash values for each chain based on the codeword `x`.
        let hashes = (0..num_chains)
            .into_par_iter()
            .map(|chain_index| {
                // get back to the start of the chain from the PRF
                let start = PRF::apply(&sk.prf_key, epoch, chain_index as u64).into();
                // now walk the chain for a number of steps determined by the current chunk of x
                let steps = x[chain_index] as usize;
                chain::<TH>(&sk.parameter, epoch, chain_index as u8, 0, steps, &start)
            })
            .collect();

        // assemble the signature: Merkle path, randomness, chain elements
        Ok(GeneralizedXMSSSignature { path, rho, hashes })
    }

    fn verify(
        pk: &Self::PublicKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
        sig: &Self::Signature,
    ) -> bool {
        // epochs beyond the lifetime can never have valid signatures
        if (epoch as u64) >= Self::LIFETIME {
            return false;
        }

        // first get back the codeword and make sure
        // encoding succeeded with the given randomness.
        let Ok(x) = IE::encode(&pk.parameter.into(), message, &sig.rho, epoch) else {
            return false;
        };

        // now, we recompute the epoch's one-time public key
        // from the hashes by walking hash chains.
        let chain_length = IE::BASE;
        let num_chains = IE::DIMENSION;
        if x.len() != num_chains || sig.hashes.len() != num_chains {
            return false;
        }
        let mut chain_ends = Vec::with_capacity(num_chains);
        for (chain_index, &xi) in x.iter().enumerate() {
            // If the signer has already walked x[i] steps, then we need
            // to walk chain_length - 1 - x[i] steps to reach the end of the chain
            // Note: by our consistency checks, we have chain_length <= 2^8, so chain_length - 1 fits into u8
            let steps = (chain_length - 1) - xi as usize;
            let start_pos_in_chain = xi;
            let start = &sig.hashes[chain_index];
            let end = chain::<TH>(
                &pk.parameter,
                epoch,
                chain_index as u8,
                start_pos_in_chain,
                steps,
                start,
            );
            chain_ends.push(end);
        }

        // this set of chain ends should be a leaf in the Merkle tree
        // we verify that by checking the Merkle authentication path
        hash_tree_verify(
            &pk.parameter,
            &pk.root,
            epoch,
            chain_ends.as_slice(),
            &sig.path,
        )
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        // we check consistency of all internally used components
        // namely, PRF, incomparable encoding, and tweak hash
        PRF::internal_consistency_check();
        IE::internal_consistency_check();
        TH::internal_consistency_check();

        // assert BASE and DIMENSION are small enough to make sure that we can fit
        // pos_in_chain and chain_index in u8.
        assert!(
            IE::BASE <= 1 << 8,
            "Generalized XMSS: Encoding base too large, must be at most 2^8"
        );
        assert!(
            IE::DIMENSION <= 1 << 8,
            "Generalized XMSS: Encoding dimension too large, must be at most 2^8"
        );

        // the retry loop must be allowed at least one attempt, and
        // encodings that cannot fail should not ask for more
        assert!(
            IE::MAX_TRIES >= 1,
            "Generalized XMSS: Encoding must allow at least one attempt"
        );
        assert!(
            IE::NEEDS_RETRY || IE::MAX_TRIES == 1,
            "Generalized XMSS: Encoding that cannot fail must not ask for retries"
        );

        // lifetime must be supported
        assert!(
            LOG_LIFETIME <= 32,
            "Generalized XMSS: lifetimes beyond 2^32 are not supported"
        );
    }
}

impl<TH: TweakableHash> Encode for GeneralizedXMSSPublicKey<TH> {
    fn is_ssz_fixed_len() -> bool {
        <TH::Domain as Encode>::is_ssz_fixed_len() && <TH::Parameter as Encode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <TH::Domain as Encode>::ssz_fixed_len() + <TH::Parameter as Encode>::ssz_fixed_len()
    }

    fn ssz_bytes_len(&self) -> usize {
        self.root.ssz_bytes_len() + self.parameter.ssz_bytes_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        self.root.ssz_append(buf);
        self.parameter.ssz_append(buf);
    }
}

impl<TH: TweakableHash> Decode for GeneralizedXMSSPublicKey<TH> {
    fn is_ssz_fixed_len() -> bool {
        <TH::Domain as Decode>::is_ssz_fixed_len() && <TH::Parameter as Decode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <TH::Domain as Decode>::ssz_fixed_len() + <TH::Parameter as Decode>::ssz_fixed_len()
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let expected_len = <Self as Decode>::ssz_fixed_len();
        if bytes.len() != expected_len {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: expected_len,
            });
        }

        let root_len = <TH::Domain as Decode>::ssz_fixed_len();
        let (root_bytes, param_bytes) = bytes.split_at(root_len);

        let root = TH::Domain::from_ssz_bytes(root_bytes)?;
        let parameter = TH::Parameter::from_ssz_bytes(param_bytes)?;

        Ok(Self { root, parameter })
    }
}

impl<TH: TweakableHash> Serializable for GeneralizedXMSSPublicKey<TH> {}

impl<IE: IncomparableEncoding, TH: TweakableHash> Serializable
    for GeneralizedXMSSSignature<IE, TH>
{
}

impl<PRF: Pseudorandom, IE: IncomparableEncoding, TH: TweakableHash, const LOG_LIFETIME: usize>
    Serializable for GeneralizedXMSSSecretKey<PRF, IE, TH, LOG_LIFETIME>
{
}

/// Instantiations of the generalized XMSS signature scheme based on SHA3
pub mod instantiations_sha;

/// Instantiations of the generalized XMSS signature scheme based on Poseidon2
pub mod instantiations_poseidon;

/// Instantiations of the generalized XMSS signature scheme based on the
/// top level target sum encoding using Poseidon2
pub mod instantiations_poseidon_top_level;
