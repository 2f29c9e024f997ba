use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, de::DeserializeOwned};
use ssz::{Decode, Encode};

use crate::symmetric::prf::Pseudorandom;

/// Hash pairs within a tree layer sequentially below this many pairs.
/// This is a tuning knob, not a correctness constraint.
const PARALLEL_PAIR_THRESHOLD: usize = 100;

/// Trait to model a tweakable hash function.
///
/// Such a function takes a public parameter, a tweak, and a
/// message to be hashed. The tweak should be understood as an
/// address for domain separation.
///
/// In our setting, we require the support of hashing lists of
/// hashes. Therefore, we just define a type `Domain` and the
/// hash function maps from [Domain] to Domain.
///
/// We also require that the tweak hash already specifies how
/// to obtain distinct tweaks for applications in chains and
/// applications in Merkle trees.
pub trait TweakableHash: Sized + Send + Sync {
    type Parameter: Copy
        + PartialEq
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + Encode
        + Decode;

    type Tweak;

    type Domain: Copy + PartialEq + Send + Sync + Serialize + DeserializeOwned + Encode + Decode;

    /// Generates a random public parameter (concrete tweakable hash function)
    fn rand_parameter<R: Rng>(rng: &mut R) -> Self::Parameter;

    /// Generates a random domain element. Used only for padding nodes in
    /// sparse trees; padding is part of the secret key and never shown to
    /// verifiers.
    fn rand_domain<R: Rng>(rng: &mut R) -> Self::Domain;

    /// Returns a tweak to be used in the Merkle tree.
    /// Note: this is bundled with the tweak hash as we require domain
    /// separation between chain and tree tweaks.
    fn tree_tweak(level: u8, pos_in_level: u32) -> Self::Tweak;

    /// Returns a tweak to be used in chains.
    /// Note: this is bundled with the tweak hash as we require domain
    /// separation between chain and tree tweaks.
    fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self::Tweak;

    /// Applies the tweakable hash to parameter, tweak, and message.
    fn apply(
        parameter: &Self::Parameter,
        tweak: &Self::Tweak,
        message: &[Self::Domain],
    ) -> Self::Domain;

    /// Computes one layer of a Merkle tree: hashes a contiguous run of
    /// children two-by-two into their parents. `children` must have even
    /// length, and the `k`-th output is the node at position
    /// `parent_start + k` in layer `level`.
    ///
    /// Pairs are independent, so this goes parallel once the layer is large
    /// enough to be worth it. Workers write into pre-allocated indexed slots,
    /// so the output order is deterministic.
    fn compute_tree_layer(
        parameter: &Self::Parameter,
        level: u8,
        parent_start: usize,
        children: &[Self::Domain],
    ) -> Vec<Self::Domain> {
        debug_assert!(children.len().is_multiple_of(2));
        let num_pairs = children.len() / 2;

        let hash_pair = |(k, pair): (usize, &[Self::Domain])| {
            Self::apply(
                parameter,
                &Self::tree_tweak(level, (parent_start + k) as u32),
                pair,
            )
        };

        if num_pairs > PARALLEL_PAIR_THRESHOLD {
            children
                .par_chunks_exact(2)
                .enumerate()
                .map(hash_pair)
                .collect()
        } else {
            children.chunks_exact(2).enumerate().map(hash_pair).collect()
        }
    }

    /// Computes the Merkle leaves for a list of epochs: for each epoch, all
    /// chain starts are derived from the PRF key, walked to their ends, and
    /// the ends are hashed together with the level-0 tree tweak.
    ///
    /// Epochs are independent and are processed in parallel. The `k`-th
    /// output is the leaf for `epochs[k]`.
    fn compute_tree_leaves<PRF>(
        prf_key: &PRF::Key,
        parameter: &Self::Parameter,
        epochs: &[u32],
        num_chains: usize,
        chain_length: usize,
    ) -> Vec<Self::Domain>
    where
        PRF: Pseudorandom,
        PRF::Domain: Into<Self::Domain>,
    {
        epochs
            .par_iter()
            .map(|&epoch| {
                let chain_ends: Vec<_> = (0..num_chains)
                    .map(|chain_index| {
                        // each chain start is just a PRF evaluation
                        let start = PRF::apply(prf_key, epoch, chain_index as u64).into();
                        // walk the chain to get the public chain end
                        chain::<Self>(
                            parameter,
                            epoch,
                            chain_index as u8,
                            0,
                            chain_length - 1,
                            &start,
                        )
                    })
                    .collect();
                // hash of all chain ends, with the tweak of the epoch's leaf
                Self::apply(parameter, &Self::tree_tweak(0, epoch), &chain_ends)
            })
            .collect()
    }

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

/// Function implementing hash chains, implemented over a tweakable hash function.
/// The chain is specific to an epoch `epoch`, and an index `chain_index`. All
/// hash chain evaluations are tweaked accordingly.
///
/// This function computes the iterated hash `steps` many times, starting from
/// position `start_pos_in_chain` with value `start`. For `steps = 0`, the
/// start value is returned unchanged. Walking `a + b` steps from position 0
/// equals walking `a` steps and then `b` steps from position `a`.
pub fn chain<TH: TweakableHash>(
    parameter: &TH::Parameter,
    epoch: u32,
    chain_index: u8,
    start_pos_in_chain: u8,
    steps: usize,
    start: &TH::Domain,
) -> TH::Domain {
    // positions in the chain must fit into a u8
    assert!(
        start_pos_in_chain as usize + steps <= (1 << 8) - 1,
        "Chain: start_pos_in_chain + steps must be at most 255"
    );

    let mut current = *start;

    for j in 0..steps {
        let tweak = TH::chain_tweak(epoch, chain_index, start_pos_in_chain + (j as u8) + 1);
        current = TH::apply(parameter, &tweak, &[current]);
    }

    current
}

pub mod poseidon;
pub mod sha;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetric::tweak_hash::poseidon::PoseidonTweak57;
    use crate::symmetric::tweak_hash::sha::Sha3Tweak128192;

    /// Walking a chain in one go must match walking it in two legs, for
    /// every possible split of the total number of steps.
    fn chain_associativity_helper<TH: TweakableHash>()
    where
        TH::Domain: std::fmt::Debug,
    {
        let mut rng = rand::rng();

        let parameter = TH::rand_parameter(&mut rng);
        let start = TH::rand_domain(&mut rng);
        let epoch = 9;
        let chain_index = 20;
        let total_steps = 16;

        let expected = chain::<TH>(&parameter, epoch, chain_index, 0, total_steps, &start);

        for split in 0..=total_steps {
            let intermediate = chain::<TH>(&parameter, epoch, chain_index, 0, split, &start);
            let end = chain::<TH>(
                &parameter,
                epoch,
                chain_index,
                split as u8,
                total_steps - split,
                &intermediate,
            );
            assert_eq!(
                end, expected,
                "chain splitting at {split} of {total_steps} changed the result"
            );
        }
    }

    #[test]
    fn test_chain_associativity_sha() {
        chain_associativity_helper::<Sha3Tweak128192>();
    }

    #[test]
    fn test_chain_associativity_poseidon() {
        chain_associativity_helper::<PoseidonTweak57>();
    }

    #[test]
    fn test_chain_zero_steps_is_identity() {
        let mut rng = rand::rng();

        let parameter = Sha3Tweak128192::rand_parameter(&mut rng);
        let start = Sha3Tweak128192::rand_domain(&mut rng);

        let end = chain::<Sha3Tweak128192>(&parameter, 3, 7, 11, 0, &start);
        assert_eq!(end, start);
    }

    #[test]
    fn test_chain_deterministic() {
        let mut rng = rand::rng();

        let parameter = Sha3Tweak128192::rand_parameter(&mut rng);
        let start = Sha3Tweak128192::rand_domain(&mut rng);

        let first = chain::<Sha3Tweak128192>(&parameter, 1, 2, 0, 10, &start);
        let second = chain::<Sha3Tweak128192>(&parameter, 1, 2, 0, 10, &start);
        assert_eq!(first, second);
    }
}
