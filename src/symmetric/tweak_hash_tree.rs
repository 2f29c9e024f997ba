use crate::serialization::Serializable;
use crate::symmetric::tweak_hash::TweakableHash;
use rand::Rng;
use serde::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};

/// A single layer of a sparse Hash-Tree
/// based on tweakable hash function
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
struct HashTreeLayer<TH: TweakableHash> {
    start_index: u64,
    nodes: Vec<TH::Domain>,
}

impl<TH: TweakableHash> HashTreeLayer<TH> {
    /// Construct a layer from a contiguous run of nodes and pad it so that:
    /// - the layer starts at an even index (a left child), and
    /// - the layer ends at an odd index (a right child).
    ///
    /// Input interpretation:
    /// - `nodes` conceptually occupy tree indices
    ///   `[start_index, start_index + nodes.len() - 1]` (inclusive).
    ///
    /// Padding rules:
    /// - If `start_index` is odd, we insert one random node in front and shift
    ///   the effective start to the previous even index.
    /// - If the end index is even, we append one random node at the back so the
    ///   final index is odd.
    ///
    /// With this alignment every parent is formed from exactly two children,
    /// so upper layers can be built with exact size-2 chunks, with no edge
    /// cases. The padding nodes live in the secret key and are never shown to
    /// verifiers.
    #[inline]
    fn padded<R: Rng>(rng: &mut R, nodes: Vec<TH::Domain>, start_index: usize) -> Self {
        // End index of the provided contiguous run (inclusive).
        let end_index = start_index + nodes.len() - 1;

        // Do we need a front pad? Start must be even.
        let needs_front = (start_index & 1) == 1;

        // Do we need a back pad? End must be odd.
        let needs_back = (end_index & 1) == 0;

        // The effective start index after optional front padding (always even).
        let actual_start_index = start_index - (needs_front as usize);

        // Reserve exactly the space we may need: original nodes plus up to two pads.
        let mut out =
            Vec::with_capacity(nodes.len() + (needs_front as usize) + (needs_back as usize));

        // Optional front padding to align to an even start index.
        if needs_front {
            out.push(TH::rand_domain(rng));
        }

        // Insert the actual content in order.
        out.extend(nodes);

        // Optional back padding to ensure we end on an odd index.
        if needs_back {
            out.push(TH::rand_domain(rng));
        }

        // Return the padded layer with the corrected start index.
        Self {
            start_index: actual_start_index as u64,
            nodes: out,
        }
    }
}

impl<TH: TweakableHash> Encode for HashTreeLayer<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        // - Fixed part: start_index (8 bytes) + offset (4 bytes)
        // - Variable part: nodes
        8 + 4 + self.nodes.ssz_bytes_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        // SSZ Container encoding order:
        // 1. Fixed field: start_index
        self.start_index.ssz_append(buf);

        // 2. Offset for variable field: nodes
        // Offset points to where variable data starts = end of fixed part
        // 8 bytes (start_index) + 4 bytes (offset itself)
        let offset: u32 = 12;
        buf.extend_from_slice(&offset.to_le_bytes());

        // 3. Variable data: nodes
        self.nodes.ssz_append(buf);
    }
}

impl<TH: TweakableHash> Decode for HashTreeLayer<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        // Minimum size: start_index (8) + offset (4) = 12 bytes
        const FIXED_SIZE: usize = 12;
        if bytes.len() < FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: FIXED_SIZE,
            });
        }

        // 1. Decode fixed field: start_index
        let start_index = u64::from_ssz_bytes(&bytes[0..8])?;

        // 2. Read offset for variable field
        let offset = u32::from_le_bytes(bytes[8..12].try_into().map_err(|_| {
            DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 12,
            }
        })?) as usize;

        // 3. Validate offset points to end of fixed part
        if offset != FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: offset,
                expected: FIXED_SIZE,
            });
        }

        // 4. Decode variable field: nodes
        let nodes = Vec::<TH::Domain>::from_ssz_bytes(&bytes[offset..])?;

        Ok(Self { start_index, nodes })
    }
}

impl<TH: TweakableHash> Serializable for HashTreeLayer<TH> {}

/// A sparse Hash-Tree based on a tweakable hash function.
/// We consider hash trees in which each leaf is first
/// hashed individually.
///
/// The tree is sparse in the following sense:
/// There is a contiguous range of leafs that exist,
/// and the tree is built on top of that.
/// For instance, we may consider a tree of depth 32,
/// but only 2^{10} leafs really exist.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct HashTree<TH: TweakableHash> {
    /// Depth of the full tree. The tree can have at most
    /// 1 << depth many leafs, and it has depth + 1 many layers.
    depth: u64,

    /// Layers of the hash tree, starting with the bottom layer.
    /// That is, layers[l] contains the stored segment of level l.
    /// The leafs themselves are not included: the bottom layer is
    /// the list of hashes of all leafs.
    layers: Vec<HashTreeLayer<TH>>,
}

impl<TH: TweakableHash> Encode for HashTree<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        // - Fixed part: depth (8) + offset (4)
        // - Variable part: layers
        8 + 4 + self.layers.ssz_bytes_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        // SSZ Container encoding order:
        // 1. Fixed field: depth
        self.depth.ssz_append(buf);

        // 2. Offset for variable field: layers
        let offset: u32 = 12; // 8 (depth) + 4 (offset itself)
        buf.extend_from_slice(&offset.to_le_bytes());

        // 3. Variable data: layers
        self.layers.ssz_append(buf);
    }
}

impl<TH: TweakableHash> Decode for HashTree<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        // Minimum size: depth (8) + offset (4) = 12 bytes
        const FIXED_SIZE: usize = 12;
        if bytes.len() < FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: FIXED_SIZE,
            });
        }

        // 1. Decode fixed field: depth
        let depth = u64::from_ssz_bytes(&bytes[0..8])?;

        // 2. Read offset for variable field
        let offset = u32::from_le_bytes(bytes[8..12].try_into().map_err(|_| {
            DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 12,
            }
        })?) as usize;

        // 3. Validate offset points to end of fixed part
        if offset != FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: offset,
                expected: FIXED_SIZE,
            });
        }

        // 4. Decode variable field: layers
        let layers = Vec::<HashTreeLayer<TH>>::from_ssz_bytes(&bytes[offset..])?;

        Ok(Self { depth, layers })
    }
}

impl<TH: TweakableHash> Serializable for HashTree<TH> {}

/// Opening in a hash-tree: a co-path, without the leaf
#[derive(Serialize, Deserialize, Clone)]
#[serde(bound = "")]
pub struct HashTreeOpening<TH: TweakableHash> {
    /// The co-path needed to verify.
    /// If the tree has depth h, i.e., 2^h leafs,
    /// the co-path has exactly h nodes.
    co_path: Vec<TH::Domain>,
}

impl<TH: TweakableHash> Encode for HashTreeOpening<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        // - Fixed part: offset (4 bytes)
        // - Variable part: co_path
        4 + self.co_path.ssz_bytes_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        // SSZ Container encoding order:
        // 1. Offset for variable field: co_path
        // Only the offset itself in fixed part
        let offset: u32 = 4;
        buf.extend_from_slice(&offset.to_le_bytes());

        // 2. Variable data: co_path
        self.co_path.ssz_append(buf);
    }
}

impl<TH: TweakableHash> Decode for HashTreeOpening<TH> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        // Minimum size: offset (4 bytes)
        const FIXED_SIZE: usize = 4;
        if bytes.len() < FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: FIXED_SIZE,
            });
        }

        // 1. Read offset for variable field
        let offset = u32::from_le_bytes(bytes[0..4].try_into().map_err(|_| {
            DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 4,
            }
        })?) as usize;

        // 2. Validate offset points to end of fixed part
        if offset != FIXED_SIZE {
            return Err(DecodeError::InvalidByteLength {
                len: offset,
                expected: FIXED_SIZE,
            });
        }

        // 3. Decode variable field: co_path
        let co_path = Vec::<TH::Domain>::from_ssz_bytes(&bytes[offset..])?;

        Ok(Self { co_path })
    }
}

impl<TH: TweakableHash> Serializable for HashTreeOpening<TH> {}

impl<TH> HashTree<TH>
where
    TH: TweakableHash,
{
    /// Function to compute a sparse hash-tree, given the hashes of the leafs.
    /// The tree has depth `depth`, and so it can have at most `1 << depth`
    /// leafs. The given leaf hashes occupy positions
    /// `start_index, start_index + 1, ..., start_index + leaf_hashes.len() - 1`,
    /// and all remaining positions are filled with random padding as needed.
    ///
    /// Caller must ensure that there is enough space for the leafs, i.e.,
    /// `start_index + leaf_hashes.len() <= 1 << depth`.
    ///
    /// Note: The RNG is used for generating the padding nodes. They could as
    /// well be fixed, and hence the RNG does not need to be cryptographically
    /// secure for this function.
    pub fn new<R: Rng>(
        rng: &mut R,
        depth: usize,
        start_index: usize,
        parameter: &TH::Parameter,
        leaf_hashes: Vec<TH::Domain>,
    ) -> Self {
        assert!(depth > 0, "Hash-Tree new: depth must be non-zero.");

        assert!(
            !leaf_hashes.is_empty(),
            "Hash-Tree new: need at least one leaf."
        );

        assert!(
            start_index + leaf_hashes.len() <= 1 << depth,
            "Hash-Tree new: not enough space for leafs. Consider changing start_index or number of leafs."
        );

        // we build the tree from the leaf layer to the root,
        // while building the tree, we ensure that the following two invariants hold via appropriate padding:
        // 1. the layer starts at an even index, i.e., a left child
        // 2. the layer ends at an odd index, i.e., a right child (vacuous for the root layer)
        // In this way, we can ensure that we can always hash two siblings to get their parent.

        let mut layers = Vec::with_capacity(depth + 1);

        // start with the leaf layer, padded accordingly
        layers.push(HashTreeLayer::padded(rng, leaf_hashes, start_index));

        // now, build the tree layer by layer
        for level in 0..depth {
            // Previous layer (already padded so len is even and start_index is even)
            let prev = &layers[level];

            // Parent layer starts at half the previous start index
            let parent_start = (prev.start_index >> 1) as usize;

            // Compute all parents, pairing children two-by-two.
            // We do exact chunks of two children, no remainder.
            let parents =
                TH::compute_tree_layer(parameter, level as u8 + 1, parent_start, &prev.nodes);

            // Add the new layer with padding so next iteration also has even start and length
            layers.push(HashTreeLayer::padded(rng, parents, parent_start));
        }

        Self {
            depth: depth as u64,
            layers,
        }
    }

    /// Function to get the root of the tree.
    #[must_use]
    pub fn root(&self) -> TH::Domain {
        self.layers
            .last()
            .expect("Hash-Tree must have at least one layer")
            .nodes[0]
    }

    /// Function to compute the Merkle authentication path
    /// for the node at the given position in the leaf layer.
    /// The position must be one of the positions the tree was built for.
    #[must_use]
    pub fn path(&self, position: u32) -> HashTreeOpening<TH> {
        assert!(
            !self.layers.is_empty(),
            "Hash-Tree path: Need at least one layer"
        );
        assert!(
            (position as u64) >= self.layers[0].start_index,
            "Hash-Tree path: Invalid position, position before start index"
        );
        assert!(
            (position as u64) < self.layers[0].start_index + self.layers[0].nodes.len() as u64,
            "Hash-Tree path: Invalid position, position too large"
        );

        // in our co-path, we will have one node per layer
        // except the root layer
        let mut co_path = Vec::with_capacity(self.depth as usize);
        let mut current_position = position;
        for l in 0..(self.depth as usize) {
            // position of the sibling that we want to include
            let sibling_position = current_position ^ 0x01;
            let sibling_position_in_vec =
                (sibling_position as u64 - self.layers[l].start_index) as usize;
            let sibling = self.layers[l].nodes[sibling_position_in_vec];
            co_path.push(sibling);
            // new position in next layer
            current_position >>= 1;
        }

        HashTreeOpening { co_path }
    }
}

/// Function to verify a Merkle authentication path
/// with respect to a root, a position, and a leaf.
///
/// Note: this function expects the leaf to be a list of hashes,
/// whereas `new` expects each leaf to be a single hash,
/// which should be the hash of this list of hashes.
///
/// Malformed openings (path too long for the claimed position, or a
/// position outside the tree) are rejected rather than causing a panic.
pub fn hash_tree_verify<TH: TweakableHash>(
    parameter: &TH::Parameter,
    root: &TH::Domain,
    position: u32,
    leaf: &[TH::Domain],
    opening: &HashTreeOpening<TH>,
) -> bool {
    // given the length of the path, we know how
    // large the tree was. So we can check if the
    // position makes sense.
    let depth = opening.co_path.len();
    if depth > 32 {
        return false;
    }
    let num_leafs: u64 = 1 << depth;
    if (position as u64) >= num_leafs {
        return false;
    }

    // first hash the leaf to get the node in the bottom layer
    let tweak = TH::tree_tweak(0, position);
    let mut current_node = TH::apply(parameter, &tweak, leaf);

    // now reconstruct the root using the co-path
    let mut current_position = position;
    for (l, sibling) in opening.co_path.iter().enumerate() {
        // Need to distinguish two cases, depending on
        // if current is a left child or a right child
        let children = if current_position.is_multiple_of(2) {
            // left child, so co-path contains the right sibling
            [current_node, *sibling]
        } else {
            // right child, so co-path contains the left sibling
            [*sibling, current_node]
        };

        // determine new position, which is position of the parent
        current_position >>= 1;

        // now hash to get the parent
        let tweak = TH::tree_tweak((l + 1) as u8, current_position);
        current_node = TH::apply(parameter, &tweak, &children);
    }

    // Finally, check that recomputed root matches given root
    current_node == *root
}

#[cfg(test)]
mod tests {

    use proptest::prelude::*;

    use crate::symmetric::tweak_hash::poseidon::PoseidonTweak57;
    use crate::symmetric::tweak_hash::sha::Sha3Tweak128192;

    use super::*;

    type TestTH = Sha3Tweak128192;

    /// We test that the following honest procedure succeeds:
    /// (1) build the Merkle tree to get the root,
    /// (2) build an authentication path for each leaf,
    /// (3) verify the authentication path with respect to leaf and root
    fn test_commit_open_helper<TH: TweakableHash>(
        num_leafs: usize,
        depth: usize,
        start_index: usize,
        leaf_len: usize,
    ) {
        let mut rng = rand::rng();
        // sample a random parameter and leafs
        let parameter = TH::rand_parameter(&mut rng);

        let mut leafs = Vec::new();
        for _ in 0..num_leafs {
            let mut leaf = Vec::new();
            for _ in 0..leaf_len {
                leaf.push(TH::rand_domain(&mut rng));
            }
            leafs.push(leaf);
        }

        let leafs_hashes: Vec<_> = leafs
            .iter()
            .enumerate()
            .map(|(i, v)| {
                TH::apply(
                    &parameter,
                    &TH::tree_tweak(0, (i + start_index) as u32),
                    v.as_slice(),
                )
            })
            .collect();

        // Build the hash tree using the random parameter and leaves
        let tree = HashTree::<TH>::new(&mut rng, depth, start_index, &parameter, leafs_hashes);

        // now compute a commitment, i.e., Merkle root
        let root = tree.root();

        // now check that opening and verification works as expected
        for (offset, leaf) in leafs.iter().enumerate().take(num_leafs) {
            // calculate the position
            let position = start_index as u32 + offset as u32;
            // first get the opening
            let path = tree.path(position);
            // the path must have one node per level below the root
            assert_eq!(path.co_path.len(), depth);
            // now assert that it verifies
            assert!(hash_tree_verify(&parameter, &root, position, leaf, &path));
        }
    }

    #[test]
    fn test_commit_open_verify_full_tree() {
        test_commit_open_helper::<TestTH>(1024, 10, 0, 3);
    }

    #[test]
    fn test_commit_open_verify_half_tree_left() {
        test_commit_open_helper::<TestTH>(512, 10, 0, 5);
    }

    #[test]
    fn test_commit_open_verify_half_tree_right() {
        test_commit_open_helper::<TestTH>(512, 10, 512, 10);
    }

    #[test]
    fn test_commit_open_verify_small_sparse() {
        test_commit_open_helper::<TestTH>(2, 2, 2, 6);
    }

    #[test]
    fn test_commit_open_verify_sparse_non_aligned() {
        test_commit_open_helper::<TestTH>(213, 10, 217, 3);
    }

    #[test]
    fn test_commit_open_verify_sparse_window() {
        // depth 5, five real leafs starting at position 10
        test_commit_open_helper::<TestTH>(5, 5, 10, 4);
    }

    #[test]
    fn test_commit_open_verify_poseidon() {
        test_commit_open_helper::<PoseidonTweak57>(16, 5, 9, 3);
    }

    #[test]
    fn test_verify_rejects_wrong_leaf_position_and_path() {
        let mut rng = rand::rng();
        let parameter = TestTH::rand_parameter(&mut rng);

        let depth = 5;
        let start_index = 10;
        let num_leafs = 5;
        let leaf_len = 4;

        let leafs: Vec<Vec<_>> = (0..num_leafs)
            .map(|_| (0..leaf_len).map(|_| TestTH::rand_domain(&mut rng)).collect())
            .collect();

        let leafs_hashes: Vec<_> = leafs
            .iter()
            .enumerate()
            .map(|(i, v)| {
                TestTH::apply(
                    &parameter,
                    &TestTH::tree_tweak(0, (i + start_index) as u32),
                    v.as_slice(),
                )
            })
            .collect();

        let tree = HashTree::<TestTH>::new(&mut rng, depth, start_index, &parameter, leafs_hashes);
        let root = tree.root();

        let position = start_index as u32 + 2;
        let path = tree.path(position);

        // honest verification succeeds
        assert!(hash_tree_verify(
            &parameter,
            &root,
            position,
            &leafs[2],
            &path
        ));

        // verifying against the wrong leaf fails
        assert!(!hash_tree_verify(
            &parameter,
            &root,
            position,
            &leafs[3],
            &path
        ));

        // verifying against the wrong position fails
        assert!(!hash_tree_verify(
            &parameter,
            &root,
            position + 1,
            &leafs[2],
            &path
        ));

        // verifying with a random co-path fails
        let random_path = HashTreeOpening::<TestTH> {
            co_path: (0..depth).map(|_| TestTH::rand_domain(&mut rng)).collect(),
        };
        assert!(!hash_tree_verify(
            &parameter,
            &root,
            position,
            &leafs[2],
            &random_path
        ));
    }

    #[test]
    fn test_verify_rejects_position_beyond_path_length() {
        let mut rng = rand::rng();
        let parameter = TestTH::rand_parameter(&mut rng);

        // a co-path of length 3 commits to a tree with 8 leafs, so
        // position 8 cannot be valid
        let leaf = [TestTH::rand_domain(&mut rng)];
        let opening = HashTreeOpening::<TestTH> {
            co_path: (0..3).map(|_| TestTH::rand_domain(&mut rng)).collect(),
        };
        let root = TestTH::rand_domain(&mut rng);

        assert!(!hash_tree_verify(&parameter, &root, 8, &leaf, &opening));
    }

    proptest! {
        #[test]
        fn proptest_commit_open_verify(
            // Test with up to 32 leaf nodes (fast but nontrivial)
            num_leafs in 1usize..32,

            // Tree depth capped at 6 → supports up to 64 leaves
            depth in 3usize..7,

            // Start index limited to 0–64 (sparse trees, padded trees)
            start_index in 0usize..64,

            // Leaves with up to 5 elements (non-scalar values)
            leaf_len in 1usize..5,
        ) {
            // Make sure the leaves actually fit in the tree
            prop_assume!(start_index + num_leafs <= 1 << depth);

            test_commit_open_helper::<TestTH>(num_leafs, depth, start_index, leaf_len);
        }
    }

    #[test]
    fn test_ssz_encoding_structure() {
        let mut rng = rand::rng();

        // HashTreeLayer: Generate sample nodes
        let nodes: Vec<_> = (0..3).map(|_| TestTH::rand_domain(&mut rng)).collect();
        let layer = HashTreeLayer::<TestTH> {
            start_index: 256,
            nodes,
        };
        let encoded = layer.as_ssz_bytes();
        // Verify minimum size: 8 bytes for index + 4 bytes for offset
        assert!(encoded.len() >= 12);
        // Verify index value in bytes 0-8
        assert_eq!(u64::from_le_bytes(encoded[0..8].try_into().unwrap()), 256);
        // Verify offset value in bytes 8-12 points to byte 12
        assert_eq!(u32::from_le_bytes(encoded[8..12].try_into().unwrap()), 12);

        // HashTree: fixed part is depth (8) + offset (4) = 12 bytes
        let tree = HashTree::<TestTH> {
            depth: 16,
            layers: vec![],
        };
        let encoded = tree.as_ssz_bytes();
        assert!(encoded.len() >= 12);
        assert_eq!(u64::from_le_bytes(encoded[0..8].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(encoded[8..12].try_into().unwrap()), 12);

        // HashTreeOpening: fixed part is one offset
        let co_path: Vec<_> = (0..5).map(|_| TestTH::rand_domain(&mut rng)).collect();
        let opening = HashTreeOpening::<TestTH> { co_path };
        let encoded = opening.as_ssz_bytes();
        assert!(encoded.len() >= 4);
        assert_eq!(u32::from_le_bytes(encoded[0..4].try_into().unwrap()), 4);
    }

    #[test]
    fn test_ssz_decoding_errors() {
        // HashTreeLayer: Buffer too small (8 bytes instead of minimum 12)
        let encoded = vec![0u8; 8];
        let result = HashTreeLayer::<TestTH>::from_ssz_bytes(&encoded);
        assert!(matches!(result, Err(DecodeError::InvalidByteLength { .. })));

        // HashTreeLayer: Invalid offset value (99 instead of 12)
        let mut encoded = vec![0u8; 12];
        encoded[0..8].copy_from_slice(&0u64.to_le_bytes());
        encoded[8..12].copy_from_slice(&99u32.to_le_bytes());
        let result = HashTreeLayer::<TestTH>::from_ssz_bytes(&encoded);
        assert!(matches!(
            result,
            Err(DecodeError::InvalidByteLength { expected: 12, .. })
        ));

        // HashTree: Buffer too small (6 bytes instead of minimum 12)
        let encoded = vec![0u8; 6];
        let result = HashTree::<TestTH>::from_ssz_bytes(&encoded);
        assert!(matches!(result, Err(DecodeError::InvalidByteLength { .. })));

        // HashTreeOpening: Invalid offset value (10 instead of 4)
        let mut encoded = vec![0u8; 4];
        encoded[0..4].copy_from_slice(&10u32.to_le_bytes());
        let result = HashTreeOpening::<TestTH>::from_ssz_bytes(&encoded);
        assert!(matches!(
            result,
            Err(DecodeError::InvalidByteLength { expected: 4, .. })
        ));
    }

    #[test]
    fn test_ssz_merkle_integration() {
        let mut rng = rand::rng();
        let parameter = TestTH::rand_parameter(&mut rng);

        // Build tree: 8 leaves at depth 3
        let num_leafs = 8;
        let depth = 3;
        let start_index = 0;
        let leaf_len = 2;
        // Generate leaf data
        let mut leafs = Vec::new();
        for _ in 0..num_leafs {
            let leaf: Vec<_> = (0..leaf_len)
                .map(|_| TestTH::rand_domain(&mut rng))
                .collect();
            leafs.push(leaf);
        }
        // Hash leaves for tree construction
        let leafs_hashes: Vec<_> = leafs
            .iter()
            .enumerate()
            .map(|(i, v)| TestTH::apply(&parameter, &TestTH::tree_tweak(0, i as u32), v.as_slice()))
            .collect();
        // Build complete merkle tree
        let tree = HashTree::<TestTH>::new(&mut rng, depth, start_index, &parameter, leafs_hashes);
        let root = tree.root();

        // Test tree serialization roundtrip
        let tree_encoded = tree.as_ssz_bytes();
        let tree_decoded = HashTree::<TestTH>::from_ssz_bytes(&tree_encoded).unwrap();
        // Verify decoded tree has same root
        assert_eq!(root, tree_decoded.root());

        // Test authentication path at position 3
        let position = 3u32;
        let path = tree.path(position);
        let leaf = &leafs[position as usize];

        // Test path serialization roundtrip
        let path_encoded = path.as_ssz_bytes();
        let path_decoded = HashTreeOpening::<TestTH>::from_ssz_bytes(&path_encoded).unwrap();

        // Verify decoded path authenticates correctly
        assert!(hash_tree_verify(
            &parameter,
            &root,
            position,
            leaf,
            &path_decoded
        ));

        // Verify path from decoded tree also works
        let path_from_decoded = tree_decoded.path(position);
        assert!(hash_tree_verify(
            &parameter,
            &root,
            position,
            leaf,
            &path_from_decoded
        ));
    }

    proptest! {
        #[test]
        fn proptest_hash_tree_opening_ssz_roundtrip(
            co_path_len in 0usize..64,
        ) {
            // Generate random authentication path
            let mut rng = rand::rng();
            let co_path: Vec<_> = (0..co_path_len).map(|_| TestTH::rand_domain(&mut rng)).collect();
            let opening = HashTreeOpening::<TestTH> { co_path };

            // Perform serialization roundtrip
            let encoded = opening.as_ssz_bytes();
            let decoded = HashTreeOpening::<TestTH>::from_ssz_bytes(&encoded).unwrap();

            // Verify path preserved, and re-encoding is deterministic
            prop_assert_eq!(opening.co_path.len(), decoded.co_path.len());
            for i in 0..opening.co_path.len() {
                prop_assert_eq!(opening.co_path[i], decoded.co_path[i]);
            }
            let reencoded = decoded.as_ssz_bytes();
            prop_assert_eq!(encoded, reencoded);
        }
    }
}
