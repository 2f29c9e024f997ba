use num_bigint::BigUint;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Largest hypercube dimension for which layer sizes are tabulated.
pub(crate) const MAX_DIMENSION: usize = 100;

/// Layer sizes and prefix sums for the hypercubes `[0, w-1]^v` at a fixed
/// base `w`, for every dimension `v = 1..=MAX_DIMENSION`.
///
/// Layer `d` of `[0, w-1]^v` is the set of vertices whose coordinate sum is
/// `(w-1) * v - d`. Equivalently, `d` is the total *deficiency* of the
/// vertex: the sum of `w - 1 - a_i` over all coordinates. Layer 0 is the
/// single all-`(w-1)` vertex, and layer `(w-1) * v` is the all-zero vertex.
pub(crate) struct LayerTable {
    /// `sizes[v - 1][d]`: number of vertices in layer `d` of `[0, w-1]^v`
    sizes: Vec<Vec<BigUint>>,
    /// `prefixes[v - 1][d] = sizes[v - 1][0] + ... + sizes[v - 1][d]`
    prefixes: Vec<Vec<BigUint>>,
}

impl LayerTable {
    /// Tabulates all layer sizes for the given base via the recurrence
    ///
    /// `sizes[v][d] = sum of sizes[v - 1][d - a]` for
    /// `a in max(0, d - (w-1)(v-1))..=min(d, w-1)`,
    ///
    /// with base case `sizes[1][d] = 1` for `d in 0..w`.
    fn new(base: usize) -> Self {
        assert!(base >= 2, "Hypercube: base must be at least 2");

        let mut sizes: Vec<Vec<BigUint>> = Vec::with_capacity(MAX_DIMENSION);
        sizes.push(vec![BigUint::from(1u32); base]);

        for v in 2..=MAX_DIMENSION {
            let max_d = (base - 1) * v;
            let prev = &sizes[v - 2];
            let mut row = Vec::with_capacity(max_d + 1);
            for d in 0..=max_d {
                let lo = d.saturating_sub((base - 1) * (v - 1));
                let hi = d.min(base - 1);
                let mut acc = BigUint::from(0u32);
                for a in lo..=hi {
                    acc += &prev[d - a];
                }
                row.push(acc);
            }
            sizes.push(row);
        }

        let prefixes = sizes
            .iter()
            .map(|row| {
                let mut acc = BigUint::from(0u32);
                row.iter()
                    .map(|size| {
                        acc += size;
                        acc.clone()
                    })
                    .collect()
            })
            .collect();

        Self { sizes, prefixes }
    }

    fn sizes_row(&self, dimension: usize) -> &[BigUint] {
        &self.sizes[dimension - 1]
    }

    fn prefixes_row(&self, dimension: usize) -> &[BigUint] {
        &self.prefixes[dimension - 1]
    }
}

/// Returns the layer table for the given base, computing and caching it on
/// first use.
///
/// The cache is a process-wide insert-only map keyed by base. Lookups take a
/// read lock; a miss upgrades to the write lock and re-checks before
/// inserting, so a race at most recomputes the table once. Published tables
/// are immutable and shared via `Arc`, so readers hold no lock while using
/// them.
pub(crate) fn layer_table(base: usize) -> Arc<LayerTable> {
    static CACHE: OnceLock<RwLock<HashMap<usize, Arc<LayerTable>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    if let Some(table) = cache
        .read()
        .expect("hypercube layer cache poisoned")
        .get(&base)
    {
        return Arc::clone(table);
    }

    let mut tables = cache.write().expect("hypercube layer cache poisoned");
    Arc::clone(
        tables
            .entry(base)
            .or_insert_with(|| Arc::new(LayerTable::new(base))),
    )
}

/// Number of vertices in layer `layer` of `[0, base-1]^dimension`.
#[cfg(test)]
pub(crate) fn hypercube_layer_size(base: usize, dimension: usize, layer: usize) -> BigUint {
    assert!(dimension >= 1 && dimension <= MAX_DIMENSION);
    assert!(layer <= (base - 1) * dimension);
    layer_table(base).sizes_row(dimension)[layer].clone()
}

/// Total number of vertices in layers `0..=final_layer` of
/// `[0, base-1]^dimension`.
pub(crate) fn hypercube_part_size(base: usize, dimension: usize, final_layer: usize) -> BigUint {
    assert!(dimension >= 1 && dimension <= MAX_DIMENSION);
    assert!(final_layer <= (base - 1) * dimension);
    layer_table(base).prefixes_row(dimension)[final_layer].clone()
}

/// Locates the layer containing the `x`-th vertex of `[0, base-1]^dimension`,
/// where vertices are numbered layer by layer starting from layer 0.
///
/// Returns the layer `d` (the smallest `d` whose prefix sum exceeds `x`) and
/// the offset of the vertex within that layer.
///
/// Panics if `x` is not smaller than the total number of vertices.
pub(crate) fn hypercube_find_layer(base: usize, dimension: usize, x: &BigUint) -> (usize, BigUint) {
    assert!(dimension >= 1 && dimension <= MAX_DIMENSION);
    let table = layer_table(base);
    let prefixes = table.prefixes_row(dimension);
    assert!(
        x < prefixes.last().expect("prefix table is never empty"),
        "Hypercube find layer: index exceeds hypercube size"
    );

    // partition point: prefixes is strictly increasing in the relevant range
    let layer = prefixes.partition_point(|prefix| prefix <= x);
    let offset = if layer == 0 {
        x.clone()
    } else {
        x - &prefixes[layer - 1]
    };
    (layer, offset)
}

/// Maps an offset `x in [0, layer_size(base, dimension, layer))` to the
/// `x`-th vertex of that layer, via greedy decoding of the combinatorial
/// number system.
///
/// Coordinates are fixed left to right. For each coordinate, candidate
/// deficiencies `j = w - 1 - a` are scanned in increasing order; each
/// candidate accounts for `sizes[remaining][d - j]` vertices, and the scan
/// stops at the first candidate whose block still contains `x`.
pub(crate) fn map_to_vertex(base: usize, dimension: usize, layer: usize, x: BigUint) -> Vec<u8> {
    assert!(dimension >= 1 && dimension <= MAX_DIMENSION);
    assert!(layer <= (base - 1) * dimension);

    let table = layer_table(base);
    assert!(
        x < table.sizes_row(dimension)[layer],
        "Hypercube map to vertex: offset exceeds layer size"
    );

    let mut x = x;
    let mut d_curr = layer;
    let mut vertex = Vec::with_capacity(dimension);

    for i in 0..dimension - 1 {
        // dimensions that remain after this coordinate is fixed
        let remaining = dimension - 1 - i;
        let row = table.sizes_row(remaining);

        // smallest feasible deficiency for this coordinate: the remaining
        // coordinates can absorb at most (w-1) * remaining
        let mut j = d_curr.saturating_sub((base - 1) * remaining);
        loop {
            let block = &row[d_curr - j];
            if x < *block {
                break;
            }
            x -= block;
            j += 1;
        }

        vertex.push((base - 1 - j) as u8);
        d_curr -= j;
    }

    // One coordinate left: it must absorb the whole remaining deficiency.
    // At this point x < sizes[1][d_curr] = 1, so x is zero.
    let x_final = u64::try_from(&x).expect("final offset fits in u64") as usize;
    vertex.push((base - 1 - x_final - d_curr) as u8);

    vertex
}

/// Inverse of [`map_to_vertex`]: recovers the offset of a vertex within its
/// layer. Exercised by the round-trip tests; signing only needs the forward
/// direction.
#[cfg(test)]
pub(crate) fn map_to_integer(base: usize, dimension: usize, layer: usize, vertex: &[u8]) -> BigUint {
    assert_eq!(vertex.len(), dimension);
    assert!(dimension >= 1 && dimension <= MAX_DIMENSION);
    debug_assert_eq!(
        vertex.iter().map(|&a| base - 1 - a as usize).sum::<usize>(),
        layer,
        "Hypercube map to integer: vertex is not in the given layer"
    );

    let table = layer_table(base);
    let mut x = BigUint::from(0u32);
    let mut d_curr = layer;

    for i in 0..dimension - 1 {
        let remaining = dimension - 1 - i;
        let row = table.sizes_row(remaining);

        let j = base - 1 - vertex[i] as usize;
        let lo = d_curr.saturating_sub((base - 1) * remaining);
        for j_smaller in lo..j {
            x += &row[d_curr - j_smaller];
        }
        d_curr -= j;
    }

    x
}
