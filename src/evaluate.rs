//! Exact-neighbor evaluation of a compiled index.
//!
//! Brute force is too slow to serve queries, but as a quality probe over a
//! small sample it is exactly what is needed: scan everything, then compare
//! compiled rows against exact rows rank by rank.

use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;

use crate::error::{GraphError, Result};
use crate::heap::NeighborHeap;
use crate::index::Neighbor;

/// Guards the rank-ratio against division by zero when a true nearest
/// neighbor sits at distance 0.
const RATIO_EPSILON: f32 = 1e-9;

/// Exact top-`k` neighbors of `query` by full scan of the item store.
pub(crate) fn exact_k_nearest<L, V, F>(
    items: &HashMap<L, V>,
    query: &L,
    k: usize,
    distance: &F,
) -> Vec<Neighbor<L>>
where
    L: Eq + Hash + Clone,
    F: Fn(&V, &V) -> f32,
{
    let query_value = &items[query];
    let mut heap = NeighborHeap::new(query.clone(), k);
    for (label, value) in items {
        if label == query {
            continue;
        }
        let d = distance(query_value, value);
        // Skip the label clone when the candidate cannot be admitted.
        if heap.len() == k && heap.peek_max().is_some_and(|(_, worst)| d >= worst) {
            continue;
        }
        heap.try_insert(label.clone(), d);
    }
    heap.drain_ascending()
}

/// Mean rank-ratio of compiled rows against exact rows over `sample_size`
/// queries drawn uniformly with replacement.
pub(crate) fn error_ratio<L, V, F, R>(
    items: &HashMap<L, V>,
    compiled: &HashMap<L, Vec<Neighbor<L>>>,
    k: usize,
    sample_size: usize,
    distance: &F,
    rng: &mut R,
) -> Result<f32>
where
    L: Eq + Hash + Clone,
    F: Fn(&V, &V) -> f32,
    R: Rng,
{
    if sample_size == 0 {
        return Err(GraphError::InvalidParameter(
            "sample_size must be at least 1".into(),
        ));
    }
    let labels: Vec<&L> = items.keys().collect();
    let mut total = 0.0f32;
    for _ in 0..sample_size {
        let query = labels[rng.random_range(0..labels.len())];
        let exact = exact_k_nearest(items, query, k, distance);
        let approx = compiled.get(query).ok_or(GraphError::NotCompiled)?;
        total += rank_ratio(approx, &exact)?;
    }
    Ok(total / sample_size as f32)
}

/// Mean per-rank ratio of approximate to exact distance for one query.
fn rank_ratio<L>(approx: &[Neighbor<L>], exact: &[Neighbor<L>]) -> Result<f32> {
    if approx.len() != exact.len() {
        return Err(GraphError::LengthMismatch {
            exact: exact.len(),
            approx: approx.len(),
        });
    }
    if exact.is_empty() {
        return Ok(1.0);
    }
    let sum: f32 = approx
        .iter()
        .zip(exact)
        .map(|(a, e)| (a.distance + RATIO_EPSILON) / (e.distance + RATIO_EPSILON))
        .sum();
    Ok(sum / exact.len() as f32)
}
