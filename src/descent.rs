//! The neighbors-of-neighbors refinement engine.
//!
//! Builds the compiled k-NN table by randomized descent: seed every item's
//! working heap with candidates, then repeatedly pick a random two-hop
//! contact `w` of a random item `u` and test the pair against both
//! endpoints' heaps. An epoch is `N` such trials; the loop stops when an
//! epoch produces no improvements or the improvement ratio has fallen
//! below the convergence threshold.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use rand::Rng;

use crate::heap::NeighborHeap;
use crate::index::{CompileStats, Neighbor};
use crate::sample::{random_key, sample_distinct};

pub(crate) struct Refinement<L> {
    pub(crate) compiled: HashMap<L, Vec<Neighbor<L>>>,
    pub(crate) stats: CompileStats,
}

/// Build a compiled k-NN table for `items` by randomized refinement.
///
/// `prior` is the previous compiled table (empty on a cold compile); its
/// rows pre-seed the working heaps so a recompile starts from the best
/// graph known so far instead of from scratch. The caller has already
/// checked the pool size, so every working heap fills to capacity `2·k`.
pub(crate) fn refine<L, V, F, R>(
    items: &HashMap<L, V>,
    prior: &HashMap<L, Vec<Neighbor<L>>>,
    k: usize,
    delta: f32,
    distance: &F,
    rng: &mut R,
) -> Refinement<L>
where
    L: Eq + Hash + Clone,
    F: Fn(&V, &V) -> f32,
    R: Rng,
{
    let labels: Vec<L> = items.keys().cloned().collect();
    let n = labels.len();
    let capacity = 2 * k;
    let mut distance_calls: u64 = 0;

    // Seeding. Warm items keep their prior row's labels and top up with
    // fresh uniform samples; cold items start fully random. Every seed is
    // scored against the current item values: a prior row may predate an
    // overwrite, and refinement never re-examines an admitted entry.
    let mut graph: HashMap<L, NeighborHeap<L>> = HashMap::with_capacity(n);
    for item in &labels {
        let mut heap = NeighborHeap::new(item.clone(), capacity);
        let mut avoid: HashSet<L> = HashSet::with_capacity(k + 1);
        avoid.insert(item.clone());
        if let Some(row) = prior.get(item) {
            for seed in row {
                avoid.insert(seed.label.clone());
                let d = distance(&items[item], &items[&seed.label]);
                distance_calls += 1;
                heap.try_insert(seed.label.clone(), d);
            }
        }
        let fresh = sample_distinct(&labels, capacity - heap.len(), &avoid, rng);
        for candidate in fresh {
            let d = distance(&items[item], &items[&candidate]);
            distance_calls += 1;
            heap.try_insert(candidate, d);
        }
        graph.insert(item.clone(), heap);
    }

    // Epochs of N random two-hop trials each. The stop test uses the
    // running minimum of the per-epoch improvement ratio: once any epoch
    // has dipped below delta, later epochs cannot keep the loop alive.
    let mut epochs = 0usize;
    let mut best_ratio = f32::INFINITY;
    let mut last_improvements = 0usize;
    loop {
        let mut improvements = 0usize;
        for _ in 0..n {
            let u = &labels[rng.random_range(0..n)];
            let v = random_key(&graph[u], rng).clone();
            let w = random_key(&graph[&v], rng).clone();
            if w == *u {
                continue;
            }
            let d = distance(&items[u], &items[&w]);
            distance_calls += 1;
            // One computed distance serves both directions, even when the
            // underlying function is not symmetric.
            for (target, candidate) in [(u, &w), (&w, u)] {
                if let Some(heap) = graph.get_mut(target) {
                    let admits = heap.peek_max().is_some_and(|(_, worst)| worst > d);
                    if admits && heap.try_insert(candidate.clone(), d) {
                        improvements += 1;
                    }
                }
            }
        }
        epochs += 1;
        last_improvements = improvements;
        let ratio = improvements as f32 / n as f32;
        best_ratio = best_ratio.min(ratio);
        if improvements == 0 || best_ratio < delta {
            break;
        }
    }

    let compiled = graph
        .into_iter()
        .map(|(item, mut heap)| {
            let mut row = heap.drain_ascending();
            row.truncate(k);
            (item, row)
        })
        .collect();

    Refinement {
        compiled,
        stats: CompileStats {
            epochs,
            last_improvements,
            best_ratio,
            distance_calls,
        },
    }
}
