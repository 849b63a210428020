//! Uniform sampling helpers for seeding and refinement.

use std::collections::HashSet;
use std::hash::Hash;

use rand::Rng;
use smallvec::SmallVec;

use crate::heap::NeighborHeap;

/// Draw `count` distinct labels from `universe`, skipping any in `avoid`.
///
/// Uniform over the eligible labels. The caller must guarantee that at
/// least `count` labels are eligible (the facade's pool check does this);
/// rejection sampling then terminates with probability 1.
pub(crate) fn sample_distinct<L, R>(
    universe: &[L],
    count: usize,
    avoid: &HashSet<L>,
    rng: &mut R,
) -> SmallVec<[L; 16]>
where
    L: Eq + Hash + Clone,
    R: Rng,
{
    debug_assert!(
        count <= universe.len().saturating_sub(avoid.len()),
        "caller must leave at least `count` eligible labels"
    );
    let mut picked: SmallVec<[L; 16]> = SmallVec::new();
    let mut taken: HashSet<L> = HashSet::with_capacity(count);
    while picked.len() < count {
        let candidate = &universe[rng.random_range(0..universe.len())];
        if avoid.contains(candidate) || taken.contains(candidate) {
            continue;
        }
        taken.insert(candidate.clone());
        picked.push(candidate.clone());
    }
    picked
}

/// Uniform random member label of a non-empty heap.
pub(crate) fn random_key<'a, L, R>(heap: &'a NeighborHeap<L>, rng: &mut R) -> &'a L
where
    L: Eq + Hash + Clone,
    R: Rng,
{
    heap.label_at(rng.random_range(0..heap.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_are_distinct_and_avoid_excluded() {
        let universe: Vec<u32> = (0..50).collect();
        let avoid: HashSet<u32> = [3, 7, 11].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);

        let picked = sample_distinct(&universe, 20, &avoid, &mut rng);
        assert_eq!(picked.len(), 20);
        let unique: HashSet<&u32> = picked.iter().collect();
        assert_eq!(unique.len(), 20);
        for label in &picked {
            assert!(!avoid.contains(label));
        }
    }

    #[test]
    fn terminates_when_pool_is_exact() {
        // Eligible pool exactly matches the requested count.
        let universe: Vec<u32> = (0..10).collect();
        let avoid: HashSet<u32> = [0, 1].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(2);

        let picked = sample_distinct(&universe, 8, &avoid, &mut rng);
        let unique: HashSet<u32> = picked.iter().copied().collect();
        assert_eq!(unique, (2..10).collect::<HashSet<u32>>());
    }

    #[test]
    fn zero_count_yields_nothing() {
        let universe: Vec<u32> = (0..5).collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sample_distinct(&universe, 0, &HashSet::new(), &mut rng).is_empty());
    }

    #[test]
    fn random_key_hits_every_member() {
        let mut heap = NeighborHeap::new(0u32, 4);
        for (label, d) in [(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)] {
            heap.try_insert(label, d);
        }
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen: HashSet<u32> = HashSet::new();
        for _ in 0..200 {
            seen.insert(*random_key(&heap, &mut rng));
        }
        assert_eq!(seen, [1, 2, 3, 4].into_iter().collect());
    }
}
