//! Approximate k-nearest-neighbor graphs for arbitrary item sets.
//!
//! `proxima` builds, for every item in a labeled collection, an ordered
//! list of its `k` approximate nearest neighbors under a caller-supplied
//! distance function. The distance is an opaque callable: no symmetry, no
//! triangle inequality, no vector assumptions. Anything deterministic on
//! equal inputs works, which makes the index usable for strings, sets,
//! embeddings, or any payload you can score pairwise.
//!
//! # Algorithm
//!
//! The index is built by randomized neighbor refinement (the NN-Descent
//! family), resting on one observation: a neighbor of my neighbor is
//! likely my neighbor.
//!
//! 1. Seed every item's working list with `2·k` random candidates.
//! 2. Each trial picks a random item `u`, a random neighbor `v` of `u`,
//!    and a random neighbor `w` of `v`, then tests the `u`–`w` distance
//!    against both items' current worst neighbor.
//! 3. After an epoch of `N` trials, stop once improvements dry up (none
//!    at all, or a rate below the configured `delta`).
//!
//! A brute-force table needs `O(N²)` distance calls; refinement needs
//! `O(N·k)` for seeding plus `O(N)` per epoch, and converges in few
//! epochs on well-behaved data.
//!
//! Recompiling after inserts is cheaper than it looks: the previous
//! compiled table seeds the new working lists (warm start), so quality
//! carries over and successive compiles can only tighten each row.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use proxima::{KnnConfig, KnnIndex};
//!
//! # fn main() -> proxima::Result<()> {
//! let items: HashMap<u32, f32> = (0..100).map(|i| (i, i as f32)).collect();
//! let config = KnnConfig::default().with_k(5).with_seed(7);
//! let mut index = KnnIndex::with_config(items, config, |a: &f32, b: &f32| (a - b).abs())?;
//!
//! let nearest = index.k_nearest(&50, 3)?;
//! assert_eq!(nearest.len(), 3);
//!
//! // Mutations invalidate queries until the next compile.
//! index.insert(100, 100.5);
//! assert!(index.k_nearest(&50, 3).is_err());
//! index.compile()?;
//! assert!(index.k_nearest(&100, 3).is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! # Quality probing
//!
//! [`KnnIndex::error_ratio`] compares compiled rows against exact
//! brute-force rows over a random sample of queries, rank by rank. A
//! perfect index scores 1.0; scores grow as rows degrade. It is a probe,
//! not a production query path.
//!
//! # References
//!
//! - Dong, Charikar & Li (2011): "Efficient K-Nearest Neighbor Graph
//!   Construction for Generic Similarity Measures" (WWW '11)

pub mod distance;
pub mod error;
pub mod heap;

mod descent;
mod evaluate;
mod index;
mod sample;

pub use error::{GraphError, Result};
pub use index::{CompileStats, KnnConfig, KnnIndex, Neighbor};
