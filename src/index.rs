//! The public k-NN index facade.
//!
//! Owns the item store and the compiled neighbor table, and gates queries
//! behind the dirty flag: any mutation invalidates the table until the next
//! successful [`KnnIndex::compile`].

use std::collections::HashMap;
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::descent;
use crate::error::{GraphError, Result};
use crate::evaluate;

/// One entry in a compiled row: a neighbor's label and its distance from
/// the row's owner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neighbor<L> {
    pub label: L,
    pub distance: f32,
}

/// Tuning knobs for index construction.
///
/// `k` is the number of neighbors reported per item. During compilation
/// each item works with `2·k` candidate slots; the headroom keeps good
/// neighbors from being evicted by sampling noise before refinement can
/// propagate them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KnnConfig {
    /// Neighbors retained per item.
    pub k: usize,
    /// Convergence threshold on the per-epoch improvement ratio, in (0, 1].
    pub delta: f32,
    /// Seed for the sampling RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: 10,
            delta: 0.05,
            seed: None,
        }
    }
}

impl KnnConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_delta(mut self, delta: f32) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(GraphError::InvalidParameter("k must be at least 1".into()));
        }
        validate_delta(self.delta)
    }
}

fn validate_delta(delta: f32) -> Result<()> {
    if !(delta > 0.0 && delta <= 1.0) {
        return Err(GraphError::InvalidParameter(format!(
            "delta must be in (0, 1], got {delta}"
        )));
    }
    Ok(())
}

/// Counters from the most recent compile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileStats {
    /// Refinement epochs run before convergence.
    pub epochs: usize,
    /// Improvements recorded in the final epoch.
    pub last_improvements: usize,
    /// Lowest per-epoch improvement ratio seen.
    pub best_ratio: f32,
    /// Distance evaluations across seeding and refinement.
    pub distance_calls: u64,
}

/// Approximate k-nearest-neighbor index over a labeled item set.
///
/// Generic over the label type `L`, the payload type `V`, and the distance
/// function `F`. The distance is an injected capability, not a trait bound
/// on `V`: any deterministic `Fn(&V, &V) -> f32` works, symmetric or not.
///
/// # Example
///
/// ```
/// use proxima::{KnnConfig, KnnIndex};
///
/// # fn main() -> proxima::Result<()> {
/// let config = KnnConfig::default().with_k(3).with_seed(7);
/// let mut index = KnnIndex::from_values_with_config(
///     0..40i32,
///     config,
///     |a: &i32, b: &i32| (a - b).abs() as f32,
/// )?;
///
/// let nearest = index.k_nearest(&20, 3)?;
/// assert_eq!(nearest.len(), 3);
///
/// index.insert_value(40);
/// assert!(index.k_nearest(&20, 3).is_err()); // stale until recompiled
/// index.compile()?;
/// assert!(index.k_nearest(&20, 3).is_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KnnIndex<L, V, F> {
    items: HashMap<L, V>,
    compiled: HashMap<L, Vec<Neighbor<L>>>,
    config: KnnConfig,
    distance: F,
    dirty: bool,
    stats: Option<CompileStats>,
}

impl<L, V, F> KnnIndex<L, V, F>
where
    L: Eq + Hash + Clone,
    F: Fn(&V, &V) -> f32,
{
    /// Build an index over `items` with the default config and compile it.
    pub fn new(items: HashMap<L, V>, distance: F) -> Result<Self> {
        Self::with_config(items, KnnConfig::default(), distance)
    }

    /// Build an index over `items` and compile it immediately.
    ///
    /// Fails with [`GraphError::InsufficientPool`] when the store holds
    /// fewer than `2·k + 1` items.
    pub fn with_config(items: HashMap<L, V>, config: KnnConfig, distance: F) -> Result<Self> {
        config.validate()?;
        let mut index = Self {
            items,
            compiled: HashMap::new(),
            config,
            distance,
            dirty: true,
            stats: None,
        };
        index.compile()?;
        Ok(index)
    }

    /// Insert an item, or overwrite the value under an existing label.
    ///
    /// Marks the index stale: queries are rejected until the next
    /// successful [`compile`](Self::compile).
    pub fn insert(&mut self, label: L, value: V) {
        self.items.insert(label, value);
        self.dirty = true;
    }

    /// Recompile with the configured convergence threshold.
    pub fn compile(&mut self) -> Result<()> {
        self.compile_with(self.config.delta)
    }

    /// Rebuild the compiled table, seeding from the previous one when it
    /// exists. On error the previous table and the dirty flag are left
    /// untouched.
    pub fn compile_with(&mut self, delta: f32) -> Result<()> {
        validate_delta(delta)?;
        let required = 2 * self.config.k + 1;
        if self.items.len() < required {
            return Err(GraphError::InsufficientPool {
                required,
                available: self.items.len(),
            });
        }
        let mut rng = self.make_rng(0);
        let refinement = descent::refine(
            &self.items,
            &self.compiled,
            self.config.k,
            delta,
            &self.distance,
            &mut rng,
        );
        self.compiled = refinement.compiled;
        self.stats = Some(refinement.stats);
        self.dirty = false;
        Ok(())
    }

    /// First `min(k, row length)` compiled neighbors of `label`, ascending
    /// by distance.
    ///
    /// Unknown labels yield an empty vec, not an error. Fails with
    /// [`GraphError::NotCompiled`] while the index is stale.
    pub fn k_nearest(&self, label: &L, k: usize) -> Result<Vec<Neighbor<L>>> {
        if self.dirty {
            return Err(GraphError::NotCompiled);
        }
        Ok(self
            .compiled
            .get(label)
            .map(|row| row.iter().take(k).cloned().collect())
            .unwrap_or_default())
    }

    /// Quality probe: mean rank-ratio of compiled rows against exact
    /// brute-force rows over `sample_size` random queries.
    ///
    /// The result is ≥ 1.0 and equals 1.0 exactly when every sampled row
    /// matches exact k-NN. Fails with [`GraphError::NotCompiled`] while
    /// the index is stale.
    pub fn error_ratio(&self, sample_size: usize) -> Result<f32> {
        if self.dirty {
            return Err(GraphError::NotCompiled);
        }
        let mut rng = self.make_rng(1);
        evaluate::error_ratio(
            &self.items,
            &self.compiled,
            self.config.k,
            sample_size,
            &self.distance,
            &mut rng,
        )
    }

    /// Number of items in the store (compiled or not).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, label: &L) -> bool {
        self.items.contains_key(label)
    }

    pub fn get(&self, label: &L) -> Option<&V> {
        self.items.get(label)
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// False iff the store was mutated since the last successful compile.
    pub fn is_compiled(&self) -> bool {
        !self.dirty
    }

    pub fn last_compile_stats(&self) -> Option<CompileStats> {
        self.stats
    }

    // Distinct streams keep compile sampling and query sampling decoupled
    // under a fixed seed.
    fn make_rng(&self, stream: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_os_rng(),
        }
    }
}

impl<V, F> KnnIndex<V, V, F>
where
    V: Eq + Hash + Clone,
    F: Fn(&V, &V) -> f32,
{
    /// Build from bare values, using each value as its own label.
    pub fn from_values<I>(values: I, distance: F) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
    {
        Self::from_values_with_config(values, KnnConfig::default(), distance)
    }

    /// Build from bare values with a custom config.
    pub fn from_values_with_config<I>(values: I, config: KnnConfig, distance: F) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
    {
        let items = values.into_iter().map(|v| (v.clone(), v)).collect();
        Self::with_config(items, config, distance)
    }

    /// Insert a bare value under itself as the label. Marks the index stale.
    pub fn insert_value(&mut self, value: V) {
        self.insert(value.clone(), value);
    }
}
