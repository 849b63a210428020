//! Invariant checks on compiled indexes.
//!
//! Every compiled table must satisfy these regardless of corpus or seed:
//! no self-edges, exactly min(k, N-1) neighbors per row, ascending
//! distances, distances that match the injected function, distinct labels,
//! and strict dirty gating around mutations.

use std::collections::{HashMap, HashSet};

use proxima::{GraphError, KnnConfig, KnnIndex};

fn abs_distance(a: &f32, b: &f32) -> f32 {
    (a - b).abs()
}

fn line_index(n: u32, k: usize, seed: u64) -> KnnIndex<u32, f32, fn(&f32, &f32) -> f32> {
    let items: HashMap<u32, f32> = (1..=n).map(|i| (i, i as f32)).collect();
    let config = KnnConfig::default().with_k(k).with_seed(seed);
    KnnIndex::with_config(items, config, abs_distance as fn(&f32, &f32) -> f32).expect("index should build")
}

#[test]
fn no_item_is_its_own_neighbor() {
    let index = line_index(200, 8, 41);
    for label in 1..=200u32 {
        let row = index.k_nearest(&label, 8).unwrap();
        assert!(row.iter().all(|n| n.label != label), "self-edge at {label}");
    }
}

#[test]
fn every_row_holds_exactly_k_entries() {
    let index = line_index(200, 8, 42);
    for label in 1..=200u32 {
        assert_eq!(index.k_nearest(&label, 8).unwrap().len(), 8);
    }
}

#[test]
fn rows_are_sorted_ascending() {
    let index = line_index(200, 8, 43);
    for label in 1..=200u32 {
        let row = index.k_nearest(&label, 8).unwrap();
        for pair in row.windows(2) {
            assert!(
                pair[0].distance <= pair[1].distance,
                "row of {label} is out of order"
            );
        }
    }
}

#[test]
fn stored_distances_match_the_distance_function() {
    let index = line_index(200, 8, 44);
    for label in 1..=200u32 {
        for neighbor in index.k_nearest(&label, 8).unwrap() {
            let expected = (label as f32 - neighbor.label as f32).abs();
            assert_eq!(neighbor.distance, expected);
        }
    }
}

#[test]
fn rows_hold_no_duplicate_labels() {
    let index = line_index(200, 8, 45);
    for label in 1..=200u32 {
        let row = index.k_nearest(&label, 8).unwrap();
        let unique: HashSet<u32> = row.iter().map(|n| n.label).collect();
        assert_eq!(unique.len(), row.len(), "duplicate neighbor in row of {label}");
    }
}

#[test]
fn queries_are_rejected_between_insert_and_compile() {
    let mut index = line_index(100, 5, 46);
    assert!(index.k_nearest(&50, 5).is_ok());

    index.insert(101, 101.0);
    assert_eq!(index.k_nearest(&50, 5).unwrap_err(), GraphError::NotCompiled);
    assert_eq!(index.error_ratio(10).unwrap_err(), GraphError::NotCompiled);

    index.compile().unwrap();
    assert!(index.k_nearest(&50, 5).is_ok());
    assert!(index.error_ratio(10).is_ok());
}

#[test]
fn recompile_keeps_every_label_and_never_regresses_rows() {
    let mut index = line_index(150, 6, 47);
    let before: HashMap<u32, Vec<f32>> = (1..=150u32)
        .map(|label| {
            let distances = index
                .k_nearest(&label, 6)
                .unwrap()
                .iter()
                .map(|n| n.distance)
                .collect();
            (label, distances)
        })
        .collect();

    index.compile().unwrap();

    for (label, old_distances) in before {
        let new_row = index.k_nearest(&label, 6).unwrap();
        assert_eq!(new_row.len(), old_distances.len(), "label {label} lost entries");
        // Warm seeding carries the prior row into the working heap, so no
        // rank can get worse.
        for (new, old) in new_row.iter().zip(&old_distances) {
            assert!(new.distance <= *old, "rank regressed for {label}");
        }
    }
}

#[test]
fn inserted_items_gain_rows_after_recompile() {
    let mut index = line_index(100, 5, 48);
    for i in 101..=120u32 {
        index.insert(i, i as f32);
    }
    index.compile().unwrap();

    for i in 101..=120u32 {
        let row = index.k_nearest(&i, 5).unwrap();
        assert_eq!(row.len(), 5);
        assert!(row.iter().all(|n| n.label != i));
    }
}

#[test]
fn overwritten_values_cannot_leave_stale_distances() {
    let mut index = line_index(50, 5, 50);
    index.insert(25, 99999.0);
    index.compile().unwrap();

    // Every row must score its neighbors against the store as it is now,
    // including rows that listed 25 before it moved.
    for label in (1..=50u32).filter(|l| *l != 25) {
        for neighbor in index.k_nearest(&label, 5).unwrap() {
            let neighbor_value = if neighbor.label == 25 { 99999.0 } else { neighbor.label as f32 };
            assert_eq!(
                neighbor.distance,
                (label as f32 - neighbor_value).abs(),
                "stale distance for {label} -> {}",
                neighbor.label
            );
        }
    }
    for neighbor in index.k_nearest(&25, 5).unwrap() {
        assert_eq!(neighbor.distance, (99999.0 - neighbor.label as f32).abs());
    }
}

#[test]
fn error_ratio_is_never_below_one() {
    // Exact rows are rank-wise optimal, so every per-rank ratio is >= 1.
    let index = line_index(120, 6, 49);
    let ratio = index.error_ratio(40).unwrap();
    assert!(ratio >= 1.0 - 1e-5, "got {ratio}");
}
