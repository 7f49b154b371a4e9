//! Stratified partitioning
//!
//! Both functions shuffle each class separately with a seeded `StdRng`, so
//! class proportions are preserved and results are reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{CoreError, CoreResult};

/// Row indices of one train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_indices(labels: &[u8], rng: &mut StdRng) -> [Vec<usize>; 2] {
    let mut negatives = Vec::new();
    let mut positives = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        if label == 1 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    negatives.shuffle(rng);
    positives.shuffle(rng);
    [negatives, positives]
}

/// Hold out `test_size` of each class. Every class needs at least two rows
/// so that both partitions contain it.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> CoreResult<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CoreError::InvalidConfig(format!(
            "test size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (class, indices) in class_indices(labels, &mut rng).into_iter().enumerate() {
        if indices.len() < 2 {
            return Err(CoreError::DegenerateLabels(format!(
                "class {} has {} rows, need at least 2 to stratify",
                class,
                indices.len()
            )));
        }
        let n_test = ((indices.len() as f64 * test_size).round() as usize).clamp(1, indices.len() - 1);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// `k` stratified folds; each fold's `test` is its validation part
pub fn stratified_kfold(labels: &[u8], k: usize, seed: u64) -> CoreResult<Vec<Split>> {
    if k < 2 {
        return Err(CoreError::InvalidConfig(format!("need at least 2 folds, got {}", k)));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];

    for (class, indices) in class_indices(labels, &mut rng).into_iter().enumerate() {
        if indices.len() < k {
            return Err(CoreError::DegenerateLabels(format!(
                "class {} has {} rows, fewer than {} folds",
                class,
                indices.len(),
                k
            )));
        }
        for (position, index) in indices.into_iter().enumerate() {
            folds[position % k].push(index);
        }
    }

    Ok((0..k)
        .map(|fold| {
            let mut test = folds[fold].clone();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != fold)
                .flat_map(|(_, rows)| rows.iter().copied())
                .collect();
            test.sort_unstable();
            train.sort_unstable();
            Split { train, test }
        })
        .collect())
}
