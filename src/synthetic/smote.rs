//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{ChurnError, Result};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Ordered float for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    // ties broken by index so neighbour sets do not depend on heap internals
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// SMOTE oversampler balancing every class to the majority count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    /// Number of nearest same-class neighbours to interpolate towards
    k_neighbors: usize,
    seed: u64,
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            target_counts: None,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// k nearest neighbours of `rows[pos]` among `rows`, excluding itself.
    ///
    /// Returned as positions into `rows`, nearest first.
    fn find_neighbors(x: &Array2<f64>, rows: &[usize], pos: usize, k: usize) -> Vec<usize> {
        let point = x.row(rows[pos]);
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (j, &row) in rows.iter().enumerate() {
            if j == pos {
                continue;
            }
            let candidate = DistIdx(Self::squared_distance(point, x.row(row)), j);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(&worst) = heap.peek() {
                if candidate < worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec().into_iter().map(|DistIdx(_, j)| j).collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);

        if counts.len() < 2 {
            return Err(ChurnError::ResamplingError(format!(
                "SMOTE needs at least 2 classes, found {}",
                counts.len()
            )));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);

        for (&class, &count) in &counts {
            if count < max_count && count <= self.k_neighbors {
                return Err(ChurnError::ResamplingError(format!(
                    "class {} has {} samples, SMOTE needs more than k_neighbors = {}",
                    class, count, self.k_neighbors
                )));
            }
        }

        self.target_counts = Some(counts.keys().map(|&class| (class, max_count)).collect());
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or_else(|| ChurnError::ResamplingError("SMOTE not fitted".to_string()))?;

        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let n_features = x.ncols();

        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = Vec::with_capacity(targets.len());

        for (&class, &target_count) in targets {
            let rows = match indices.get(&class) {
                Some(rows) => rows,
                None => {
                    return Err(ChurnError::ResamplingError(format!(
                        "class {} not present in resample input",
                        class
                    )))
                }
            };
            let n_to_generate = target_count.saturating_sub(rows.len());
            n_synthetic.push((class, n_to_generate));
            if n_to_generate == 0 {
                continue;
            }
            if rows.len() <= self.k_neighbors {
                return Err(ChurnError::ResamplingError(format!(
                    "class {} has {} samples, SMOTE needs more than k_neighbors = {}",
                    class,
                    rows.len(),
                    self.k_neighbors
                )));
            }

            let neighbors: Vec<Vec<usize>> = (0..rows.len())
                .map(|pos| Self::find_neighbors(x, rows, pos, self.k_neighbors))
                .collect();

            for _ in 0..n_to_generate {
                let pos = rng.gen_range(0..rows.len());
                let neighbor_pos = neighbors[pos][rng.gen_range(0..neighbors[pos].len())];
                let gap: f64 = rng.gen();

                let sample = x.row(rows[pos]);
                let neighbor = x.row(rows[neighbor_pos]);
                synthetic_x.extend(
                    sample
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&s, &n)| s + gap * (n - s)),
                );
                synthetic_y.push(class);
            }
        }

        let n_original = x.nrows();
        let n_total = n_original + synthetic_y.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[(i - n_original) * n_features + j]
            }
        });

        let mut all_y: Vec<i64> = y.iter().copied().collect();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}
