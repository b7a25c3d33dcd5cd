//! Threshold derivation for severity classes
//!
//! Turns the distribution of scores of one population into three cut points
//! (t1 <= t2 <= t3) separating four ordinal classes. Thresholds are derived
//! fresh for every population and never persisted.

use crate::config::CutMode;
use crate::core::Thresholds;
use crate::scoring::robust::{percentile_of_sorted, sorted};
use serde::{Deserialize, Serialize};

/// Number of clusters, one per severity class
pub const CLUSTER_COUNT: usize = 4;

/// Iteration cap for the 1-D k-means
pub const MAX_KMEANS_ITERATIONS: usize = 100;

/// Centers moving less than this between iterations have converged
pub const KMEANS_TOLERANCE: f64 = 1e-9;

/// Score spread below which a population is degenerate
pub const DEGENERATE_SPREAD: f64 = 1e-9;

/// How a set of thresholds was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutMethod {
    /// Empty population or no spread; every cut equals the single score
    Degenerate,
    Kmeans,
    Quantiles,
    /// Cluster mode on fewer than four distinct scores
    QuantileFallback,
}

/// Thresholds together with the method that produced them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedThresholds {
    pub thresholds: Thresholds,
    pub method: CutMethod,
}

impl DerivedThresholds {
    pub fn is_degenerate(&self) -> bool {
        self.method == CutMethod::Degenerate
    }
}

/// True for an empty population or one whose scores span less than 1e-9
pub fn is_degenerate(scores: &[f64]) -> bool {
    match (
        scores.iter().copied().reduce(f64::min),
        scores.iter().copied().reduce(f64::max),
    ) {
        (Some(lo), Some(hi)) => (hi - lo).abs() < DEGENERATE_SPREAD,
        _ => true,
    }
}

/// Derive thresholds for one population, rounded to `digits`.
///
/// Empty input yields zero thresholds. A degenerate population collapses
/// all three cuts onto its single score. In cluster mode, fewer than four
/// distinct scores fall back to the given quantiles.
pub fn derive_thresholds(
    scores: &[f64],
    cut_mode: CutMode,
    quantiles: [f64; 3],
    digits: i32,
) -> DerivedThresholds {
    if scores.is_empty() {
        return DerivedThresholds {
            thresholds: Thresholds::zero(),
            method: CutMethod::Degenerate,
        };
    }

    let xs = sorted(scores);
    let (thresholds, method) = if is_degenerate(&xs) {
        (Thresholds::collapsed(xs[0]), CutMethod::Degenerate)
    } else {
        match cut_mode {
            CutMode::Quantiles => (quantile_thresholds(&xs, quantiles), CutMethod::Quantiles),
            CutMode::Kmeans => match kmeans_thresholds(&xs) {
                Some(t) => (t, CutMethod::Kmeans),
                None => (
                    quantile_thresholds(&xs, quantiles),
                    CutMethod::QuantileFallback,
                ),
            },
        }
    };

    DerivedThresholds {
        thresholds: thresholds.rounded(digits),
        method,
    }
}

/// Empirical percentiles of sorted scores at three quantiles
pub fn quantile_thresholds(sorted_scores: &[f64], quantiles: [f64; 3]) -> Thresholds {
    let [q1, q2, q3] = quantiles;
    Thresholds::new(
        percentile_of_sorted(sorted_scores, q1),
        percentile_of_sorted(sorted_scores, q2),
        percentile_of_sorted(sorted_scores, q3),
    )
}

/// Midpoints between the four sorted k-means centers.
///
/// `None` when the scores hold fewer than four distinct values.
pub fn kmeans_thresholds(sorted_scores: &[f64]) -> Option<Thresholds> {
    if distinct_count(sorted_scores) < CLUSTER_COUNT {
        return None;
    }
    let mut centers = kmeans_1d(sorted_scores, CLUSTER_COUNT, MAX_KMEANS_ITERATIONS);
    centers.sort_by(f64::total_cmp);
    Some(Thresholds::new(
        0.5 * (centers[0] + centers[1]),
        0.5 * (centers[1] + centers[2]),
        0.5 * (centers[2] + centers[3]),
    ))
}

fn distinct_count(sorted_scores: &[f64]) -> usize {
    if sorted_scores.is_empty() {
        return 0;
    }
    1 + sorted_scores.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Lloyd's iteration over sorted 1-D data.
///
/// Centers start at the order statistics `xs[floor((i + 1) * n / (k + 1))]`,
/// so the result is a deterministic function of the input. A point
/// equidistant from two centers joins the lower-indexed one; an empty
/// cluster keeps its previous center.
pub fn kmeans_1d(sorted_scores: &[f64], k: usize, max_iter: usize) -> Vec<f64> {
    let n = sorted_scores.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let mut centers: Vec<f64> = (0..k)
        .map(|i| sorted_scores[((i + 1) * n / (k + 1)).min(n - 1)])
        .collect();

    for _ in 0..max_iter {
        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for &x in sorted_scores {
            let j = nearest_center(&centers, x);
            sums[j] += x;
            counts[j] += 1;
        }

        let next: Vec<f64> = centers
            .iter()
            .enumerate()
            .map(|(j, &old)| {
                if counts[j] > 0 {
                    sums[j] / counts[j] as f64
                } else {
                    old
                }
            })
            .collect();

        let converged = next
            .iter()
            .zip(&centers)
            .all(|(a, b)| (a - b).abs() < KMEANS_TOLERANCE);
        centers = next;
        if converged {
            break;
        }
    }
    centers
}

fn nearest_center(centers: &[f64], x: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (j, center) in centers.iter().enumerate() {
        let distance = (x - center).abs();
        if distance < best_distance {
            best = j;
            best_distance = distance;
        }
    }
    best
}
