//! Seeded k-means over RGB points.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Clustering parameters.
#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    /// Number of clusters. Reduced to the point count if larger.
    pub k: usize,
    /// Iteration cap. At least one assignment pass always runs.
    pub max_iterations: usize,
    /// Stop once no centroid moves farther than this (RGB units).
    pub tolerance: f64,
    /// Seed for picking the initial centroids.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 20,
            tolerance: 1e-3,
            seed: 42,
        }
    }
}

/// One cluster after the final assignment pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Mean of the assigned points (initial seed if none were assigned).
    pub centroid: [f64; 3],
    /// Number of points assigned in the final pass.
    pub count: usize,
}

/// Output of [`kmeans`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub clusters: Vec<Cluster>,
    /// Assignment passes executed.
    pub iterations: usize,
}

impl KMeansResult {
    /// The cluster with the most points. Ties go to the lowest index.
    pub fn dominant(&self) -> Option<&Cluster> {
        self.clusters
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.count.cmp(&b.count).then(ib.cmp(ia)))
            .map(|(_, c)| c)
    }

    /// Sum of per-cluster counts; equals the number of input points.
    pub fn total_count(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }
}

/// Partition `points` into at most `params.k` clusters.
///
/// Initial centroids are drawn without replacement from `points` using a
/// generator seeded with `params.seed`. A centroid that receives no points
/// in a pass keeps its previous position.
pub fn kmeans(points: &[[f64; 3]], params: &KMeansParams) -> KMeansResult {
    let k = params.k.min(points.len());
    if k == 0 {
        return KMeansResult {
            clusters: vec![],
            iterations: 0,
        };
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids: Vec<[f64; 3]> = rand::seq::index::sample(&mut rng, points.len(), k)
        .iter()
        .map(|i| points[i])
        .collect();

    let max_iterations = params.max_iterations.max(1);
    let mut counts = vec![0usize; k];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut sums = vec![[0.0_f64; 3]; k];
        counts.iter_mut().for_each(|c| *c = 0);
        for point in points {
            let c = nearest(point, &centroids);
            sums[c][0] += point[0];
            sums[c][1] += point[1];
            sums[c][2] += point[2];
            counts[c] += 1;
        }

        let mut max_shift = 0.0_f64;
        for j in 0..k {
            if counts[j] == 0 {
                continue;
            }
            let n = counts[j] as f64;
            let updated = [sums[j][0] / n, sums[j][1] / n, sums[j][2] / n];
            max_shift = max_shift.max(distance_sq(&updated, &centroids[j]).sqrt());
            centroids[j] = updated;
        }

        if max_shift < params.tolerance {
            break;
        }
    }

    KMeansResult {
        clusters: centroids
            .into_iter()
            .zip(counts)
            .map(|(centroid, count)| Cluster { centroid, count })
            .collect(),
        iterations,
    }
}

/// Index of the closest centroid. Ties go to the lowest index.
fn nearest(point: &[f64; 3], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (j, centroid) in centroids.iter().enumerate() {
        let dist = distance_sq(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    best
}

fn distance_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}
