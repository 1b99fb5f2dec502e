//! K-means clustering over embedding vectors.
//!
//! Lloyd's algorithm with k-means++ seeding. The RNG is seeded from the
//! configuration, so identical inputs always produce identical labels.

use crate::{common_dimension, VectorError, VectorResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Stop once the summed squared centroid movement falls below this.
    pub tolerance: f64,
    pub seed: u64,
}

impl KMeansConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// `k = max(2, round(sqrt(n)))`
pub fn default_cluster_count(n: usize) -> usize {
    ((n as f64).sqrt().round() as usize).max(2)
}

#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster index per input vector.
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
}

impl Clustering {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

pub fn kmeans(vectors: &[Vec<f32>], config: &KMeansConfig) -> VectorResult<Clustering> {
    if config.k == 0 {
        return Err(VectorError::Clustering("k must be positive".to_string()));
    }
    if vectors.len() < config.k {
        return Err(VectorError::Clustering(format!(
            "{} vectors cannot form {} clusters",
            vectors.len(),
            config.k
        )));
    }
    let dim = common_dimension(vectors)?;

    let points: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| v.iter().map(|&x| x as f64).collect())
        .collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut centroids = seed_centroids(&points, config.k, &mut rng);
    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0;

    for iteration in 0..config.max_iterations.max(1) {
        iterations = iteration + 1;

        for (i, p) in points.iter().enumerate() {
            labels[i] = nearest(p, &centroids).0;
        }

        let mut sums = vec![vec![0.0f64; dim]; config.k];
        let mut counts = vec![0usize; config.k];
        for (p, &label) in points.iter().zip(labels.iter()) {
            counts[label] += 1;
            for (s, x) in sums[label].iter_mut().zip(p.iter()) {
                *s += x;
            }
        }

        let mut shift = 0.0f64;
        for c in 0..config.k {
            // an empty cluster keeps its previous centroid
            if counts[c] == 0 {
                continue;
            }
            let updated: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            shift += squared_distance(&updated, &centroids[c]);
            centroids[c] = updated;
        }

        if shift <= config.tolerance {
            break;
        }
    }

    // final assignment against the converged centroids
    for (i, p) in points.iter().enumerate() {
        labels[i] = nearest(p, &centroids).0;
    }

    debug!(
        "k-means: n={} k={} iterations={}",
        points.len(),
        config.k,
        iterations
    );

    Ok(Clustering {
        labels,
        centroids,
        iterations,
    })
}

fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();

        let pick = if total <= 0.0 {
            rng.random_range(0..points.len())
        } else {
            let mut draw = rng.random::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if draw < *w {
                    chosen = i;
                    break;
                }
                draw -= w;
            }
            chosen
        };
        centroids.push(points[pick].clone());
    }

    centroids
}

/// Index of the closest centroid (lowest index on ties) and its squared distance.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    #[test]
    fn test_default_cluster_count() {
        assert_eq!(default_cluster_count(1), 2);
        assert_eq!(default_cluster_count(2), 2);
        assert_eq!(default_cluster_count(4), 2);
        assert_eq!(default_cluster_count(9), 3);
        assert_eq!(default_cluster_count(20), 4);
    }

    #[test]
    fn test_separates_obvious_blobs() {
        let clustering = kmeans(&blobs(), &KMeansConfig::new(2)).unwrap();
        let l = &clustering.labels;
        assert_eq!(l[0], l[1]);
        assert_eq!(l[1], l[2]);
        assert_eq!(l[3], l[4]);
        assert_eq!(l[4], l[5]);
        assert_ne!(l[0], l[3]);
        assert_eq!(clustering.members(l[0]), vec![0, 1, 2]);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let a = kmeans(&blobs(), &KMeansConfig::new(3).with_seed(7)).unwrap();
        let b = kmeans(&blobs(), &KMeansConfig::new(3).with_seed(7)).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_too_few_points_is_an_error() {
        let err = kmeans(&[vec![1.0, 2.0]], &KMeansConfig::new(2)).unwrap_err();
        assert!(matches!(err, VectorError::Clustering(_)));
    }

    #[test]
    fn test_identical_points_do_not_panic() {
        let points = vec![vec![1.0, 1.0]; 4];
        let clustering = kmeans(&points, &KMeansConfig::new(2)).unwrap();
        assert_eq!(clustering.labels.len(), 4);
    }
}
