use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array2, Axis};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::models::ClusterAssignment;
use crate::vectorize::cosine_similarity;

const TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub n_clusters: usize,
    pub seed: u64,
    pub n_runs: usize,
    pub max_iterations: u64,
}

/// Partition the document rows with seeded k-means and pick, for each partition,
/// the member closest (cosine) to its centroid.
pub fn cluster_reviews(matrix: &Array2<f64>, params: &ClusterParams) -> Result<ClusterAssignment, AnalysisError> {
    if params.n_clusters == 0 {
        return Err(AnalysisError::InvalidClusterCount);
    }
    let n_docs = matrix.nrows();
    if n_docs == 0 {
        return Err(AnalysisError::EmptyCorpus);
    }
    let k = params.n_clusters.min(n_docs);
    if k < params.n_clusters {
        warn!("Clamping cluster count - requested={}, documents={}", params.n_clusters, n_docs);
    }
    debug!(
        "Clustering started - documents={}, k={}, seed={}, runs={}",
        n_docs, k, params.seed, params.n_runs
    );

    let dataset = DatasetBase::from(matrix.clone());
    let rng = Xoshiro256Plus::seed_from_u64(params.seed);
    let model = KMeans::params_with_rng(k, rng)
        .n_runs(params.n_runs.max(1))
        .max_n_iterations(params.max_iterations)
        .tolerance(TOLERANCE)
        .fit(&dataset)
        .map_err(|e| AnalysisError::Clustering(format!("K-Means fit failed: {:?}", e)))?;

    let predictions = model.predict(&dataset);
    let labels: Vec<usize> = predictions.as_targets().iter().copied().collect();
    let centroids = model.centroids();

    let representatives = (0..k)
        .map(|p| {
            let centroid = centroids.index_axis(Axis(0), p);
            let mut best: Option<(usize, f64)> = None;
            for (i, _) in labels.iter().enumerate().filter(|(_, &l)| l == p) {
                let score = cosine_similarity(matrix.row(i), centroid);
                // strict comparison keeps the first index on ties
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((i, score));
                }
            }
            if best.is_none() {
                warn!("Empty partition - index={}", p);
            }
            best.map(|(i, _)| i)
        })
        .collect();

    let assignment = ClusterAssignment {
        labels,
        representatives,
    };
    info!(
        "Clustering complete - documents={}, partitions={}",
        n_docs,
        assignment.n_partitions()
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::TfidfVectorizer;
    use ndarray::array;

    fn params(k: usize) -> ClusterParams {
        ClusterParams {
            n_clusters: k,
            seed: 42,
            n_runs: 10,
            max_iterations: 300,
        }
    }

    #[test]
    fn test_separable_groups_get_one_representative_each() {
        let m = array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.1, 0.9],
        ];
        let a = cluster_reviews(&m, &params(3)).unwrap();
        assert_eq!(a.labels.len(), 6);
        assert_eq!(a.n_partitions(), 3);
        assert_eq!(a.labels[0], a.labels[1]);
        assert_eq!(a.labels[2], a.labels[3]);
        assert_eq!(a.labels[4], a.labels[5]);
        assert_ne!(a.labels[0], a.labels[2]);
        assert_ne!(a.labels[2], a.labels[4]);

        for p in 0..3 {
            let rep = a.representatives[p].unwrap();
            assert_eq!(a.labels[rep], p);
            assert!(a.members(p).contains(&rep));
        }
    }

    #[test]
    fn test_every_review_labelled_once_and_k_clamped() {
        let corpus: Vec<String> = ["quiet drum", "noisy drum", "late delivery"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (_, m) = TfidfVectorizer::new(2000).fit_transform(&corpus).unwrap();
        let a = cluster_reviews(&m, &params(5)).unwrap();
        assert_eq!(a.labels.len(), 3);
        assert_eq!(a.n_partitions(), 3);
        assert!(a.labels.iter().all(|&l| l < 3));
        let total: usize = (0..3).map(|p| a.members(p).len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_representative_tie_goes_to_lowest_index() {
        let m = array![[0.0, 1.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let a = cluster_reviews(&m, &params(2)).unwrap();
        assert_eq!(a.labels[0], a.labels[3]);
        assert_eq!(a.labels[1], a.labels[2]);
        for p in 0..2 {
            let members = a.members(p);
            assert_eq!(a.representatives[p], members.iter().copied().min());
        }
        let mut reps: Vec<usize> = a.representatives.iter().flatten().copied().collect();
        reps.sort_unstable();
        assert_eq!(reps, vec![0, 1]);
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let m = array![[1.0, 0.0]];
        assert!(matches!(cluster_reviews(&m, &params(0)), Err(AnalysisError::InvalidClusterCount)));
    }
}
