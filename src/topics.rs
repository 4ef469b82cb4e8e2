//! Latent semantic analysis over a TF-IDF matrix.
//!
//! Truncated SVD by power iteration with deflation. The start vector is fixed,
//! so the same matrix always yields the same components.

use itertools::Itertools;
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::models::Topic;
use crate::vectorize::TfidfModel;

const MAX_ITER: usize = 200;
const EPS: f64 = 1e-10;
const TOL: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    /// Right singular vectors, one row per component (components x terms).
    pub components: Array2<f64>,
    pub singular_values: Array1<f64>,
}

impl TruncatedSvd {
    pub fn fit(matrix: &Array2<f64>, n_components: usize) -> Result<Self, AnalysisError> {
        if n_components == 0 {
            return Err(AnalysisError::InvalidComponentCount);
        }
        let (m, n) = matrix.dim();
        if m == 0 || n == 0 {
            return Err(AnalysisError::EmptyCorpus);
        }
        let k = n_components.min(m).min(n);
        if k < n_components {
            warn!("Clamping components - requested={}, usable={}", n_components, k);
        }

        let mut work = matrix.to_owned();
        let mut components = Array2::<f64>::zeros((k, n));
        let mut singular_values = Array1::<f64>::zeros(k);

        for c in 0..k {
            let (sigma, u, v) = power_iteration(&work);
            singular_values[c] = sigma;
            components.row_mut(c).assign(&v);

            // deflate: work -= sigma * u v^T
            let u_col = u.insert_axis(Axis(1));
            let v_row = v.insert_axis(Axis(0));
            work -= &(u_col.dot(&v_row) * sigma);
            debug!("SVD component extracted - index={}, sigma={:.4}", c, sigma);
        }

        Ok(Self {
            components,
            singular_values,
        })
    }
}

fn power_iteration(a: &Array2<f64>) -> (f64, Array1<f64>, Array1<f64>) {
    let n = a.ncols();
    let mut v = Array1::from_iter((0..n).map(|i| ((i + 1) as f64).sin()));
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v /= norm;
    }

    let mut sigma = 0.0;
    let mut u = Array1::<f64>::zeros(a.nrows());
    for _ in 0..MAX_ITER {
        let mut next_u = a.dot(&v);
        let norm_u = next_u.dot(&next_u).sqrt();
        if norm_u < EPS {
            break;
        }
        next_u /= norm_u;

        let mut next_v = a.t().dot(&next_u);
        let next_sigma = next_v.dot(&next_v).sqrt();
        if next_sigma < EPS {
            u = next_u;
            sigma = 0.0;
            break;
        }
        next_v /= next_sigma;

        let converged = (next_sigma - sigma).abs() < TOL * next_sigma.max(1.0);
        u = next_u;
        v = next_v;
        sigma = next_sigma;
        if converged {
            break;
        }
    }
    (sigma, u, v)
}

/// Top `top_terms` terms of every component by absolute loading, descending.
/// Equal loadings keep ascending term index.
pub fn extract_topics(
    model: &TfidfModel,
    matrix: &Array2<f64>,
    n_topics: usize,
    top_terms: usize,
) -> Result<Vec<Topic>, AnalysisError> {
    let svd = TruncatedSvd::fit(matrix, n_topics)?;
    let topics = svd
        .components
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, comp)| {
            let terms = comp
                .iter()
                .enumerate()
                .sorted_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(std::cmp::Ordering::Equal))
                .take(top_terms)
                .map(|(j, _)| model.terms[j].clone())
                .collect();
            Topic {
                index: i,
                terms,
                singular_value: svd.singular_values[i],
            }
        })
        .collect();
    Ok(topics)
}

/// Column-per-topic table: header `Topic_1..Topic_k`, row r holds each topic's r-th term.
pub fn topic_table(topics: &[Topic]) -> (Vec<String>, Vec<Vec<String>>) {
    let header = topics.iter().map(|t| format!("Topic_{}", t.index + 1)).collect();
    let depth = topics.iter().map(|t| t.terms.len()).max().unwrap_or(0);
    let rows = (0..depth)
        .map(|r| {
            topics
                .iter()
                .map(|t| t.terms.get(r).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    (header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::TfidfVectorizer;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_singular_values_of_diagonal_matrix() {
        let m = array![[3.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        let svd = TruncatedSvd::fit(&m, 2).unwrap();
        assert_abs_diff_eq!(svd.singular_values[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(svd.singular_values[1], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(svd.components[[0, 0]].abs(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(svd.components[[1, 1]].abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equal_loadings_keep_term_order() {
        let corpus = vec!["gamma alpha beta".to_string()];
        let (model, m) = TfidfVectorizer::new(2000).fit_transform(&corpus).unwrap();
        assert_eq!(model.terms, vec!["alpha", "beta", "gamma"]);
        let topics = extract_topics(&model, &m, 1, 10).unwrap();
        assert_eq!(topics[0].terms, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_zero_components_rejected() {
        let m = array![[1.0, 0.0]];
        assert!(matches!(TruncatedSvd::fit(&m, 0), Err(AnalysisError::InvalidComponentCount)));
    }

    #[test]
    fn test_topics_have_bounded_term_lists() {
        let corpus: Vec<String> = [
            "drum noisy spin vibration",
            "drum noisy loud spin",
            "delivery late installation delayed",
            "installation technician delivery",
            "price value money worth",
            "value money price",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (model, m) = TfidfVectorizer::new(2000).fit_transform(&corpus).unwrap();
        let topics = extract_topics(&model, &m, 5, 10).unwrap();
        assert_eq!(topics.len(), 5);
        for t in &topics {
            assert!(t.terms.len() <= 10);
            assert!(t.terms.iter().all_unique());
        }
        assert!(topics[0].singular_value >= topics[1].singular_value - 1e-9);

        let (header, rows) = topic_table(&topics);
        assert_eq!(header[0], "Topic_1");
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].len(), 5);
    }

    #[test]
    fn test_components_clamped_to_matrix_rank_bound() {
        let m = array![[1.0, 0.5, 0.0], [0.0, 0.5, 1.0]];
        let svd = TruncatedSvd::fit(&m, 5).unwrap();
        assert_eq!(svd.components.nrows(), 2);
    }
}
