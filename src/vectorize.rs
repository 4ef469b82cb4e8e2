//! TF-IDF term weighting and cosine ranking.
//!
//! Every analysis stage fits its own model; nothing here is cached or shared.

use ndarray::{Array1, Array2, ArrayView1};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::AnalysisError;
use crate::stopwords::vectorizer_stopwords;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Lowercase, extract tokens of two or more word characters, drop English stop words.
pub fn analyze(text: &str) -> Vec<String> {
    let stop = vectorizer_stopwords();
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stop.contains(t))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: Option<usize>,
}

/// A fitted vocabulary with idf weights. Column `j` of every matrix is `terms[j]`.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    pub terms: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: Some(max_features),
        }
    }

    pub fn fit(&self, documents: &[String]) -> Result<TfidfModel, AnalysisError> {
        if documents.is_empty() {
            return Err(AnalysisError::EmptyCorpus);
        }
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| analyze(d)).collect();

        // corpus term frequency, ordered alphabetically
        let mut term_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &tokenized {
            for t in doc {
                *term_freq.entry(t.as_str()).or_insert(0) += 1;
            }
        }
        if term_freq.is_empty() {
            return Err(AnalysisError::EmptyVocabulary);
        }

        let mut kept: Vec<&str> = term_freq.keys().copied().collect();
        if let Some(limit) = self.max_features {
            if kept.len() > limit {
                // stable sort keeps alphabetical order among equal counts
                kept.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]));
                kept.truncate(limit);
                kept.sort_unstable();
            }
        }

        let terms: Vec<String> = kept.iter().map(|s| s.to_string()).collect();
        let vocabulary: HashMap<String, usize> =
            terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();

        let mut doc_freq = vec![0usize; terms.len()];
        for doc in &tokenized {
            let unique: HashSet<&String> = doc.iter().collect();
            for t in unique {
                if let Some(&j) = vocabulary.get(t) {
                    doc_freq[j] += 1;
                }
            }
        }
        let n = documents.len() as f64;
        let idf = Array1::from_iter(
            doc_freq.iter().map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0),
        );

        Ok(TfidfModel {
            terms,
            vocabulary,
            idf,
        })
    }

    pub fn fit_transform(&self, documents: &[String]) -> Result<(TfidfModel, Array2<f64>), AnalysisError> {
        let model = self.fit(documents)?;
        let matrix = model.transform_many(documents);
        Ok((model, matrix))
    }
}

impl TfidfModel {
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Project one document into the fitted space (L2-normalised; zero vector if nothing matches).
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut v = Array1::<f64>::zeros(self.terms.len());
        for t in analyze(text) {
            if let Some(&j) = self.vocabulary.get(&t) {
                v[j] += 1.0;
            }
        }
        v *= &self.idf;
        let norm = v.dot(&v).sqrt();
        if norm > 0.0 {
            v /= norm;
        }
        v
    }

    pub fn transform_many(&self, documents: &[String]) -> Array2<f64> {
        let mut m = Array2::<f64>::zeros((documents.len(), self.terms.len()));
        for (i, doc) in documents.iter().enumerate() {
            m.row_mut(i).assign(&self.transform(doc));
        }
        m
    }

    /// The per-document weight slice of one term.
    pub fn term_column<'m>(&self, matrix: &'m Array2<f64>, term: &str) -> Option<ArrayView1<'m, f64>> {
        self.index_of(term).map(|j| matrix.column(j))
    }
}

pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// One cosine score per matrix row.
pub fn similarity_scores(query: ArrayView1<f64>, matrix: &Array2<f64>) -> Vec<f64> {
    matrix.rows().into_iter().map(|row| cosine_similarity(query, row)).collect()
}

/// Indices of the `n` best scores, descending; exact ties keep ascending index order.
pub fn rank_top_n(scores: &[f64], n: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));
    idx.truncate(n);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn docs(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_vocabulary_excludes_stopwords_and_short_tokens() {
        let (model, m) = TfidfVectorizer::new(10_000)
            .fit_transform(&docs(&["the drum is a quiet drum", "x quiet motor"]))
            .unwrap();
        assert_eq!(model.terms, vec!["drum", "motor", "quiet"]);
        assert_eq!(m.dim(), (2, 3));
    }

    #[test]
    fn test_max_features_keeps_most_frequent_then_alphabetical() {
        let corpus = docs(&["apple apple banana", "cherry apple", "banana date"]);
        let model = TfidfVectorizer::new(2).fit(&corpus).unwrap();
        // apple=3, banana=2, cherry=1, date=1
        assert_eq!(model.terms, vec!["apple", "banana"]);

        let model = TfidfVectorizer::new(3).fit(&corpus).unwrap();
        assert_eq!(model.terms, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_rows_are_unit_length_and_idf_favours_rare_terms() {
        let (model, m) = TfidfVectorizer::new(10_000)
            .fit_transform(&docs(&["wash wash rinse", "wash spin", "wash dry"]))
            .unwrap();
        for row in m.rows() {
            assert_abs_diff_eq!(row.dot(&row).sqrt(), 1.0, epsilon = 1e-9);
        }
        let wash = model.index_of("wash").unwrap();
        let rinse = model.index_of("rinse").unwrap();
        assert!(model.idf[rinse] > model.idf[wash]);
        assert_abs_diff_eq!(model.idf[wash], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_inputs_error() {
        assert!(matches!(TfidfVectorizer::new(10).fit(&[]), Err(AnalysisError::EmptyCorpus)));
        assert!(matches!(
            TfidfVectorizer::new(10).fit(&docs(&["the and of"])),
            Err(AnalysisError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_transform_unknown_text_is_zero_vector() {
        let model = TfidfVectorizer::new(10_000).fit(&docs(&["quiet drum"])).unwrap();
        let v = model.transform("completely unrelated words");
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_cosine_similarity_basics() {
        let a = Array1::from(vec![1.0, 0.0, 1.0]);
        let b = Array1::from(vec![1.0, 0.0, 1.0]);
        let c = Array1::from(vec![0.0, 1.0, 0.0]);
        let z = Array1::from(vec![0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(cosine_similarity(a.view(), b.view()), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cosine_similarity(a.view(), c.view()), 0.0, epsilon = 1e-12);
        assert_eq!(cosine_similarity(a.view(), z.view()), 0.0);
    }

    #[test]
    fn test_rank_top_n_is_stable_on_ties() {
        let scores = vec![0.2, 0.9, 0.2, 0.9, 0.5];
        assert_eq!(rank_top_n(&scores, 3), vec![1, 3, 4]);
        assert_eq!(rank_top_n(&scores, 10), vec![1, 3, 4, 0, 2]);
    }
}
