use ndarray::Array2;
use tracing::debug;

use crate::models::WordSimilarityRow;
use crate::vectorize::{cosine_similarity, TfidfModel};

/// Term-to-term similarity over the document weight columns of one fitted model.
pub struct WordSpace<'a> {
    model: &'a TfidfModel,
    matrix: &'a Array2<f64>,
}

impl<'a> WordSpace<'a> {
    pub fn new(model: &'a TfidfModel, matrix: &'a Array2<f64>) -> Self {
        Self { model, matrix }
    }

    /// The `top_n` terms closest to `target`, best first. The target itself never appears.
    /// Unknown targets yield an empty list.
    pub fn find_similar_words(&self, target: &str, top_n: usize) -> Vec<(String, f64)> {
        let (Some(target_idx), Some(target_vec)) =
            (self.model.index_of(target), self.model.term_column(self.matrix, target))
        else {
            debug!("Target not in vocabulary - target={}", target);
            return Vec::new();
        };

        let mut scored: Vec<(usize, f64)> = (0..self.model.n_terms())
            .filter(|&j| j != target_idx)
            .map(|j| (j, cosine_similarity(target_vec, self.matrix.column(j))))
            .collect();
        // stable: equal scores stay in vocabulary order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|(j, s)| (self.model.terms[j].clone(), s))
            .collect()
    }

    /// Output rows for every target found in the vocabulary, scores rounded to 4 places.
    pub fn similarity_table(&self, targets: &[String], top_n: usize) -> (Vec<WordSimilarityRow>, Vec<String>) {
        let mut rows = Vec::new();
        let mut missing = Vec::new();
        for target in targets {
            let similar = self.find_similar_words(target, top_n);
            if similar.is_empty() {
                missing.push(target.clone());
                continue;
            }
            for (word, score) in similar {
                rows.push(WordSimilarityRow {
                    target: target.clone(),
                    similar_word: word,
                    cosine_similarity: round4(score),
                });
            }
        }
        (rows, missing)
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::TfidfVectorizer;

    fn corpus() -> Vec<String> {
        [
            "battery life good battery backup",
            "camera quality good camera",
            "battery drains fast",
            "screen bright camera sharp",
            "price reasonable battery",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_target_never_in_its_own_ranking() {
        let (model, m) = TfidfVectorizer::new(3000).fit_transform(&corpus()).unwrap();
        let space = WordSpace::new(&model, &m);
        for term in &model.terms {
            let similar = space.find_similar_words(term, model.n_terms());
            assert!(similar.iter().all(|(w, _)| w != term));
            assert_eq!(similar.len(), model.n_terms() - 1);
        }
    }

    #[test]
    fn test_scores_descending_and_cooccurring_term_ranks_high() {
        let (model, m) = TfidfVectorizer::new(3000).fit_transform(&corpus()).unwrap();
        let space = WordSpace::new(&model, &m);
        let similar = space.find_similar_words("camera", 5);
        assert_eq!(similar.len(), 5);
        assert!(similar.windows(2).all(|w| w[0].1 >= w[1].1));
        let top_words: Vec<&str> = similar.iter().take(3).map(|(w, _)| w.as_str()).collect();
        assert!(top_words.contains(&"quality") || top_words.contains(&"bright"));
    }

    #[test]
    fn test_table_scores_rounded_to_four_places() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.0), 0.0);

        let (model, m) = TfidfVectorizer::new(3000).fit_transform(&corpus()).unwrap();
        let space = WordSpace::new(&model, &m);
        let raw = space.find_similar_words("battery", 3);
        let (rows, _) = space.similarity_table(&["battery".to_string()], 3);
        assert_eq!(rows.len(), raw.len());
        for (row, (word, score)) in rows.iter().zip(&raw) {
            assert_eq!(&row.similar_word, word);
            assert_eq!(row.cosine_similarity, (score * 10_000.0).round() / 10_000.0);
            assert!((row.cosine_similarity - score).abs() <= 0.00005 + 1e-12);
        }
    }

    #[test]
    fn test_unknown_target_reported_missing() {
        let (model, m) = TfidfVectorizer::new(3000).fit_transform(&corpus()).unwrap();
        let space = WordSpace::new(&model, &m);
        let (rows, missing) =
            space.similarity_table(&["battery".to_string(), "warranty".to_string()], 2);
        assert_eq!(missing, vec!["warranty".to_string()]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.target == "battery" && r.similar_word != "battery"));
    }
}
