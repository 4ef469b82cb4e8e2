//! Nearest-review question answering over a TF-IDF index of the corpus.

use anyhow::{Context, Result};
use ndarray::Array2;
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::pos::{most_common, PosTagger};
use crate::vectorize::{rank_top_n, similarity_scores, TfidfModel, TfidfVectorizer};

const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "q"];
const PREVIEW_CHARS: usize = 200;

pub fn is_exit_keyword(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&lower.as_str())
}

#[derive(Debug, Clone)]
pub struct QaHit {
    pub index: usize,
    pub score: f64,
    pub review: String,
}

#[derive(Debug, Clone)]
pub struct QaAnswer {
    pub question: String,
    pub hits: Vec<QaHit>,
    pub summary: String,
}

/// Fitted once per invocation and reused for every question.
pub struct QaEngine {
    model: TfidfModel,
    matrix: Array2<f64>,
    reviews: Vec<String>,
    tagger: PosTagger,
}

impl QaEngine {
    pub fn new(reviews: Vec<String>, max_features: usize) -> Result<Self, AnalysisError> {
        let (model, matrix) = TfidfVectorizer::new(max_features).fit_transform(&reviews)?;
        info!("QA index built - reviews={}, terms={}", reviews.len(), model.n_terms());
        Ok(Self {
            model,
            matrix,
            reviews,
            tagger: PosTagger::new(),
        })
    }

    pub fn answer(&self, question: &str, top_n: usize) -> QaAnswer {
        let query = self.model.transform(question);
        let scores = similarity_scores(query.view(), &self.matrix);
        let hits: Vec<QaHit> = rank_top_n(&scores, top_n)
            .into_iter()
            .map(|i| QaHit {
                index: i,
                score: scores[i],
                review: self.reviews[i].clone(),
            })
            .collect();
        debug!("Question answered - question={:?}, hits={}", question, hits.len());

        let texts: Vec<&str> = hits.iter().map(|h| h.review.as_str()).collect();
        let summary = self.summarize_reviews(&texts, None);
        QaAnswer {
            question: question.to_string(),
            hits,
            summary,
        }
    }

    /// One-sentence template answer from the six most frequent noun/adjective tokens.
    pub fn summarize_reviews(&self, reviews: &[&str], aspect: Option<&str>) -> String {
        let words = reviews.iter().flat_map(|r| {
            self.tagger
                .tag(r)
                .into_iter()
                .filter(|(_, t)| t.starts_with("JJ") || t.starts_with("NN"))
                .map(|(w, _)| w.to_lowercase())
        });
        let common = most_common(words, 6);

        let nouns: Vec<&str> = common
            .iter()
            .map(|(w, _)| w.as_str())
            .filter(|w| self.tagger.tag_single(w).starts_with("NN"))
            .take(2)
            .collect();
        let adjs: Vec<&str> = common
            .iter()
            .map(|(w, _)| w.as_str())
            .filter(|w| self.tagger.tag_single(w).starts_with("JJ"))
            .take(2)
            .collect();

        let noun_part = if nouns.is_empty() { "the product".to_string() } else { nouns.join(", ") };
        let adj_part = if adjs.is_empty() { "good".to_string() } else { adjs.join(", ") };

        match aspect {
            Some(aspect) => format!(
                "Customers often describe the {} as {}, frequently mentioning {}.",
                aspect, adj_part, noun_part
            ),
            None => format!("Customers often mention {} and describe it as {}.", noun_part, adj_part),
        }
    }

    /// Prompt, answer, repeat. Returns the number of questions answered.
    pub fn run_loop<R: BufRead, W: Write>(&self, input: R, mut output: W, top_n: usize) -> Result<usize> {
        writeln!(output, "\nClassical QA System (TF-IDF + Similarity)")?;
        writeln!(output, "Type your question (or 'exit' to quit):\n")?;

        let mut answered = 0usize;
        let mut lines = input.lines();
        loop {
            write!(output, "Your question: ")?;
            output.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("Failed to read question")?;
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit_keyword(question) {
                writeln!(output, "Exiting QA system.")?;
                break;
            }

            let answer = self.answer(question, top_n);
            writeln!(output, "\nQuestion: {}", answer.question)?;
            writeln!(output, "\nMost Relevant Reviews:")?;
            for (rank, hit) in answer.hits.iter().enumerate() {
                let preview: String = hit.review.chars().take(PREVIEW_CHARS).collect();
                writeln!(output, "{}. {}...", rank + 1, preview)?;
            }
            writeln!(output, "Answer Summary: {}\n", answer.summary)?;
            answered += 1;
        }
        Ok(answered)
    }
}
