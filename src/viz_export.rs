// Chart-ready JSON built from the persisted analysis tables.
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::Path,
};
use tracing::{debug, info, warn};

use crate::config::PipelinePaths;
use crate::pos::most_common;

const TOP_TOPIC_TERMS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct VSentiment {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VTopics {
    pub columns: Vec<String>,
    /// Most frequent terms across all topic columns.
    pub top_terms: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VSimilarityRow {
    pub target: String,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VSimilarity {
    pub words: Vec<String>,
    pub rows: Vec<VSimilarityRow>,
}

/// Everything the dashboard stage produced, handed on to the report renderer.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub sentiment: VSentiment,
    pub topics: Option<VTopics>,
    pub similarity: Option<VSimilarity>,
    pub summaries: Vec<String>,
    pub files: Vec<String>,
}

pub fn write_all_viz(paths: &PipelinePaths, out_dir: &Path) -> Result<Dashboard> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;
    let mut files = Vec::new();

    // 1) Sentiment distribution (required input)
    let sentiment = build_sentiment(&paths.sentiment_results)?;
    write_json(out_dir.join("viz.sentiment.json"), &sentiment)?;
    files.push("viz.sentiment.json".to_string());

    // 2) Top topic terms
    let topics = if paths.lsa_topics.exists() {
        let t = build_topics(&paths.lsa_topics)?;
        write_json(out_dir.join("viz.topics.json"), &t)?;
        files.push("viz.topics.json".to_string());
        Some(t)
    } else {
        warn!("Topic table missing, skipping - path={}", paths.lsa_topics.display());
        None
    };

    // 3) Similarity heatmap, only when there is something to plot
    let similarity = if paths.word_similarity.exists() {
        build_similarity(&paths.word_similarity)?
    } else {
        warn!("Similarity table missing, skipping - path={}", paths.word_similarity.display());
        None
    };
    if let Some(s) = &similarity {
        write_json(out_dir.join("viz.similarity.json"), s)?;
        files.push("viz.similarity.json".to_string());
    } else {
        info!("No similarity rows, heatmap data skipped");
    }

    let summaries = if paths.summary_reviews.exists() {
        read_column(&paths.summary_reviews, "Representative_Review")?
    } else {
        Vec::new()
    };

    // 4) Index
    let idx = json!({
        "generated_at": Utc::now().to_rfc3339(),
        "version": 1,
        "counts": {
            "reviews": sentiment.total,
            "topic_terms": topics.as_ref().map_or(0, |t| t.top_terms.len()),
            "similarity_targets": similarity.as_ref().map_or(0, |s| s.rows.len()),
            "summaries": summaries.len(),
        },
        "files": files,
    });
    write_json(out_dir.join("viz.index.json"), &idx)?;
    files.push("viz.index.json".to_string());

    debug!("Visualization files written - dir={}, files={}", out_dir.display(), files.len());
    Ok(Dashboard {
        sentiment,
        topics,
        similarity,
        summaries,
        files,
    })
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {}", path.display()))
}

fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(csv::Reader::from_reader(file))
}

/// Values of one named column; an empty file yields no values.
fn read_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h == column) else {
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        anyhow::bail!("Column {} not found in {}", column, path.display());
    };
    let mut out = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("Parsing row of {}", path.display()))?;
        if let Some(v) = row.get(idx) {
            out.push(v.to_string());
        }
    }
    Ok(out)
}

fn build_sentiment(path: &Path) -> Result<VSentiment> {
    let labels = read_column(path, "sentiment")?;
    let mut counts = BTreeMap::new();
    for l in &labels {
        *counts.entry(l.clone()).or_insert(0) += 1;
    }
    Ok(VSentiment {
        total: labels.len(),
        counts,
    })
}

fn build_topics(path: &Path) -> Result<VTopics> {
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.to_lowercase().starts_with("topic"))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut by_column: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for row in reader.records() {
        let row = row.with_context(|| format!("Parsing row of {}", path.display()))?;
        for (slot, (i, _)) in columns.iter().enumerate() {
            if let Some(v) = row.get(*i).filter(|v| !v.is_empty()) {
                by_column[slot].push(v.to_string());
            }
        }
    }
    // column by column, the way the terms are stacked for counting
    let top_terms = most_common(by_column.into_iter().flatten(), TOP_TOPIC_TERMS);
    Ok(VTopics {
        columns: columns.into_iter().map(|(_, h)| h).collect(),
        top_terms,
    })
}

#[derive(Debug, serde::Deserialize)]
struct SimilarityRecord {
    #[serde(rename = "Target")]
    target: String,
    #[serde(rename = "Similar_Word")]
    similar_word: String,
    #[serde(rename = "Cosine_Similarity")]
    cosine_similarity: f64,
}

/// Target x word pivot; None when the table has no rows.
fn build_similarity(path: &Path) -> Result<Option<VSimilarity>> {
    let mut reader = open_table(path)?;
    let mut rows: Vec<VSimilarityRow> = Vec::new();
    let mut words = std::collections::BTreeSet::new();
    for rec in reader.deserialize() {
        let rec: SimilarityRecord = rec.with_context(|| format!("Parsing row of {}", path.display()))?;
        words.insert(rec.similar_word.clone());
        match rows.iter_mut().find(|r| r.target == rec.target) {
            Some(r) => {
                r.scores.insert(rec.similar_word, rec.cosine_similarity);
            }
            None => rows.push(VSimilarityRow {
                target: rec.target,
                scores: BTreeMap::from([(rec.similar_word, rec.cosine_similarity)]),
            }),
        }
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(VSimilarity {
        words: words.into_iter().collect(),
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(dir: &Path) -> PipelinePaths {
        let paths = PipelinePaths::new(&dir.join("data"), &dir.join("results"));
        fs::create_dir_all(paths.sentiment_results.parent().unwrap()).unwrap();
        fs::write(
            &paths.sentiment_results,
            "review,vader_compound,vader_pos,vader_neg,vader_neu,textblob_polarity,sentiment\n\
             great,0.6249,0.804,0.0,0.196,0.8,Positive\n\
             bad,-0.5423,0.0,0.778,0.222,-0.7,Negative\n\
             good,0.4404,0.744,0.0,0.256,0.7,Positive\n",
        )
        .unwrap();
        paths
    }

    #[test]
    fn test_missing_sentiment_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::new(&dir.path().join("data"), &dir.path().join("results"));
        assert!(write_all_viz(&paths, &paths.results_dir).is_err());
    }

    #[test]
    fn test_sentiment_only_writes_index() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path());
        let dash = write_all_viz(&paths, &paths.results_dir).unwrap();
        assert_eq!(dash.sentiment.total, 3);
        assert_eq!(dash.sentiment.counts["Positive"], 2);
        assert!(dash.topics.is_none());
        assert!(dash.similarity.is_none());
        assert!(paths.results_dir.join("viz.index.json").exists());
        assert!(!paths.results_dir.join("viz.similarity.json").exists());
    }

    #[test]
    fn test_topics_and_similarity_pivot() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path());
        fs::write(&paths.lsa_topics, "Topic_1,Topic_2\nmachine,drum\ndrum,noise\nquiet,machine\n").unwrap();
        fs::write(
            &paths.word_similarity,
            "Target,Similar_Word,Cosine_Similarity\nprice,value,0.5\nprice,money,0.4\nbattery,backup,0.9\n",
        )
        .unwrap();

        let dash = write_all_viz(&paths, &paths.results_dir).unwrap();
        let topics = dash.topics.unwrap();
        assert_eq!(topics.columns, vec!["Topic_1", "Topic_2"]);
        assert_eq!(topics.top_terms[0], ("machine".to_string(), 2));
        assert_eq!(topics.top_terms[1], ("drum".to_string(), 2));

        let sim = dash.similarity.unwrap();
        assert_eq!(sim.words, vec!["backup", "money", "value"]);
        assert_eq!(sim.rows[0].target, "price");
        assert_eq!(sim.rows[0].scores["money"], 0.4);
        assert_eq!(sim.rows[1].target, "battery");

        let index: serde_json::Value =
            serde_json::from_slice(&fs::read(paths.results_dir.join("viz.index.json")).unwrap()).unwrap();
        assert_eq!(index["files"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_similarity_table_skips_heatmap() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path());
        fs::write(&paths.word_similarity, "").unwrap();
        let dash = write_all_viz(&paths, &paths.results_dir).unwrap();
        assert!(dash.similarity.is_none());
    }
}
