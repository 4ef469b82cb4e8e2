use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level pipeline settings. Every field defaults, so an empty YAML file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub translate: TranslateConfig,
    pub clean: CleanConfig,
    pub vectorize: VectorizeConfig,
    pub topics: TopicsConfig,
    pub similarity: SimilarityConfig,
    pub cluster: ClusterConfig,
    pub qa: QaConfig,
    pub ner: NerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub product_url: Option<String>,
    pub target_count: usize,
    pub page_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            product_url: None,
            target_count: 500,
            page_delay_ms: 2500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// LibreTranslate-compatible endpoint, e.g. "http://localhost:5000/translate".
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub target: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            target: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Route rows whose translation failed to a separate file instead of the corpus.
    pub isolate_untranslated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeConfig {
    pub similarity_max_features: usize,
    pub qa_max_features: usize,
    pub topics_max_features: usize,
    pub cluster_max_features: usize,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            similarity_max_features: 3000,
            qa_max_features: 3000,
            topics_max_features: 2000,
            cluster_max_features: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub n_topics: usize,
    pub top_terms: usize,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self { n_topics: 5, top_terms: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub target_words: Vec<String>,
    pub top_n: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            target_words: ["camera", "battery", "screen", "performance", "price"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub n_clusters: usize,
    pub seed: u64,
    pub n_runs: usize,
    pub max_iterations: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            seed: 42,
            n_runs: 10,
            max_iterations: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub top_n: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    pub sample: usize,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self { sample: 200 }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Resolve the config file: explicit path > REVIEW_PULSE_CONFIG > <data_dir>/config.yaml > defaults.
    pub fn resolve(explicit: Option<&str>, data_dir: &Path) -> Result<Self> {
        if let Some(p) = explicit {
            let path = PathBuf::from(p);
            if !path.exists() {
                anyhow::bail!(
                    "config not found at {}\n\
                     Drop --config to use built-in defaults, or point it at a YAML file like:\n\
                     cluster:\n  n_clusters: 5\ntranslate:\n  endpoint: \"http://localhost:5000/translate\"\n",
                    path.display()
                );
            }
            debug!("Using config file from --config argument: {}", path.display());
            return Self::load(&path);
        }
        if let Ok(p) = std::env::var("REVIEW_PULSE_CONFIG") {
            debug!("Using config file from REVIEW_PULSE_CONFIG: {}", p);
            return Self::load(Path::new(&p));
        }
        let fallback = data_dir.join("config.yaml");
        if fallback.exists() {
            debug!("Using config file from data dir: {}", fallback.display());
            return Self::load(&fallback);
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

/// Fixed artifact locations. Stages talk to each other only through these files.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub raw_reviews: PathBuf,
    pub cleaned_reviews: PathBuf,
    pub untranslated_reviews: PathBuf,
    pub sentiment_results: PathBuf,
    pub lsa_topics: PathBuf,
    pub word_similarity: PathBuf,
    pub summary_reviews: PathBuf,
    pub pos_counts: PathBuf,
    pub ner_entities: PathBuf,
    pub results_dir: PathBuf,
}

impl PipelinePaths {
    pub fn new(data_dir: &Path, results_dir: &Path) -> Self {
        let raw = data_dir.join("raw");
        let processed = data_dir.join("processed");
        Self {
            raw_reviews: raw.join("reviews.csv"),
            cleaned_reviews: processed.join("cleaned_reviews.csv"),
            untranslated_reviews: processed.join("untranslated_reviews.csv"),
            sentiment_results: processed.join("sentiment_results.csv"),
            lsa_topics: processed.join("lsa_topics.csv"),
            word_similarity: processed.join("word_similarity.csv"),
            summary_reviews: processed.join("summary_reviews.csv"),
            pos_counts: processed.join("pos_counts.csv"),
            ner_entities: processed.join("ner_entities.csv"),
            results_dir: results_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let cfg: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.cluster.n_clusters, 5);
        assert_eq!(cfg.cluster.seed, 42);
        assert_eq!(cfg.qa.top_n, 3);
        assert_eq!(cfg.topics.n_topics, 5);
        assert_eq!(cfg.vectorize.similarity_max_features, 3000);
        assert_eq!(cfg.vectorize.topics_max_features, 2000);
        assert!(!cfg.clean.isolate_untranslated);
    }

    #[test]
    fn test_partial_yaml_overrides_one_section() {
        let cfg: AppConfig = serde_yaml::from_str("cluster:\n  n_clusters: 3\n").unwrap();
        assert_eq!(cfg.cluster.n_clusters, 3);
        assert_eq!(cfg.cluster.n_runs, 10);
        assert_eq!(cfg.similarity.target_words.len(), 5);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let res = AppConfig::resolve(missing.to_str(), dir.path());
        assert!(res.is_err());
    }

    #[test]
    fn test_paths_use_fixed_names() {
        let p = PipelinePaths::new(Path::new("data"), Path::new("results"));
        assert!(p.cleaned_reviews.ends_with("processed/cleaned_reviews.csv"));
        assert!(p.raw_reviews.ends_with("raw/reviews.csv"));
    }
}
