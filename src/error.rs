use thiserror::Error;

/// Failures of the vector-space layer. Stage code wraps these into `anyhow`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("corpus is empty")]
    EmptyCorpus,

    #[error("vocabulary is empty after stop word removal")]
    EmptyVocabulary,

    #[error("component count must be positive")]
    InvalidComponentCount,

    #[error("cluster count must be positive")]
    InvalidClusterCount,

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("no review text column (Cleaned_Review or cleaned_text) in {0}")]
    MissingTextColumn(String),
}
