use serde::{Deserialize, Serialize};

/// One scraped review card, as written by the collection stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(rename = "Rating", default)]
    pub rating: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Review", default)]
    pub review: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    NotNeeded,
    Translated,
    Failed,
}

/// A cleaned review row. `translation` stays in memory and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Original_Review")]
    pub original_text: String,
    #[serde(rename = "Language")]
    pub detected_language: String,
    #[serde(rename = "Translated_Review")]
    pub translated_text: String,
    #[serde(rename = "Cleaned_Review")]
    pub cleaned_text: String,
    #[serde(skip, default = "not_needed")]
    pub translation: TranslationStatus,
}

fn not_needed() -> TranslationStatus {
    TranslationStatus::NotNeeded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRow {
    pub review: String,
    pub vader_compound: f64,
    pub vader_pos: f64,
    pub vader_neg: f64,
    pub vader_neu: f64,
    pub textblob_polarity: f64,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSimilarityRow {
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "Similar_Word")]
    pub similar_word: String,
    #[serde(rename = "Cosine_Similarity")]
    pub cosine_similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Representative_Review")]
    pub representative_review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosCountRow {
    #[serde(rename = "POS_Tag")]
    pub tag: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    #[serde(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

/// Topic extracted from one SVD component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub index: usize,
    pub terms: Vec<String>,
    pub singular_value: f64,
}

/// Partition labels plus one representative review index per partition.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub representatives: Vec<Option<usize>>,
}

impl ClusterAssignment {
    pub fn n_partitions(&self) -> usize {
        self.representatives.len()
    }

    pub fn members(&self, partition: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == partition)
            .map(|(i, _)| i)
            .collect()
    }
}
