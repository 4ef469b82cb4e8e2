// src/render.rs
use crate::models::{SentimentLabel, Topic};
use crate::viz_export::Dashboard;

const PREVIEW_CHARS: usize = 250;

fn preview(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    if text.chars().count() > limit {
        out.push_str("...");
    }
    out
}

pub fn render_sentiment_distribution(counts: &[(SentimentLabel, usize)]) -> String {
    let mut out = String::new();
    out.push_str("Sentiment distribution:\n");
    for (label, n) in counts {
        out.push_str(&format!("  {:<9} {}\n", label.as_str(), n));
    }
    out
}

pub fn render_topics_text(topics: &[Topic]) -> String {
    let mut out = String::new();
    for t in topics {
        out.push_str(&format!("Topic {}: {}\n", t.index + 1, t.terms.join(", ")));
    }
    out
}

pub fn render_summaries_text(summaries: &[String]) -> String {
    let mut out = String::new();
    for (i, s) in summaries.iter().enumerate() {
        out.push_str(&format!("\nCluster {}:\n-> {}\n", i + 1, preview(s, PREVIEW_CHARS)));
    }
    out
}

pub fn render_report_markdown(d: &Dashboard) -> String {
    let mut md = String::new();
    md.push_str("# Product Review Report\n\n");

    md.push_str("## Sentiment Distribution\n");
    md.push_str(&format!("{} reviews scored.\n\n", d.sentiment.total));
    md.push_str("| Sentiment | Reviews | Share |\n|---|---:|---:|\n");
    for (label, n) in &d.sentiment.counts {
        let share = if d.sentiment.total == 0 {
            0.0
        } else {
            *n as f64 * 100.0 / d.sentiment.total as f64
        };
        md.push_str(&format!("| {} | {} | {:.1}% |\n", label, n, share));
    }
    md.push('\n');

    if let Some(t) = &d.topics {
        md.push_str("## Top Topic Terms (LSA)\n");
        for (term, n) in &t.top_terms {
            md.push_str(&format!("- **{}** ({} of {} topics)\n", term, n, t.columns.len()));
        }
        md.push('\n');
    }

    if let Some(s) = &d.similarity {
        md.push_str("## Word Similarity\n");
        md.push_str("| Target | Similar words |\n|---|---|\n");
        for row in &s.rows {
            let mut ranked: Vec<(&String, &f64)> = row.scores.iter().collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
            let cells: Vec<String> = ranked.iter().map(|(w, v)| format!("{} ({:.2})", w, v)).collect();
            md.push_str(&format!("| {} | {} |\n", row.target, cells.join(", ")));
        }
        md.push('\n');
    }

    if !d.summaries.is_empty() {
        md.push_str("## Representative Reviews\n");
        for (i, s) in d.summaries.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, preview(s, PREVIEW_CHARS)));
        }
        md.push('\n');
    }

    md.push_str("## Files\n");
    for f in &d.files {
        md.push_str(&format!("- `{}`\n", f));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz_export::{VSentiment, VSimilarity, VSimilarityRow};
    use std::collections::BTreeMap;

    #[test]
    fn test_report_sections_follow_available_data() {
        let d = Dashboard {
            sentiment: VSentiment {
                total: 4,
                counts: BTreeMap::from([("Negative".to_string(), 1), ("Positive".to_string(), 3)]),
            },
            topics: None,
            similarity: Some(VSimilarity {
                words: vec!["backup".into(), "life".into()],
                rows: vec![VSimilarityRow {
                    target: "battery".into(),
                    scores: BTreeMap::from([("backup".to_string(), 0.41), ("life".to_string(), 0.87)]),
                }],
            }),
            summaries: vec!["quiet machine".into()],
            files: vec!["viz.sentiment.json".into()],
        };
        let md = render_report_markdown(&d);
        assert!(md.contains("| Positive | 3 | 75.0% |"));
        assert!(!md.contains("Top Topic Terms"));
        assert!(md.contains("| battery | life (0.87), backup (0.41) |"));
        assert!(md.contains("1. quiet machine"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("ok", 5), "ok");
    }
}
