//! Review sentiment: a valence-lexicon compound score and an adjective polarity score.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

use crate::models::{SentimentLabel, SentimentRow};

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

const BOOST_INCR: f64 = 0.293;
const BOOST_DECR: f64 = -0.293;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

/// compound >= 0.05 Positive, <= -0.05 Negative, otherwise Neutral.
pub fn classify(compound: f64) -> SentimentLabel {
    if compound >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Valences on a -4..4 scale.
static VALENCE: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("awesome", 3.1), ("amazing", 2.8),
        ("best", 3.2), ("better", 1.9), ("love", 3.2), ("loved", 2.9), ("like", 1.5),
        ("liked", 1.8), ("nice", 1.8), ("happy", 2.7), ("satisfied", 1.8), ("satisfy", 2.0),
        ("perfect", 2.7), ("fantastic", 2.6), ("wonderful", 2.7), ("superb", 3.1), ("brilliant", 2.8),
        ("outstanding", 3.0), ("recommend", 1.5), ("recommended", 1.8), ("worth", 0.9),
        ("easy", 1.9), ("fine", 0.8), ("clean", 1.7), ("quiet", 0.6), ("smooth", 1.2),
        ("efficient", 1.8), ("reliable", 1.9), ("value", 1.4), ("helpful", 1.8), ("friendly", 2.2),
        ("fast", 0.9), ("quick", 0.8), ("comfortable", 1.5), ("beautiful", 2.9), ("pleased", 1.9),
        ("impressive", 2.3), ("impressed", 2.1), ("super", 2.9), ("cool", 1.3), ("enjoy", 2.2),
        ("glad", 2.0), ("thanks", 1.9), ("thank", 1.5), ("support", 1.7), ("worthy", 1.9),
        ("fresh", 1.3), ("powerful", 1.8), ("strong", 2.3), ("safe", 1.9), ("win", 2.8),
        ("bad", -2.5), ("worst", -3.1), ("worse", -2.1), ("poor", -2.1), ("terrible", -2.1),
        ("horrible", -2.5), ("awful", -2.0), ("hate", -2.7), ("hated", -3.2), ("disappointed", -1.9),
        ("disappointing", -2.2), ("disappointment", -2.3), ("problem", -1.7), ("issue", -0.8),
        ("broken", -1.4), ("broke", -1.8), ("damage", -2.2), ("damaged", -1.9), ("defective", -1.9),
        ("faulty", -1.7), ("noisy", -0.7), ("noise", -0.5), ("loud", -0.6), ("leak", -1.2),
        ("leaking", -1.3), ("waste", -1.8), ("useless", -1.8), ("cheap", -0.3), ("slow", -1.0),
        ("difficult", -1.5), ("fail", -2.5), ("failed", -2.3), ("failure", -2.3), ("fraud", -2.8),
        ("angry", -2.3), ("sad", -2.1), ("unhappy", -1.8), ("annoying", -1.7), ("complaint", -1.5),
        ("delay", -1.3), ("delayed", -0.9), ("late", -0.6), ("wrong", -2.1), ("error", -1.7),
        ("rude", -2.0), ("pathetic", -2.5), ("refund", -0.3), ("return", -0.2), ("dirty", -1.9),
        ("stuck", -1.0), ("weak", -1.9), ("unreliable", -1.9), ("regret", -1.8), ("ugly", -2.3),
        ("costly", -0.7), ("expensive", -0.9), ("hard", -0.4), ("pain", -2.3), ("vibration", -0.3),
    ]
    .into_iter()
    .collect()
});

static BOOSTERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", BOOST_INCR), ("really", BOOST_INCR), ("extremely", BOOST_INCR),
        ("absolutely", BOOST_INCR), ("highly", BOOST_INCR), ("totally", BOOST_INCR),
        ("completely", BOOST_INCR), ("so", BOOST_INCR), ("too", BOOST_INCR),
        ("incredibly", BOOST_INCR), ("super", BOOST_INCR), ("most", BOOST_INCR),
        ("slightly", BOOST_DECR), ("somewhat", BOOST_DECR), ("barely", BOOST_DECR),
        ("hardly", BOOST_DECR), ("little", BOOST_DECR), ("marginally", BOOST_DECR),
    ]
    .into_iter()
    .collect()
});

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "nor", "neither", "without", "cannot", "cant", "dont",
    "doesnt", "didnt", "isnt", "wasnt", "wont", "wouldnt", "shouldnt", "couldnt", "arent",
    "aint", "hasnt", "havent",
];

/// Adjective polarities in [-1, 1] for the polarity model.
static POLARITY: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("good", 0.7), ("great", 0.8), ("excellent", 1.0), ("awesome", 1.0), ("amazing", 0.6),
        ("best", 1.0), ("better", 0.5), ("nice", 0.6), ("happy", 0.8), ("perfect", 1.0),
        ("fantastic", 0.4), ("wonderful", 1.0), ("superb", 1.0), ("brilliant", 0.9),
        ("outstanding", 0.5), ("easy", 0.43), ("fine", 0.42), ("clean", 0.37), ("quiet", 0.0),
        ("smooth", 0.4), ("efficient", 0.3), ("reliable", 0.5), ("helpful", 0.5), ("fast", 0.2),
        ("quick", 0.33), ("comfortable", 0.4), ("beautiful", 0.85), ("impressive", 1.0),
        ("super", 0.33), ("cool", 0.35), ("glad", 0.5), ("strong", 0.43), ("satisfied", 0.5),
        ("worth", 0.3), ("bad", -0.7), ("worst", -1.0), ("worse", -0.4), ("poor", -0.4),
        ("terrible", -1.0), ("horrible", -1.0), ("awful", -1.0), ("disappointed", -0.75),
        ("disappointing", -0.6), ("broken", -0.4), ("defective", -0.5), ("faulty", -0.5),
        ("noisy", -0.3), ("loud", -0.1), ("useless", -0.5), ("cheap", 0.4), ("slow", -0.3),
        ("difficult", -0.5), ("angry", -0.5), ("sad", -0.5), ("unhappy", -0.6), ("annoying", -0.8),
        ("late", -0.3), ("wrong", -0.5), ("rude", -0.3), ("pathetic", -1.0), ("dirty", -0.6),
        ("weak", -0.38), ("unreliable", -0.5), ("ugly", -0.7), ("expensive", -0.5), ("hard", -0.29),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.3), ("really", 1.3), ("extremely", 1.5), ("absolutely", 1.4), ("highly", 1.3),
        ("totally", 1.3), ("super", 1.4), ("so", 1.3), ("too", 1.2), ("pretty", 1.1),
        ("quite", 1.1), ("slightly", 0.8), ("somewhat", 0.8),
    ]
    .into_iter()
    .collect()
});

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexiconScores {
    pub compound: f64,
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

/// Valence-lexicon scorer with boosters, negation within three tokens and "but" re-weighting.
pub fn lexicon_scores(text: &str) -> LexiconScores {
    let toks = tokens(text);
    if toks.is_empty() {
        return LexiconScores { compound: 0.0, pos: 0.0, neg: 0.0, neu: 0.0 };
    }

    let mut sentiments: Vec<f64> = Vec::with_capacity(toks.len());
    for (i, tok) in toks.iter().enumerate() {
        if BOOSTERS.contains_key(tok.as_str()) && !VALENCE.contains_key(tok.as_str()) {
            sentiments.push(0.0);
            continue;
        }
        let Some(&base) = VALENCE.get(tok.as_str()) else {
            sentiments.push(0.0);
            continue;
        };
        let mut valence = base;
        for dist in 0..3 {
            if i <= dist {
                break;
            }
            let prev = toks[i - dist - 1].as_str();
            if let Some(&b) = BOOSTERS.get(prev) {
                let mut scalar = if valence < 0.0 { -b } else { b };
                if dist == 1 {
                    scalar *= 0.95;
                } else if dist == 2 {
                    scalar *= 0.9;
                }
                valence += scalar;
            }
        }
        let negated = (1..=3).any(|k| i >= k && NEGATIONS.contains(&toks[i - k].as_str()));
        if negated {
            valence *= NEGATION_SCALAR;
        }
        sentiments.push(valence);
    }

    if let Some(but_idx) = toks.iter().position(|t| t == "but") {
        for (i, s) in sentiments.iter_mut().enumerate() {
            if i < but_idx {
                *s *= 0.5;
            } else if i > but_idx {
                *s *= 1.5;
            }
        }
    }

    let sum: f64 = sentiments.iter().sum();
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &s in &sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    let total = pos_sum + neg_sum.abs() + neu_count;
    LexiconScores {
        compound: round_to(compound, 4),
        pos: round_to((pos_sum / total).abs(), 3),
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
    }
}

/// Mean adjective polarity in [-1, 1]; intensifiers scale, negation flips and halves.
pub fn polarity(text: &str) -> f64 {
    let toks = tokens(text);
    let mut assessments = Vec::new();
    for (i, tok) in toks.iter().enumerate() {
        let Some(&p) = POLARITY.get(tok.as_str()) else {
            continue;
        };
        let mut p = p;
        if i >= 1 {
            if let Some(&m) = INTENSIFIERS.get(toks[i - 1].as_str()) {
                p = (p * m).clamp(-1.0, 1.0);
            }
        }
        let negated = (1..=2).any(|k| i >= k && NEGATIONS.contains(&toks[i - k].as_str()));
        if negated {
            p *= -0.5;
        }
        assessments.push(p);
    }
    if assessments.is_empty() {
        0.0
    } else {
        assessments.iter().sum::<f64>() / assessments.len() as f64
    }
}

pub fn score_review(review: &str) -> SentimentRow {
    let lex = lexicon_scores(review);
    SentimentRow {
        review: review.to_string(),
        vader_compound: lex.compound,
        vader_pos: lex.pos,
        vader_neg: lex.neg,
        vader_neu: lex.neu,
        textblob_polarity: polarity(review),
        sentiment: classify(lex.compound),
    }
}

/// Label counts in label order.
pub fn distribution(rows: &[SentimentRow]) -> BTreeMap<SentimentLabel, usize> {
    let mut counts = BTreeMap::new();
    for r in rows {
        *counts.entry(r.sentiment).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(0.05), SentimentLabel::Positive);
        assert_eq!(classify(-0.05), SentimentLabel::Negative);
        assert_eq!(classify(0.0), SentimentLabel::Neutral);
        assert_eq!(classify(0.0499), SentimentLabel::Neutral);
        assert_eq!(classify(-0.0499), SentimentLabel::Neutral);
        assert_eq!(classify(1.0), SentimentLabel::Positive);
    }

    #[test]
    fn test_single_positive_word_compound() {
        let s = lexicon_scores("great product");
        assert_abs_diff_eq!(s.compound, 0.6249, epsilon = 1e-4);
        assert_abs_diff_eq!(s.pos + s.neg + s.neu, 1.0, epsilon = 2e-3);
        assert_eq!(score_review("great product").sentiment, SentimentLabel::Positive);
    }

    #[test]
    fn test_negation_flips_sign() {
        assert!(lexicon_scores("not good").compound < 0.0);
        assert!(polarity("not good") < 0.0);
    }

    #[test]
    fn test_booster_increases_intensity() {
        let plain = lexicon_scores("good machine").compound;
        let boosted = lexicon_scores("very good machine").compound;
        assert!(boosted > plain);
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        assert!(lexicon_scores("good design but terrible service").compound < 0.0);
    }

    #[test]
    fn test_neutral_and_empty_text() {
        let s = lexicon_scores("washing machine delivered tuesday");
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
        assert_eq!(lexicon_scores("").compound, 0.0);
        assert_eq!(score_review("drum door").sentiment, SentimentLabel::Neutral);
        assert_eq!(polarity("drum door"), 0.0);
    }

    #[test]
    fn test_distribution_counts() {
        let rows: Vec<_> = ["great", "terrible", "door", "love"].iter().map(|r| score_review(r)).collect();
        let d = distribution(&rows);
        assert_eq!(d[&SentimentLabel::Positive], 2);
        assert_eq!(d[&SentimentLabel::Negative], 1);
        assert_eq!(d[&SentimentLabel::Neutral], 1);
    }
}
