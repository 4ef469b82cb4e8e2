//! Part-of-speech tagging and entity spotting over cleaned review text.
//!
//! The tagger is a lexicon plus suffix-rule tagger emitting Penn Treebank tags.
//! The recognizer is a gazetteer plus number patterns. Both work on lowercase
//! tokens, which is all the cleaned corpus contains.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{EntityRow, PosCountRow};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());
static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(st|nd|rd|th)$").unwrap());

pub fn tokenize(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

static CLOSED_CLASS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        ("DT", &["the", "a", "an", "this", "that", "these", "those", "every", "each", "all", "some", "any", "another", "both", "no"]),
        ("IN", &["in", "on", "at", "of", "for", "with", "by", "from", "about", "after", "before", "into", "over", "under", "between", "through", "during", "without", "within", "since", "until", "than", "because", "if", "while", "though", "although", "as", "per"]),
        ("CC", &["and", "or", "but", "nor", "yet"]),
        ("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them"]),
        ("PRP$", &["my", "your", "his", "her", "its", "our", "their"]),
        ("MD", &["can", "could", "will", "would", "shall", "should", "may", "might", "must"]),
        ("TO", &["to"]),
        ("RB", &["not", "very", "really", "too", "also", "just", "only", "never", "always", "well", "even", "still", "already", "quite", "so", "again", "almost", "now", "then", "here", "soon", "totally", "highly"]),
        ("VBZ", &["is", "has", "does"]),
        ("VBP", &["am", "are", "have", "do"]),
        ("VBD", &["was", "were", "had", "did", "bought", "got", "came", "went", "made", "took", "said", "gave", "found", "felt", "received", "broke"]),
        ("VB", &["be"]),
        ("VBN", &["been", "done", "given", "taken"]),
        ("VBG", &["being"]),
        ("WDT", &["which", "whatever"]),
        ("WP", &["what", "who", "whom"]),
        ("WRB", &["how", "when", "where", "why"]),
        ("EX", &["there"]),
        ("UH", &["wow", "ok", "okay", "oh", "yes"]),
        ("CD", &["one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "hundred", "thousand", "lakh"]),
        ("JJR", &["better", "worse", "more", "less", "bigger", "smaller", "cheaper", "faster"]),
        ("JJS", &["best", "worst", "most", "least"]),
    ];
    let mut map = HashMap::new();
    for (tag, words) in groups {
        for w in *words {
            map.insert(*w, *tag);
        }
    }
    map
});

static ADJECTIVES: &[&str] = &[
    "good", "great", "bad", "nice", "excellent", "awesome", "amazing", "poor", "quiet", "noisy", "perfect",
    "happy", "fast", "slow", "easy", "cheap", "worth", "new", "old", "big", "small", "large", "high", "low",
    "fine", "superb", "loud", "clean", "smooth", "terrible", "horrible", "awful", "fantastic", "wonderful",
    "overall", "satisfied", "disappointed", "worthy", "super", "genuine", "fresh", "first", "average",
    "decent", "solid", "sturdy", "bright", "sharp", "heavy", "light", "best", "top", "quick", "free",
];

static NOUNS: &[&str] = &[
    "product", "machine", "quality", "price", "delivery", "service", "installation", "drum", "wash", "water",
    "time", "money", "value", "performance", "camera", "battery", "screen", "phone", "motor", "sound", "noise",
    "display", "design", "door", "issue", "problem", "day", "month", "year", "week", "customer", "experience",
    "life", "backup", "charger", "speed", "build", "size", "capacity", "warranty", "technician", "cloth",
    "clothes", "spin", "dryer", "washer", "load", "power", "rating", "review", "brand", "budget", "box",
];

static VERBS: &[&str] = &[
    "love", "like", "buy", "recommend", "work", "use", "need", "want", "get", "make", "take", "go", "come",
    "say", "try", "think", "feel", "know", "see", "give", "keep", "return", "replace", "suggest", "expect",
];

const MODALS_AND_TO: &[&str] = &["MD", "TO"];

/// Lexicon plus suffix-rule Penn Treebank tagger.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosTagger;

impl PosTagger {
    pub fn new() -> Self {
        Self
    }

    pub fn tag(&self, text: &str) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        for token in tokenize(text) {
            let lower = token.to_lowercase();
            let prev_tag = out.last().map(|(_, t)| t.as_str());
            let tag = tag_word(&lower, prev_tag);
            out.push((token.to_string(), tag.to_string()));
        }
        out
    }

    /// Tag for a word with no context, used to split frequent words into nouns and adjectives.
    pub fn tag_single(&self, word: &str) -> &'static str {
        tag_word(&word.to_lowercase(), None)
    }
}

fn tag_word(word: &str, prev_tag: Option<&str>) -> &'static str {
    if let Some(&tag) = CLOSED_CLASS.get(word) {
        return tag;
    }
    let after_infinitive = prev_tag.is_some_and(|t| MODALS_AND_TO.contains(&t));

    if VERBS.contains(&word) {
        return match prev_tag {
            _ if after_infinitive => "VB",
            Some("PRP") => "VBP",
            _ => "VB",
        };
    }
    if ADJECTIVES.contains(&word) {
        return "JJ";
    }
    if NOUNS.contains(&word) {
        return "NN";
    }

    let suffix_tag = suffix_rule(word);
    if after_infinitive && suffix_tag == "NN" {
        return "VB";
    }
    suffix_tag
}

fn suffix_rule(word: &str) -> &'static str {
    if word.chars().all(|c| c.is_ascii_digit()) {
        return "CD";
    }
    if ORDINAL_RE.is_match(word) {
        return "JJ";
    }
    let len = word.len();
    if len > 4 && word.ends_with("ly") {
        return "RB";
    }
    if len > 4 && word.ends_with("ing") {
        return "VBG";
    }
    if len > 3 && word.ends_with("ed") {
        return "VBD";
    }
    if len > 5 && word.ends_with("est") {
        return "JJS";
    }
    const ADJ_SUFFIXES: [&str; 9] = ["ful", "less", "ous", "able", "ible", "ive", "al", "ic", "ish"];
    if len > 4 && ADJ_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        return "JJ";
    }
    const NOUN_SUFFIXES: [&str; 9] = ["tion", "sion", "ment", "ness", "ity", "ance", "ence", "ship", "ism"];
    if NOUN_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        return "NN";
    }
    if len > 3
        && word.ends_with('s')
        && !["ss", "us", "is"].iter().any(|s| word.ends_with(s))
    {
        return "NNS";
    }
    "NN"
}

/// Counts in descending order; equal counts keep first-seen order.
pub fn most_common<I, S>(items: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        let key: String = item.into();
        match index.get(&key) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(n);
    order
}

#[derive(Debug, Clone)]
pub struct PosSummary {
    pub counts: Vec<PosCountRow>,
    pub adjectives: Vec<(String, usize)>,
    pub verbs: Vec<(String, usize)>,
}

/// Tag every review and aggregate tag counts plus the most frequent adjectives and verbs.
pub fn summarize_corpus(tagger: &PosTagger, documents: &[String], top: usize) -> PosSummary {
    let mut tagged = Vec::new();
    for doc in documents {
        tagged.extend(tagger.tag(doc));
    }
    debug!("Tagged corpus - documents={}, tokens={}", documents.len(), tagged.len());

    let counts = most_common(tagged.iter().map(|(_, t)| t.as_str()), usize::MAX)
        .into_iter()
        .map(|(tag, count)| PosCountRow { tag, count })
        .collect();
    let adjectives = most_common(
        tagged.iter().filter(|(_, t)| t.starts_with("JJ")).map(|(w, _)| w.as_str()),
        top,
    );
    let verbs = most_common(
        tagged.iter().filter(|(_, t)| t.starts_with("VB")).map(|(w, _)| w.as_str()),
        top,
    );
    PosSummary {
        counts,
        adjectives,
        verbs,
    }
}

static ORGANIZATIONS: &[&str] = &[
    "samsung", "lg", "whirlpool", "ifb", "bosch", "flipkart", "amazon", "godrej", "haier", "panasonic",
    "voltas", "sony", "apple", "xiaomi", "redmi", "realme", "oneplus", "vivo", "oppo", "philips", "bajaj",
    "motorola", "nokia", "lenovo", "hp", "dell", "asus",
];

static PRODUCTS: &[&str] = &[
    "iphone", "ipad", "galaxy", "pixel", "android", "alexa", "echo", "kindle", "macbook", "playstation",
    "airpods", "firestick",
];

static ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

static DATE_WORDS: &[&str] = &[
    "today", "yesterday", "tomorrow", "january", "february", "march", "april", "june", "july", "august",
    "september", "october", "november", "december", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday", "diwali",
];

static DATE_UNITS: &[&str] = &[
    "day", "days", "week", "weeks", "month", "months", "year", "years", "hour", "hours", "night", "nights",
];

static QUANTITY_UNITS: &[&str] = &[
    "kg", "kgs", "litre", "litres", "liter", "liters", "rpm", "watt", "watts", "inch", "inches", "gb", "mah",
    "mp", "cm", "mm", "star", "stars", "ton",
];

static CURRENCY: &[&str] = &["rs", "inr", "rupees", "rupee"];

fn is_number(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
        || matches!(
            token,
            "one" | "two" | "three" | "four" | "five" | "six" | "seven" | "eight" | "nine" | "ten" | "hundred"
                | "thousand" | "lakh"
        )
}

/// Gazetteer and number-pattern entity spotter.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityRecognizer;

impl EntityRecognizer {
    pub fn new() -> Self {
        Self
    }

    pub fn entities(&self, text: &str) -> Vec<EntityRow> {
        let tokens: Vec<String> = tokenize(text).into_iter().map(|t| t.to_lowercase()).collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let tok = tokens[i].as_str();
            let next = tokens.get(i + 1).map(String::as_str);
            let push = |out: &mut Vec<EntityRow>, text: String, kind: &str| {
                out.push(EntityRow {
                    entity: text,
                    kind: kind.to_string(),
                })
            };

            if CURRENCY.contains(&tok) && next.is_some_and(is_number) {
                push(&mut out, format!("{} {}", tok, tokens[i + 1]), "MONEY");
                i += 2;
                continue;
            }
            if is_number(tok) {
                match next {
                    Some(n) if CURRENCY.contains(&n) => {
                        push(&mut out, format!("{} {}", tok, n), "MONEY");
                        i += 2;
                    }
                    Some(n) if QUANTITY_UNITS.contains(&n) => {
                        push(&mut out, format!("{} {}", tok, n), "QUANTITY");
                        i += 2;
                    }
                    Some(n) if DATE_UNITS.contains(&n) => {
                        push(&mut out, format!("{} {}", tok, n), "DATE");
                        i += 2;
                    }
                    _ => {
                        push(&mut out, tok.to_string(), "CARDINAL");
                        i += 1;
                    }
                }
                continue;
            }
            let kind = if ORDINAL_WORDS.contains(&tok) || ORDINAL_RE.is_match(tok) {
                Some("ORDINAL")
            } else if DATE_WORDS.contains(&tok) {
                Some("DATE")
            } else if ORGANIZATIONS.contains(&tok) {
                Some("ORG")
            } else if PRODUCTS.contains(&tok) {
                Some("PRODUCT")
            } else {
                None
            };
            if let Some(kind) = kind {
                push(&mut out, tok.to_string(), kind);
            }
            i += 1;
        }
        out
    }

    /// Entities of the first `sample` non-blank reviews, in review order.
    pub fn entities_for_corpus(&self, documents: &[String], sample: usize) -> Vec<EntityRow> {
        documents
            .iter()
            .filter(|d| !d.trim().is_empty())
            .take(sample)
            .flat_map(|d| self.entities(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<String> {
        PosTagger::new().tag(text).into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_lexicon_and_suffix_tags() {
        assert_eq!(tags("good machine"), vec!["JJ", "NN"]);
        assert_eq!(tags("washing quickly delivered"), vec!["VBG", "RB", "VBD"]);
        assert_eq!(tags("beautiful installation clothes 15"), vec!["JJ", "NN", "NN", "CD"]);
        assert_eq!(tags("speakers"), vec!["NNS"]);
        assert_eq!(tags("zxq"), vec!["NN"]);
    }

    #[test]
    fn test_context_rule_after_modal_and_to() {
        assert_eq!(tags("will recommend"), vec!["MD", "VB"]);
        assert_eq!(tags("to return"), vec!["TO", "VB"]);
        assert_eq!(tags("can blorp"), vec!["MD", "VB"]);
        assert_eq!(tags("we love"), vec!["PRP", "VBP"]);
    }

    #[test]
    fn test_most_common_keeps_first_seen_on_ties() {
        let counts = most_common(["b", "a", "b", "c", "a", "d"], 3);
        assert_eq!(
            counts,
            vec![("b".to_string(), 2), ("a".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_corpus_summary_counts_and_top_words() {
        let docs = vec!["good machine quiet drum".to_string(), "good product delivered fast".to_string()];
        let summary = summarize_corpus(&PosTagger::new(), &docs, 10);
        assert_eq!(summary.counts[0].tag, "JJ");
        assert_eq!(summary.counts[0].count, 4);
        assert_eq!(summary.adjectives[0], ("good".to_string(), 2));
        assert_eq!(summary.verbs, vec![("delivered".to_string(), 1)]);
        let total: usize = summary.counts.iter().map(|c| c.count).sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn test_entity_patterns() {
        let ents = EntityRecognizer::new().entities("bought samsung 7 kg rs 15000 2 days first iphone 3");
        let pairs: Vec<(&str, &str)> = ents.iter().map(|e| (e.entity.as_str(), e.kind.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("samsung", "ORG"),
                ("7 kg", "QUANTITY"),
                ("rs 15000", "MONEY"),
                ("2 days", "DATE"),
                ("first", "ORDINAL"),
                ("iphone", "PRODUCT"),
                ("3", "CARDINAL"),
            ]
        );
    }

    #[test]
    fn test_entity_sample_limit() {
        let docs = vec!["lg".to_string(), " ".to_string(), "bosch".to_string(), "ifb".to_string()];
        let ents = EntityRecognizer::new().entities_for_corpus(&docs, 2);
        assert_eq!(ents.len(), 2);
        assert_eq!(ents[1].entity, "bosch");
    }
}
