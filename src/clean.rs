use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use whatlang::{Lang, Script};

use crate::lemmatize::lemmatize;
use crate::models::{RawReview, ReviewRecord, TranslationStatus};
use crate::stopwords::cleaning_stopwords;
use crate::translate::Translator;

pub const UNKNOWN_LANGUAGE: &str = "unknown";
const HINDI: &str = "hi";

static SCRIPT_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
// only real tags and comments; a bare `<` or `>` in review text is kept
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").unwrap());
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9\s]").unwrap());

/// Language-detection collaborator. `None` means detection failed.
pub trait LanguageDetector {
    fn detect(&self, text: &str) -> Option<String>;
}

pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        match whatlang::detect(text) {
            // short Devanagari reviews are often read as Marathi or Nepali
            Some(info) if info.script() == Script::Devanagari => {
                if info.lang() != Lang::Hin {
                    debug!(
                        "Devanagari review treated as Hindi - detected={}, reliable={}",
                        info.lang().code(),
                        info.is_reliable()
                    );
                }
                Some(HINDI.to_string())
            }
            Some(info) => Some(iso_639_1(info.lang())),
            None => (whatlang::detect_script(text) == Some(Script::Devanagari)).then(|| HINDI.to_string()),
        }
    }
}

/// Two-letter codes for the common cases; everything else keeps whatlang's three-letter code.
fn iso_639_1(lang: Lang) -> String {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Hin => "hi",
        Lang::Mar => "mr",
        Lang::Ben => "bn",
        Lang::Tam => "ta",
        Lang::Tel => "te",
        Lang::Guj => "gu",
        Lang::Kan => "kn",
        Lang::Mal => "ml",
        Lang::Pan => "pa",
        Lang::Nep => "ne",
        Lang::Urd => "ur",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ara => "ar",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Ind => "id",
        Lang::Tur => "tr",
        other => return other.code().to_string(),
    };
    code.to_string()
}

pub(crate) fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Strip markup, URLs and punctuation, fold case. Total over every input string.
pub fn clean_text(text: &str) -> String {
    let s = SCRIPT_STYLE_RE.replace_all(text, " ");
    let s = TAG_RE.replace_all(&s, " ");
    let s = decode_entities(&s);
    let s = URL_RE.replace_all(&s, "");
    // fold accents before dropping anything outside ASCII
    let s: String = s.nfkd().filter(|c| c.is_ascii()).collect();
    let s = NON_ALNUM_RE.replace_all(&s, "");
    s.to_lowercase().trim().to_string()
}

/// Tokenize, drop stop words, lemmatize and rejoin with single spaces.
pub fn normalize_tokens(text: &str) -> String {
    let stop = cleaning_stopwords();
    text.split_whitespace()
        .filter(|t| !stop.contains(t))
        .map(lemmatize)
        .filter(|t| !t.is_empty() && !stop.contains(t.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyReview,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanOutcome {
    Cleaned(ReviewRecord),
    Skipped(SkipReason),
}

/// Counts and failure causes of one cleaning run.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    pub total: usize,
    pub skipped_empty_input: usize,
    pub unknown_language: usize,
    pub translated: usize,
    pub translation_failed: usize,
    pub untranslated_isolated: usize,
    pub empty_after_cleaning: usize,
    pub duplicates_dropped: usize,
    pub retained: usize,
    pub failures: Vec<String>,
}

/// Output of a cleaning run: the corpus, rows held back for failed translation, and the report.
#[derive(Debug, Clone, Default)]
pub struct CleanedSet {
    pub records: Vec<ReviewRecord>,
    pub untranslated: Vec<ReviewRecord>,
    pub report: CleanReport,
}

/// The cleaning stage object: built once per run, owns nothing global.
pub struct Cleaner<'a> {
    detector: &'a dyn LanguageDetector,
    translator: &'a (dyn Translator + Send + Sync),
    isolate_untranslated: bool,
}

impl<'a> Cleaner<'a> {
    pub fn new(
        detector: &'a dyn LanguageDetector,
        translator: &'a (dyn Translator + Send + Sync),
        isolate_untranslated: bool,
    ) -> Self {
        Self {
            detector,
            translator,
            isolate_untranslated,
        }
    }

    /// Run one raw review through detection, translation, cleaning and normalization.
    /// The second value carries the translation error, if any.
    pub async fn clean_review(&self, raw: &RawReview) -> (CleanOutcome, Option<String>) {
        let review = raw.review.trim();
        if review.is_empty() {
            return (CleanOutcome::Skipped(SkipReason::EmptyReview), None);
        }

        let lang = self
            .detector
            .detect(review)
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

        let (translated, status, failure) = if lang == HINDI {
            match self.translator.translate(review, HINDI).await {
                Ok(t) => (t, TranslationStatus::Translated, None),
                Err(e) => {
                    warn!("Translation failed, keeping original text - error={}", e);
                    (review.to_string(), TranslationStatus::Failed, Some(e.to_string()))
                }
            }
        } else {
            (review.to_string(), TranslationStatus::NotNeeded, None)
        };

        let cleaned = normalize_tokens(&clean_text(&translated));

        let record = ReviewRecord {
            rating: raw.rating.clone(),
            title: raw.title.clone(),
            original_text: raw.review.clone(),
            detected_language: lang,
            translated_text: translated,
            cleaned_text: cleaned,
            translation: status,
        };
        (CleanOutcome::Cleaned(record), failure)
    }

    pub async fn clean_all(&self, raws: &[RawReview]) -> CleanedSet {
        let mut report = CleanReport {
            total: raws.len(),
            ..Default::default()
        };
        let mut kept = Vec::with_capacity(raws.len());
        let mut untranslated = Vec::new();

        for (idx, raw) in raws.iter().enumerate() {
            let (outcome, failure) = self.clean_review(raw).await;
            if let Some(f) = failure {
                report.failures.push(format!("row {idx}: {f}"));
            }
            match outcome {
                CleanOutcome::Skipped(SkipReason::EmptyReview) => report.skipped_empty_input += 1,
                CleanOutcome::Cleaned(rec) => {
                    if rec.detected_language == UNKNOWN_LANGUAGE {
                        report.unknown_language += 1;
                    }
                    match rec.translation {
                        TranslationStatus::Translated => report.translated += 1,
                        TranslationStatus::Failed => report.translation_failed += 1,
                        TranslationStatus::NotNeeded => {}
                    }
                    if rec.translation == TranslationStatus::Failed && self.isolate_untranslated {
                        report.untranslated_isolated += 1;
                        untranslated.push(rec);
                    } else {
                        kept.push(rec);
                    }
                }
            }
            if idx % 20 == 0 && idx > 0 {
                debug!("Cleaning progress - processed={}/{}", idx, raws.len());
            }
        }

        let (records, empty, dups) = finalize(kept);
        report.empty_after_cleaning = empty;
        report.duplicates_dropped = dups;
        report.retained = records.len();

        info!(
            "Cleaning summary - total={}, retained={}, skipped_empty={}, empty_after_clean={}, duplicates={}, translated={}, translation_failed={}, isolated={}",
            report.total,
            report.retained,
            report.skipped_empty_input,
            report.empty_after_cleaning,
            report.duplicates_dropped,
            report.translated,
            report.translation_failed,
            report.untranslated_isolated
        );

        CleanedSet {
            records,
            untranslated,
            report,
        }
    }
}

/// Drop empty cleaned strings, then exact duplicates keeping the first occurrence.
/// Returns the survivors in insertion order plus (empty, duplicate) drop counts.
pub fn finalize(records: Vec<ReviewRecord>) -> (Vec<ReviewRecord>, usize, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut empty = 0usize;
    let mut dups = 0usize;
    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        if rec.cleaned_text.trim().is_empty() {
            empty += 1;
            continue;
        }
        if !seen.insert(rec.cleaned_text.clone()) {
            dups += 1;
            continue;
        }
        out.push(rec);
    }
    (out, empty, dups)
}
