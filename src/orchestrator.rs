use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use reqwest::Client;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::clean::{Cleaner, WhatlangDetector};
use crate::cluster::{cluster_reviews, ClusterParams};
use crate::config::{AppConfig, PipelinePaths};
use crate::corpus::{load_corpus, read_raw_reviews, write_csv, Corpus};
use crate::fetch::collect_reviews;
use crate::models::SummaryRow;
use crate::pos::{summarize_corpus, EntityRecognizer, PosTagger};
use crate::qa::QaEngine;
use crate::render::{render_report_markdown, render_sentiment_distribution, render_summaries_text, render_topics_text};
use crate::sentiment::{distribution, score_review};
use crate::similarity::WordSpace;
use crate::topics::{extract_topics, topic_table};
use crate::translate;
use crate::vectorize::TfidfVectorizer;
use crate::viz_export::write_all_viz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Collect,
    Preprocess,
    PosNer,
    Sentiment,
    Similarity,
    Topics,
    Qa,
    Summarize,
    Dashboard,
    All,
}

/// Order of the full pipeline. Collection is never part of it.
pub const FULL_PIPELINE: [Stage; 8] = [
    Stage::Preprocess,
    Stage::PosNer,
    Stage::Sentiment,
    Stage::Similarity,
    Stage::Topics,
    Stage::Qa,
    Stage::Summarize,
    Stage::Dashboard,
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Collect => "collect",
            Stage::Preprocess => "preprocess",
            Stage::PosNer => "pos-ner",
            Stage::Sentiment => "sentiment",
            Stage::Similarity => "similarity",
            Stage::Topics => "topics",
            Stage::Qa => "qa",
            Stage::Summarize => "summarize",
            Stage::Dashboard => "dashboard",
            Stage::All => "all",
        }
    }
}

pub const MENU: &str = "\nProduct Review Analysis Pipeline\n\
===================================\n\
Choose a phase to run:\n\
1) Preprocessing & Cleaning\n\
2) POS + NER Analysis\n\
3) Sentiment Analysis\n\
4) Word Similarity & Semantics\n\
5) Interactive QA System\n\
6) Summarization\n\
7) Run Full Pipeline (All Steps)\n\
8) Topic Modeling (LSA)\n\
9) Dashboard & Report\n\
10) Collect Reviews\n\
0) Exit\n";

/// Menu entry to stage; None means exit.
pub fn menu_choice(choice: &str) -> Option<Stage> {
    match choice.trim() {
        "1" => Some(Stage::Preprocess),
        "2" => Some(Stage::PosNer),
        "3" => Some(Stage::Sentiment),
        "4" => Some(Stage::Similarity),
        "5" => Some(Stage::Qa),
        "6" => Some(Stage::Summarize),
        "7" => Some(Stage::All),
        "8" => Some(Stage::Topics),
        "9" => Some(Stage::Dashboard),
        "10" => Some(Stage::Collect),
        _ => None,
    }
}

/// Per-invocation context: settings, artifact paths and the shared HTTP client.
pub struct PipelineCtx {
    pub cfg: AppConfig,
    pub paths: PipelinePaths,
    pub client: Client,
}

impl PipelineCtx {
    pub fn new(cfg: AppConfig, paths: PipelinePaths) -> Result<Self> {
        let client = Client::builder()
            .user_agent(cfg.scrape.user_agent.clone())
            .build()
            .context("Building HTTP client")?;
        Ok(Self { cfg, paths, client })
    }
}

pub async fn run_stage(ctx: &PipelineCtx, stage: Stage) -> Result<()> {
    if stage == Stage::All {
        let pipeline_start = Instant::now();
        info!("Pipeline started - stages={}", FULL_PIPELINE.len());
        for s in FULL_PIPELINE {
            run_single(ctx, s).await?;
        }
        info!(
            "Pipeline completed - duration={:.2}s",
            pipeline_start.elapsed().as_secs_f32()
        );
        return Ok(());
    }
    run_single(ctx, stage).await
}

async fn run_single(ctx: &PipelineCtx, stage: Stage) -> Result<()> {
    let start = Instant::now();
    info!("Stage started - stage={}", stage.as_str());
    match stage {
        Stage::Collect => run_collect(ctx).await?,
        Stage::Preprocess => run_preprocess(ctx).await?,
        Stage::PosNer => run_pos_ner(ctx)?,
        Stage::Sentiment => run_sentiment(ctx)?,
        Stage::Similarity => run_similarity(ctx)?,
        Stage::Topics => run_topics(ctx)?,
        Stage::Qa => run_qa(ctx)?,
        Stage::Summarize => run_summarize(ctx)?,
        Stage::Dashboard => run_dashboard(ctx)?,
        Stage::All => unreachable!("expanded by run_stage"),
    }
    info!(
        "Stage completed - stage={}, duration={:.2}s",
        stage.as_str(),
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

async fn run_collect(ctx: &PipelineCtx) -> Result<()> {
    let reviews = collect_reviews(&ctx.client, &ctx.cfg.scrape).await?;
    if reviews.is_empty() {
        error!("No reviews collected - url={:?}", ctx.cfg.scrape.product_url);
        bail!("No reviews collected; check scrape.product_url and that the page lists reviews.");
    }
    write_csv(&ctx.paths.raw_reviews, &reviews)?;
    println!("Scraped {} reviews. Saved to {}", reviews.len(), ctx.paths.raw_reviews.display());
    Ok(())
}

async fn run_preprocess(ctx: &PipelineCtx) -> Result<()> {
    let raws = read_raw_reviews(&ctx.paths.raw_reviews)?;
    if raws.is_empty() {
        warn!("Raw review file has no rows - path={}", ctx.paths.raw_reviews.display());
    }

    let detector = WhatlangDetector;
    let translator = translate::from_config(ctx.client.clone(), &ctx.cfg.translate);
    let cleaner = Cleaner::new(&detector, translator.as_ref(), ctx.cfg.clean.isolate_untranslated);
    let set = cleaner.clean_all(&raws).await;

    for f in set.report.failures.iter().take(5) {
        debug!("Translation failure - {}", f);
    }
    write_csv(&ctx.paths.cleaned_reviews, &set.records)?;
    if ctx.cfg.clean.isolate_untranslated {
        write_csv(&ctx.paths.untranslated_reviews, &set.untranslated)?;
    }

    println!(
        "Cleaned {} of {} reviews ({} translated, {} translation failures, {} duplicates dropped).",
        set.report.retained,
        set.report.total,
        set.report.translated,
        set.report.translation_failed,
        set.report.duplicates_dropped
    );
    println!("Saved to {}", ctx.paths.cleaned_reviews.display());
    Ok(())
}

fn load_cleaned(ctx: &PipelineCtx) -> Result<Corpus> {
    let corpus = load_corpus(&ctx.paths.cleaned_reviews)?;
    if corpus.is_empty() {
        bail!(
            "No cleaned reviews in {}; run the preprocess stage first.",
            ctx.paths.cleaned_reviews.display()
        );
    }
    debug!("Cleaned corpus ready - reviews={}, column={}", corpus.len(), corpus.column);
    Ok(corpus)
}

fn run_pos_ner(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let summary = summarize_corpus(&PosTagger::new(), &corpus.documents, 10);

    println!("\nTop 10 POS Tags:");
    for row in summary.counts.iter().take(10) {
        println!("{}: {}", row.tag, row.count);
    }
    println!("\nCommon adjectives describing product: {:?}", summary.adjectives);
    println!("Common verbs used: {:?}", summary.verbs);

    let entities = EntityRecognizer::new().entities_for_corpus(&corpus.documents, ctx.cfg.ner.sample);
    println!("\nSample Entities Found:");
    for e in entities.iter().take(15) {
        println!("{} ({})", e.entity, e.kind);
    }
    info!("Entities found - count={}, sample={}", entities.len(), ctx.cfg.ner.sample);

    write_csv(&ctx.paths.pos_counts, &summary.counts)?;
    write_csv(&ctx.paths.ner_entities, &entities)?;
    Ok(())
}

fn run_sentiment(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let rows: Vec<_> = corpus.documents.iter().map(|d| score_review(d)).collect();
    let dist: Vec<_> = distribution(&rows).into_iter().collect();
    for (label, n) in &dist {
        info!("Sentiment count - label={}, reviews={}", label.as_str(), n);
    }
    write_csv(&ctx.paths.sentiment_results, &rows)?;
    print!("{}", render_sentiment_distribution(&dist));
    println!("Saved to {}", ctx.paths.sentiment_results.display());
    Ok(())
}

fn run_similarity(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let (model, matrix) =
        TfidfVectorizer::new(ctx.cfg.vectorize.similarity_max_features).fit_transform(&corpus.documents)?;
    let space = WordSpace::new(&model, &matrix);
    let (rows, missing) = space.similarity_table(&ctx.cfg.similarity.target_words, ctx.cfg.similarity.top_n);
    for m in &missing {
        warn!("Target word not in vocabulary - target={}", m);
    }
    write_csv(&ctx.paths.word_similarity, &rows)?;

    for target in &ctx.cfg.similarity.target_words {
        let words: Vec<String> = rows
            .iter()
            .filter(|r| &r.target == target)
            .map(|r| format!("{} ({:.3})", r.similar_word, r.cosine_similarity))
            .collect();
        if !words.is_empty() {
            println!("{} -> {}", target, words.join(", "));
        }
    }
    Ok(())
}

fn write_topic_table(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_topics(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let (model, matrix) =
        TfidfVectorizer::new(ctx.cfg.vectorize.topics_max_features).fit_transform(&corpus.documents)?;
    let topics = extract_topics(&model, &matrix, ctx.cfg.topics.n_topics, ctx.cfg.topics.top_terms)?;
    let (header, rows) = topic_table(&topics);
    write_topic_table(&ctx.paths.lsa_topics, &header, &rows)?;
    print!("{}", render_topics_text(&topics));
    Ok(())
}

fn run_qa(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let engine = QaEngine::new(corpus.documents, ctx.cfg.vectorize.qa_max_features)?;
    let stdin = io::stdin();
    let answered = engine.run_loop(stdin.lock(), io::stdout(), ctx.cfg.qa.top_n)?;
    info!("QA session ended - questions={}", answered);
    Ok(())
}

fn run_summarize(ctx: &PipelineCtx) -> Result<()> {
    let corpus = load_cleaned(ctx)?;
    let (_, matrix) =
        TfidfVectorizer::new(ctx.cfg.vectorize.cluster_max_features).fit_transform(&corpus.documents)?;
    let params = ClusterParams {
        n_clusters: ctx.cfg.cluster.n_clusters,
        seed: ctx.cfg.cluster.seed,
        n_runs: ctx.cfg.cluster.n_runs,
        max_iterations: ctx.cfg.cluster.max_iterations,
    };
    let assignment = cluster_reviews(&matrix, &params)?;
    for p in 0..assignment.n_partitions() {
        debug!("Partition - index={}, members={}", p, assignment.members(p).len());
    }

    let summaries: Vec<String> = assignment
        .representatives
        .iter()
        .flatten()
        .map(|&i| corpus.documents[i].clone())
        .collect();
    let rows: Vec<SummaryRow> = summaries
        .iter()
        .map(|s| SummaryRow {
            representative_review: s.clone(),
        })
        .collect();
    write_csv(&ctx.paths.summary_reviews, &rows)?;

    println!("\nReview summarization complete!");
    println!("Saved representative reviews to: {}", ctx.paths.summary_reviews.display());
    print!("{}", render_summaries_text(&summaries));
    Ok(())
}

fn run_dashboard(ctx: &PipelineCtx) -> Result<()> {
    let out_dir = &ctx.paths.results_dir;
    let mut dashboard = write_all_viz(&ctx.paths, out_dir)?;
    let report_path = out_dir.join("report.md");
    std::fs::write(&report_path, render_report_markdown(&dashboard))
        .with_context(|| format!("write {}", report_path.display()))?;
    dashboard.files.push("report.md".to_string());

    println!("\nVisualizations saved in '{}':", out_dir.display());
    for f in &dashboard.files {
        println!("  - {}", f);
    }
    io::stdout().flush()?;
    Ok(())
}
