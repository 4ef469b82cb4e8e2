mod api_types;
mod clean;
mod cluster;
mod config;
mod corpus;
mod error;
mod fetch;
mod lemmatize;
mod models;
mod orchestrator;
mod pos;
mod qa;
mod render;
mod sentiment;
mod similarity;
mod stopwords;
mod topics;
mod translate;
mod vectorize;
mod viz_export;

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

use config::{AppConfig, PipelinePaths};
use orchestrator::{menu_choice, run_stage, PipelineCtx, Stage, MENU};

/// Review Pulse - product review analytics pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (overrides REVIEW_PULSE_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding raw/ and processed/ datasets (default: "data")
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Output directory for charts data and the report (default: "results")
    #[arg(short, long, default_value = "results")]
    results_dir: String,

    /// Stage to run; omit for the interactive menu
    #[arg(short, long, value_enum)]
    stage: Option<Stage>,

    /// Product review listing URL for the collect stage (overrides scrape.product_url)
    #[arg(long)]
    url: Option<String>,

    /// Number of reviews to collect (overrides scrape.target_count)
    #[arg(long)]
    target: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting review_pulse");

    let args = Args::parse();
    let data_dir = PathBuf::from(&args.data_dir);
    let results_dir = PathBuf::from(&args.results_dir);

    let mut cfg = AppConfig::resolve(args.config.as_deref(), &data_dir)?;
    if let Some(url) = args.url {
        debug!("Product URL from --url: {}", url);
        cfg.scrape.product_url = Some(url);
    }
    if let Some(target) = args.target {
        cfg.scrape.target_count = target;
    }

    let paths = PipelinePaths::new(&data_dir, &results_dir);
    info!(
        "Paths - data_dir={}, results_dir={}",
        data_dir.display(),
        results_dir.display()
    );
    let ctx = PipelineCtx::new(cfg, paths)?;

    if let Some(stage) = args.stage {
        return run_stage(&ctx, stage).await;
    }

    // Interactive menu until 0 or an unknown choice
    let stdin = io::stdin();
    loop {
        print!("{}", MENU);
        print!("\nEnter your choice: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match menu_choice(&line) {
            Some(stage) => {
                if let Err(e) = run_stage(&ctx, stage).await {
                    error!("Stage failed - stage={}, error={:#}", stage.as_str(), e);
                }
            }
            None => {
                println!("Exiting...");
                break;
            }
        }
    }
    Ok(())
}
