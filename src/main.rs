//! shelfwatch entrypoint: one batch command per run against the local sales database.
//! Report lines go to stdout as ndjson; logs go to stderr.

use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use shelfwatch::{
    config::AppConfig,
    generator::RetailDataGenerator,
    loader,
    logging::{ReportLine, StructuredLogger},
    model::FittedDetector,
    pipeline::AnalysisPipeline,
    risk::Recommendation,
    storage::{SalesFilter, SalesStore},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "shelfwatch", version, about = "Retail demand anomalies and waste risk")]
struct Cli {
    /// Config file (JSON); falls back to $SHELFWATCH_CONFIG, then config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct Range {
    #[arg(long)]
    store: Option<u32>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl From<Range> for SalesFilter {
    fn from(r: Range) -> Self {
        SalesFilter {
            start: r.start,
            end: r.end,
            store_id: r.store,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate synthetic sales, store them, and retrain
    Generate {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        stores: Option<u32>,
    },
    /// Import sales rows from a CSV file
    Import { path: PathBuf },
    /// Fit the anomaly model on stored sales and save it
    Train,
    /// Flag anomalous sales
    Detect {
        #[command(flatten)]
        range: Range,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Score waste risk and recommend markdowns
    WasteRisk {
        #[command(flatten)]
        range: Range,
        /// Only report results at or above this tier
        #[arg(long, default_value = "markdown")]
        min_tier: String,
    },
    /// Report whether a trained model is available
    Health,
    /// Delete sales and predictions older than N days
    Prune {
        #[arg(long)]
        keep_days: i64,
    },
}

fn parse_tier(s: &str) -> Result<Recommendation, BoxError> {
    match s {
        "none" => Ok(Recommendation::None),
        "monitor" => Ok(Recommendation::Monitor),
        "markdown" => Ok(Recommendation::Markdown),
        "urgent" => Ok(Recommendation::Urgent),
        other => Err(format!("unknown tier '{}'", other).into()),
    }
}

fn train_and_save(
    pipeline: &AnalysisPipeline,
    store: &SalesStore,
    config: &AppConfig,
) -> Result<(), BoxError> {
    let sales = store.sales(&SalesFilter::default())?;
    let model = pipeline.train(&sales)?;
    model.save(&config.model_path())?;
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("SHELFWATCH_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = AppConfig::try_load(&config_path)?;

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(data_dir = ?config.data_dir, config = %config_path.display(), "shelfwatch starting");

    let store = Arc::new(SalesStore::open(&config.db_path())?);
    let mut pipeline = AnalysisPipeline::new(&config)?.with_store(Arc::clone(&store));
    match FittedDetector::load(&config.model_path()) {
        Ok(Some(model)) => pipeline = pipeline.with_model(model),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "saved model unreadable; retrain required"),
    }

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Generate { days, stores } => {
            let days = days.unwrap_or(config.generator.days);
            let stores = stores.unwrap_or(config.generator.stores);
            let start = Utc::now().date_naive() - Duration::days(days as i64);
            let rows = RetailDataGenerator::from_config(&config.generator).generate(start, days, stores);
            store.insert_sales(&rows)?;
            train_and_save(&pipeline, &store, &config)?;
            StructuredLogger::emit_json(
                &ReportLine::new("generated", &serde_json::json!({ "records": rows.len() })),
                &mut out,
            );
        }
        Command::Import { path } => {
            let rows = loader::load_sales_file(&path)?;
            let n = store.insert_sales(&rows)?;
            StructuredLogger::emit_json(&ReportLine::new("imported", &serde_json::json!({ "records": n })), &mut out);
        }
        Command::Train => {
            train_and_save(&pipeline, &store, &config)?;
            StructuredLogger::emit_json(&ReportLine::new("health", &pipeline.health()), &mut out);
        }
        Command::Detect { range, top } => {
            // Rows before --start only warm the rolling windows; they are not reported.
            let history = match range.start {
                Some(start) => store.history_before(start, pipeline.window() - 1, range.store)?,
                None => Vec::new(),
            };
            let sales = store.sales(&range.into())?;
            let mut reports: Vec<_> = pipeline
                .detect_with_history(&history, &sales)?
                .into_iter()
                .filter(|r| r.result.is_anomaly)
                .collect();
            reports.sort_by(|a, b| a.result.anomaly_score.total_cmp(&b.result.anomaly_score));
            for r in reports.iter().take(top) {
                StructuredLogger::emit_json(&ReportLine::new("anomaly", r), &mut out);
            }
        }
        Command::WasteRisk { range, min_tier } => {
            let min_tier = parse_tier(&min_tier)?;
            let sales = store.sales(&range.into())?;
            let mut results: Vec<_> = pipeline
                .waste_risk(&sales)?
                .into_iter()
                .filter(|r| r.recommendation >= min_tier)
                .collect();
            results.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
            for r in &results {
                StructuredLogger::emit_json(&ReportLine::new("waste_risk", r), &mut out);
            }
        }
        Command::Health => {
            StructuredLogger::emit_json(&ReportLine::new("health", &pipeline.health()), &mut out);
        }
        Command::Prune { keep_days } => {
            let cutoff = Utc::now().date_naive() - Duration::days(keep_days);
            let removed = store.prune_before(cutoff)?;
            StructuredLogger::emit_json(
                &ReportLine::new("pruned", &serde_json::json!({ "removed": removed, "before": cutoff })),
                &mut out,
            );
        }
    }

    info!("shelfwatch done");
    Ok(())
}
