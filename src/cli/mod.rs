//! Churn Service CLI Module
//!
//! Command-line interface for serving the API, retraining and batch
//! prediction against the same artifact the server uses.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::artifact::ArtifactStore;
use crate::inference::InferenceEngine;
use crate::preprocessing::MissingFeaturePolicy;
use crate::server::ServerConfig;
use crate::training::{Metric, ModelKind, TrainEngine, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer churn prediction service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (defaults to API_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
    },

    /// Retrain on labeled data, store the artifact and print metrics
    Evaluate {
        /// Model name: "Logistic Regression", "Random Forest" or "XGBoost"
        #[arg(short, long)]
        model: String,

        /// Metric to highlight: Accuracy, Precision or Recall
        #[arg(long, default_value = "Accuracy")]
        metric: String,

        /// Labeled training CSV (defaults to TRAINING_DATA)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact file to write (defaults to MODEL_PATH)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Held-out fraction of the resampled table
        #[arg(long, default_value = "0.3")]
        test_size: f64,

        /// Seed for SMOTE and the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Predict churn for every row of a CSV file
    Predict {
        /// Input CSV with one customer per row
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact file to read (defaults to MODEL_PATH)
        #[arg(short, long)]
        model_path: Option<PathBuf>,

        /// Fail when a required feature column is missing
        #[arg(long)]
        strict: bool,
    },

    /// Show the stored artifact's metadata
    Info {
        /// Artifact file to read (defaults to MODEL_PATH)
        #[arg(short, long)]
        model_path: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_evaluate(
    model_name: &str,
    metric_name: &str,
    data_path: Option<&Path>,
    output: Option<&Path>,
    test_size: f64,
    seed: u64,
) -> anyhow::Result<()> {
    section("Evaluate");

    let kind = ModelKind::from_name(model_name).ok_or_else(|| {
        anyhow::anyhow!("Invalid model: {} (expected one of {})", model_name, ModelKind::NAMES.join(", "))
    })?;

    let defaults = ServerConfig::default();
    let data_path = data_path.map(Path::to_path_buf).unwrap_or(defaults.training_data);
    let store = ArtifactStore::new(output.map(Path::to_path_buf).unwrap_or(defaults.model_path));

    step_run(&format!("Training {}", kind.name().cyan()));
    let start = Instant::now();
    let config = TrainingConfig::new(data_path)
        .with_test_size(test_size)
        .with_random_seed(seed);
    let report = TrainEngine::new(config).run(&kind, &store)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    println!("  {:<16} {}", muted("Rows"), report.n_raw_samples.to_string().white());
    println!("  {:<16} {}", muted("Synthetic"), report.n_synthetic.to_string().white());
    println!("  {:<16} {} / {}", muted("Train / test"), report.n_train, report.n_test);
    println!();

    for metric in [Metric::Accuracy, Metric::Precision, Metric::Recall] {
        let score = format!("{:.4}", report.metric(metric));
        let score = if metric.name() == metric_name { score.white().bold() } else { score.white() };
        println!("  {:<16} {}", muted(metric.name()), score);
    }
    if Metric::from_name(metric_name).is_none() {
        println!("  {}", format!("Metric not found: {}", metric_name).yellow());
    }
    println!("  {:<16} {}", muted("Saved to"), store.path().display());
    println!();

    Ok(())
}

pub fn cmd_predict(data_path: &Path, model_path: Option<&Path>, strict: bool) -> anyhow::Result<()> {
    section("Predict");

    let model_path = model_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ServerConfig::default().model_path);
    let engine = InferenceEngine::new(Arc::new(ArtifactStore::new(model_path)));

    step_run(&format!("Scoring {}", data_path.display()));
    let start = Instant::now();
    let predictions = engine.predict_csv(data_path, MissingFeaturePolicy::from_strict_flag(strict))?;
    step_done(&format!("{} rows in {:.2?}", predictions.len(), start.elapsed()));

    println!();
    for (row, churn) in predictions.iter().enumerate() {
        let label = if *churn { "churn".red() } else { "stay".green() };
        println!("  {:>6}  {}", muted(&row.to_string()), label);
    }
    let churners = predictions.iter().filter(|p| **p).count();
    println!();
    println!("  {:<16} {} / {}", muted("Churners"), churners, predictions.len());
    println!();

    Ok(())
}

pub fn cmd_info(model_path: Option<&Path>) -> anyhow::Result<()> {
    section("Model");

    let model_path = model_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ServerConfig::default().model_path);
    let engine = InferenceEngine::new(Arc::new(ArtifactStore::new(model_path.clone())));
    let metadata = engine.artifact()?.metadata();

    println!("  {:<12} {}", muted("File"), model_path.display());
    println!("  {:<12} {}", muted("Model"), metadata.model);
    println!("  {:<12} {}", muted("Trained"), metadata.created_at.to_rfc3339());
    println!("  {:<12} {}", muted("Format"), metadata.format_version);
    println!("  {:<12} {:.4}", muted("Accuracy"), metadata.metrics.accuracy);
    println!("  {:<12} {:.4}", muted("Precision"), metadata.metrics.precision);
    println!("  {:<12} {:.4}", muted("Recall"), metadata.metrics.recall);
    println!();
    println!("  {}", muted("Features"));
    for feature in &metadata.features {
        println!("    {}", feature);
    }
    println!();

    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::run_server;

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host.clone()),
        port: port.unwrap_or(defaults.port),
        ..defaults
    };
    let base = format!("http://{}:{}", config.host, config.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Churn Service".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &base));
    line_box(&kv("Prefix ", &format!("{}/churn", base)));
    line_box(&kv("Health ", &format!("{}/health", base)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
