// src/main.rs
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sign_tutor::cli::{Cli, Commands};
use sign_tutor::export::{AttemptExporter, ProgressStore};
use sign_tutor::feedback::FeedbackLevel;
use sign_tutor::labels;
use sign_tutor::progress::ProgressAggregator;
use sign_tutor::worker::InferenceWorker;
use sign_tutor::{ClassificationDispatcher, DetectorFrame, FrameOutcome, PipelineConfig, TrackingSession};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let store = cli
        .progress
        .as_ref()
        .map(ProgressStore::new)
        .unwrap_or_else(ProgressStore::default_location);

    match cli.command {
        Commands::Replay {
            input,
            target,
            export,
            name,
        } => {
            run_replay(&input, target.as_deref(), export, name, config, &store).await?;
        }
        Commands::Summary => {
            run_summary(&store, config.accuracy_window)?;
        }
    }

    Ok(())
}

fn read_frames(path: &Path) -> Result<Vec<DetectorFrame>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid detector frame", path.display(), i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

async fn run_replay(
    input: &Path,
    target: Option<&str>,
    export: Option<PathBuf>,
    session_name: Option<String>,
    config: PipelineConfig,
    store: &ProgressStore,
) -> Result<()> {
    if let Some(target) = target {
        if labels::index_of(target).is_none() {
            bail!("Unknown sign '{}'", target);
        }
    }

    let frames = read_frames(input)?;
    info!("Loaded {} frames from {}", frames.len(), input.display());

    let mut progress = ProgressAggregator::with_window(config.accuracy_window);
    if let Some(snapshot) = store.load()? {
        progress.restore(snapshot);
    }
    let first_attempt = progress.practice_attempts().len();

    let mut dispatcher = ClassificationDispatcher::fallback();
    dispatcher.warm_up();
    let session = TrackingSession::new(config, dispatcher);
    let mut handle = InferenceWorker::spawn(session);

    progress.start_session();
    for frame in frames {
        // one frame at a time so a recording is never thinned out
        if !handle.submit(frame) {
            warn!("Worker rejected a frame");
            continue;
        }
        let Some(outcome) = handle.next().await else {
            break;
        };
        print_outcome(&outcome);

        if let Some(target) = target {
            if !outcome.prediction.prediction.is_sentinel() {
                progress.record_attempt(&outcome.prediction, target);
            }
        }
    }
    progress.end_session();
    handle.shutdown().await;

    store.save(&progress.snapshot())?;

    if let Some(dir) = export {
        let exporter = AttemptExporter::new(dir, session_name);
        let csv = exporter.export_csv(&progress.practice_attempts()[first_attempt..])?;
        let report = exporter.generate_report(&progress.snapshot())?;
        info!("Exported {} and {}", csv.display(), report.display());
    }

    Ok(())
}

fn print_outcome(outcome: &FrameOutcome) {
    let prediction = &outcome.prediction;
    let message = if prediction.prediction.is_no_hand() {
        "No hand detected"
    } else if prediction.prediction.is_error() {
        "Recognition error"
    } else {
        FeedbackLevel::from_confidence(prediction.confidence()).message()
    };

    println!(
        "{:>8.3}s  {:<10} {:>5.1}%  {}",
        outcome.timestamp,
        prediction.class(),
        prediction.confidence() * 100.0,
        message
    );
    for hint in prediction.corrections() {
        println!("           - {}", hint);
    }
}

fn run_summary(store: &ProgressStore, accuracy_window: usize) -> Result<()> {
    let Some(snapshot) = store.load()? else {
        println!("No progress recorded yet ({})", store.path().display());
        return Ok(());
    };

    let mut progress = ProgressAggregator::with_window(accuracy_window);
    progress.restore(snapshot);

    println!("Overall accuracy: {:.0}%", progress.overall_accuracy() * 100.0);
    println!("Practice time:    {} min", progress.practice_minutes());
    println!("Tests taken:      {}", progress.test_results().len());

    let learned: Vec<&str> = progress.signs_learned().iter().map(String::as_str).collect();
    if learned.is_empty() {
        println!("Signs learned:    none yet");
    } else {
        println!("Signs learned:    {}", learned.join(", "));
    }

    for (sign, accuracy) in &progress.accuracy().by_sign {
        println!("  {:<10} {:>5.0}%", sign, accuracy * 100.0);
    }

    let weekly = progress.weekly_progress(Utc::now());
    println!(
        "This week: {} attempts, {} correct, {} signs, avg confidence {:.2}",
        weekly.total_attempts, weekly.correct_attempts, weekly.unique_signs, weekly.average_confidence
    );

    Ok(())
}
