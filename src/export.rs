// src/export.rs - Progress persistence and session export
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::progress::{AttemptRecord, ProgressSnapshot};

const PROGRESS_FILE: &str = "progress.json";

/// JSON file holding a `ProgressSnapshot` between runs.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<data dir>/SignTutor/progress.json`, or `./progress/progress.json`
    /// when the platform has no data directory.
    pub fn default_location() -> Self {
        let dir = directories::ProjectDirs::from("com", "signtutor", "SignTutor")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./progress"));
        Self::new(dir.join(PROGRESS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<ProgressSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read progress from {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt progress file {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write progress to {}", self.path.display()))?;
        info!("Progress saved to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AttemptRow<'a> {
    timestamp: String,
    target_class: &'a str,
    predicted_class: &'a str,
    confidence: f64,
    is_correct: bool,
}

/// Writes a practice session's attempts as CSV plus an HTML summary.
pub struct AttemptExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl AttemptExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export_csv(&self, attempts: &[AttemptRecord]) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("attempts.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);
        for attempt in attempts {
            writer.serialize(AttemptRow {
                timestamp: attempt.timestamp.to_rfc3339(),
                target_class: &attempt.target_class,
                predicted_class: &attempt.predicted_class,
                confidence: attempt.confidence,
                is_correct: attempt.is_correct,
            })?;
        }
        writer.flush()?;
        Ok(csv_path)
    }

    pub fn generate_report(&self, snapshot: &ProgressSnapshot) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&report_path, self.render_report(snapshot))?;
        Ok(report_path)
    }

    fn render_report(&self, snapshot: &ProgressSnapshot) -> String {
        if snapshot.practice_attempts.is_empty() {
            warn!("Generating report for a session without attempts");
        }

        let rows: String = snapshot
            .accuracy
            .by_sign
            .iter()
            .map(|(sign, acc)| {
                format!(
                    "        <tr><td>{}</td><td>{:.0}%</td><td>{}</td></tr>\n",
                    escape_html(sign),
                    acc * 100.0,
                    if snapshot.signs_learned.contains(sign) { "yes" } else { "" }
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Practice Report - {name}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #2563eb; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Practice Session Report</h1>
    <div class="stats">
        <h2>Session: {name}</h2>
        <p><span class="stat-label">Signs Learned:</span> <span class="stat-value">{learned}</span></p>
        <p><span class="stat-label">Overall Accuracy:</span> <span class="stat-value">{overall:.0}%</span></p>
        <p><span class="stat-label">Practice Time:</span> <span class="stat-value">{minutes} min</span></p>
        <p><span class="stat-label">Attempts:</span> <span class="stat-value">{attempts}</span></p>
    </div>
    <table>
        <tr><th>Sign</th><th>Accuracy</th><th>Learned</th></tr>
{rows}    </table>
</body>
</html>
"#,
            name = escape_html(&self.session_name),
            learned = snapshot.signs_learned.len(),
            overall = snapshot.accuracy.overall * 100.0,
            minutes = snapshot.practice_minutes,
            attempts = snapshot.practice_attempts.len(),
            rows = rows,
        )
    }
}

/// Labels in a stored snapshot are not trusted to be plain text.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{smoothed, ProgressAggregator};

    fn progress() -> ProgressAggregator {
        let mut progress = ProgressAggregator::new();
        progress.record_attempt(&smoothed("A", 0.9), "A");
        progress.record_attempt(&smoothed("B", 0.4), "A");
        progress.record_attempt(&smoothed("HELLO", 0.7), "HELLO");
        progress
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("nested").join("progress.json"));
        assert!(store.load().unwrap().is_none());

        let snapshot = progress().snapshot();
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.practice_attempts, snapshot.practice_attempts);
        assert_eq!(loaded.signs_learned, snapshot.signs_learned);
        assert!((loaded.accuracy.overall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_corrupt_store_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(ProgressStore::new(&path).load().is_err());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = AttemptExporter::new(dir.path(), Some("unit".to_string()));
        let progress = progress();

        let path = exporter.export_csv(progress.practice_attempts()).unwrap();
        assert_eq!(path, dir.path().join("unit").join("attempts.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["timestamp", "target_class", "predicted_class", "confidence", "is_correct"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][2], "B");
        assert_eq!(&rows[1][4], "false");
    }

    #[test]
    fn test_report_lists_signs() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = AttemptExporter::new(dir.path(), Some("unit".to_string()));
        let path = exporter.generate_report(&progress().snapshot()).unwrap();

        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Session: unit"));
        assert!(html.contains("<td>A</td><td>50%</td><td>yes</td>"));
        assert!(html.contains("<td>HELLO</td><td>100%</td><td></td>"));
    }

    #[test]
    fn test_report_escapes_stored_labels() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = AttemptExporter::new(dir.path(), Some("a&b".to_string()));
        let mut snapshot = progress().snapshot();
        snapshot
            .accuracy
            .by_sign
            .insert("<script>alert(1)</script>".to_string(), 1.0);

        let html = exporter.render_report(&snapshot);
        assert!(!html.contains("<script>"));
        assert!(html.contains("<td>&lt;script&gt;alert(1)&lt;/script&gt;</td>"));
        assert!(html.contains("Session: a&amp;b"));
    }

    #[test]
    fn test_default_session_name() {
        let exporter = AttemptExporter::new("/tmp", None);
        let name = exporter.session_dir();
        assert!(name.to_string_lossy().contains("session_"));
    }
}
