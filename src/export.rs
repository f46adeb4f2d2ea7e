use crate::models::HistoryEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

/// `conversation_history_<ISO timestamp, colons as dashes>.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("conversation_history_{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// What happened to an export once the backend replied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing stored, so no file was written
    Empty,
    Written { path: PathBuf, entries: usize },
    WriteFailed(String),
}

/// Export `history` into `dir` unless it is empty
pub async fn export_entries(dir: &Path, history: &[HistoryEntry]) -> ExportOutcome {
    if history.is_empty() {
        return ExportOutcome::Empty;
    }
    match write_export(dir, history, Utc::now()).await {
        Ok(path) => ExportOutcome::Written {
            path,
            entries: history.len(),
        },
        Err(err) => ExportOutcome::WriteFailed(format!("{:#}", err)),
    }
}

/// Write `history` as pretty JSON into `dir`, returning the file written
pub async fn write_export(dir: &Path, history: &[HistoryEntry], now: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_file_name(now));
    let content = serde_json::to_string_pretty(history).context("Failed to serialize history")?;
    fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
