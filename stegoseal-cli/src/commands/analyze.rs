//! Analyze command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use stegoseal_core::analyze;
use tracing::info;

use crate::config::CliConfig;
use crate::utils::{load_corpus, read_file, Output};

/// Execute the analyze command.
///
/// The report is always JSON; `--json` is implied.
pub fn execute(
    file: PathBuf,
    corpus: Option<PathBuf>,
    max_distance: Option<u32>,
    config: &CliConfig,
    out: Output,
) -> Result<()> {
    let entries = match config.corpus_path(corpus) {
        Some(path) => load_corpus(&path)?,
        None => Vec::new(),
    };
    let data = read_file(&file)?;

    let report = analyze(&data, &entries, &config.similarity(max_distance, None))
        .with_context(|| format!("Failed to decode image: {}", file.display()))?;

    info!(
        digest = %report.content_digest,
        verdict = ?report.verification.verdict(),
        similar = report.similar.len(),
        "Analysis complete"
    );

    out.emit_json(&json!({
        "file": file.display().to_string(),
        "analyzed_at": Utc::now().to_rfc3339(),
        "verdict": report.verification.verdict(),
        "report": report,
    }))
}
