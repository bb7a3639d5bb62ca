//! Similar command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{find_similar, fingerprint};
use tracing::info;

use crate::config::CliConfig;
use crate::utils::{load_corpus, load_image, Output};

/// Execute the similar command.
pub fn execute(
    file: PathBuf,
    corpus: Option<PathBuf>,
    max_distance: Option<u32>,
    limit: Option<usize>,
    config: &CliConfig,
    out: Output,
) -> Result<()> {
    let Some(corpus_path) = config.corpus_path(corpus) else {
        bail!("No corpus given: pass --corpus or set STEGOSEAL_CORPUS");
    };

    let entries = load_corpus(&corpus_path)?;
    let (_, pixels) = load_image(&file)?;
    let candidate = fingerprint(&pixels).context("Failed to fingerprint image")?;

    let similarity = config.similarity(max_distance, limit);
    let matches = find_similar(&candidate, &entries, &similarity);

    info!(
        corpus = entries.len(),
        matches = matches.len(),
        threshold = similarity.max_hamming_distance,
        "Similarity search complete"
    );

    if out.json {
        return out.emit_json(&json!({
            "file": file.display().to_string(),
            "max_hamming_distance": similarity.max_hamming_distance,
            "matches": matches,
        }));
    }

    if out.human() {
        println!();
        if matches.is_empty() {
            println!(
                "{} (searched {} entries, threshold {})",
                "No similar images".yellow().bold(),
                entries.len(),
                similarity.max_hamming_distance
            );
            return Ok(());
        }

        println!(
            "{}",
            format!("{} similar image(s)", matches.len()).green().bold()
        );
        println!();
        for m in &matches {
            let per_algorithm: Vec<String> = m
                .distances
                .iter()
                .map(|(alg, d)| format!("{}={}", alg, d))
                .collect();
            println!(
                "   {:<32} {} {:>5.1}  {}",
                m.id,
                "distance".dimmed(),
                m.distance,
                per_algorithm.join(" ").dimmed()
            );
        }
    }

    Ok(())
}
