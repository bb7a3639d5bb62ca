//! Index command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{fingerprint, CorpusEntry};
use tracing::{debug, info};

use crate::utils::{entry_id, load_corpus_or_empty, load_image, save_corpus, Output};

/// Execute the index command.
///
/// Entries are keyed by file name; indexing a file again replaces its
/// fingerprints in place.
pub fn execute(files: Vec<PathBuf>, corpus: PathBuf, out: Output) -> Result<()> {
    let mut entries = load_corpus_or_empty(&corpus)?;
    let mut added = 0usize;
    let mut updated = 0usize;

    for file in &files {
        let (_, pixels) = load_image(file)?;
        let fingerprints = fingerprint(&pixels)
            .with_context(|| format!("Failed to fingerprint {}", file.display()))?;
        let id = entry_id(file);

        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => {
                debug!(id = %id, "Replacing corpus entry");
                existing.fingerprints = fingerprints;
                updated += 1;
            }
            None => {
                debug!(id = %id, "Adding corpus entry");
                entries.push(CorpusEntry::new(id, fingerprints));
                added += 1;
            }
        }
    }

    save_corpus(&corpus, &entries)?;
    info!(added, updated, total = entries.len(), "Corpus updated");

    if out.json {
        return out.emit_json(&json!({
            "corpus": corpus.display().to_string(),
            "added": added,
            "updated": updated,
            "total": entries.len(),
        }));
    }

    if out.human() {
        println!();
        println!("{}", "Corpus updated".green().bold());
        println!();
        println!("   {} {}", "Corpus:".dimmed(), corpus.display());
        println!("   {} {}", "Added:".dimmed(), added);
        println!("   {} {}", "Updated:".dimmed(), updated);
        println!("   {} {}", "Total:".dimmed(), entries.len());
    }

    Ok(())
}
