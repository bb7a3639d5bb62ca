//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use stegoseal_core::{image_io, CorpusEntry, PixelBuffer};
use tracing::{debug, info};

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub quiet: bool,
    pub json: bool,
}

impl Output {
    /// Whether to print the colored, human-readable report.
    pub fn human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Print `value` as pretty JSON unless quiet.
    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        if !self.quiet {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{}", json);
        }
        Ok(())
    }
}

/// Build the signed output path from the original file path.
///
/// Transforms `dir/photo.jpg` into `dir/photo.signed.png`. The output is
/// always PNG because lossy formats destroy the embedded signature.
pub fn build_signed_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    file.with_file_name(format!("{}.signed.png", stem))
}

/// Read a file into memory.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    info!(path = %path.display(), bytes = data.len(), "Read file");
    Ok(data)
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> Result<(Vec<u8>, PixelBuffer)> {
    let data = read_file(path)?;
    let pixels = image_io::decode_bytes(&data)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    debug!(
        width = pixels.width(),
        height = pixels.height(),
        layout = ?pixels.layout(),
        "Decoded image"
    );
    Ok((data, pixels))
}

/// Load a corpus file (a JSON array of entries).
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusEntry>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let corpus: Vec<CorpusEntry> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to read corpus file: {} is not valid", path.display()))?;
    debug!(path = %path.display(), entries = corpus.len(), "Loaded corpus");
    Ok(corpus)
}

/// Load a corpus file, or start an empty corpus if it does not exist yet.
pub fn load_corpus_or_empty(path: &Path) -> Result<Vec<CorpusEntry>> {
    if path.exists() {
        load_corpus(path)
    } else {
        Ok(Vec::new())
    }
}

/// Write a corpus file as pretty JSON.
pub fn save_corpus(path: &Path, corpus: &[CorpusEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(corpus).context("Failed to serialize corpus")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write corpus file: {}", path.display()))?;
    info!(path = %path.display(), entries = corpus.len(), "Saved corpus");
    Ok(())
}

/// Corpus id for a file: its file name.
pub fn entry_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
