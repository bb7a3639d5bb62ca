//! Hash command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{fingerprint, image_io, ContentDigest};
use tracing::debug;

use crate::utils::{load_image, Output};

/// Execute the hash command.
pub fn execute(file: PathBuf, out: Output) -> Result<()> {
    let (data, pixels) = load_image(&file)?;

    let digest = ContentDigest::from_bytes(&data);
    let metadata = image_io::describe(&data, &pixels)
        .with_context(|| format!("Failed to decode image: {}", file.display()))?;
    let fingerprints = fingerprint(&pixels).context("Failed to fingerprint image")?;

    debug!(digest = %digest, hashes = fingerprints.len(), "Computed fingerprints");

    if out.json {
        return out.emit_json(&json!({
            "file": file.display().to_string(),
            "content_digest": digest,
            "metadata": metadata,
            "fingerprints": fingerprints,
        }));
    }

    if out.human() {
        println!();
        println!(
            "   {} {}x{} {} {}",
            "Image:".dimmed(),
            metadata.width,
            metadata.height,
            metadata.mode,
            metadata.format
        );
        println!("   {} {}", "SHA3-256:".dimmed(), digest);
        for hash in fingerprints.iter() {
            println!(
                "   {} {}",
                format!("{}:", hash.algorithm).dimmed(),
                hash.to_hex()
            );
        }
    }

    Ok(())
}
