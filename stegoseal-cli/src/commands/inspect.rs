//! Inspect command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{parse_combined, SignatureProtocol};
use tracing::info;

use crate::utils::{load_image, Output};

/// Execute the inspect command.
pub fn execute(file: PathBuf, out: Output) -> Result<()> {
    let (_, pixels) = load_image(&file)?;
    let detection = SignatureProtocol::new().inspect(&pixels);

    info!(detected = detection.detected, "Inspected image");

    if out.json {
        return out.emit_json(&json!({
            "file": file.display().to_string(),
            "detected": detection.detected,
            "raw_signature": detection.raw_signature,
        }));
    }

    if !out.human() {
        return Ok(());
    }

    println!();
    match detection.raw_signature.as_deref() {
        Some(raw) => {
            let (user, context) = parse_combined(raw);
            println!("{}", "Signature found".green().bold());
            println!();
            println!("   {} {}", "Raw:".dimmed(), raw);
            if !user.is_empty() {
                println!("   {} {}", "User:".dimmed(), user);
            }
            if context.is_empty() {
                println!("   {} {}", "Context:".dimmed(), "none".yellow());
            } else {
                println!("   {} {}", "Context:".dimmed(), context);
            }
        }
        None => {
            println!("{}", "No embedded signature".yellow().bold());
        }
    }

    Ok(())
}
