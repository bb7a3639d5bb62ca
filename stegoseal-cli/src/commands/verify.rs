//! Verify command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{
    find_similar, fingerprint, SignatureProtocol, SimilarityMatch, Verdict, VerificationResult,
};
use tracing::{error, info, warn};

use crate::config::CliConfig;
use crate::utils::{load_corpus, load_image, Output};

/// Execute the verify command.
pub fn execute(
    file: PathBuf,
    corpus: Option<PathBuf>,
    config: &CliConfig,
    out: Output,
) -> Result<()> {
    let (_, pixels) = load_image(&file)?;

    let result = SignatureProtocol::new()
        .verify(&pixels)
        .context("Failed to compute context signature")?;
    let verdict = result.verdict();

    // Optional provenance lookup: which stored images does this resemble?
    let similar = match config.corpus_path(corpus) {
        Some(path) => {
            let entries = load_corpus(&path)?;
            let candidate = fingerprint(&pixels).context("Failed to fingerprint image")?;
            find_similar(&candidate, &entries, &config.similarity(None, None))
        }
        None => Vec::new(),
    };

    match verdict {
        Verdict::Authentic => info!(user = %result.user_signature, "Verification successful"),
        Verdict::Tampered => error!(
            embedded = %result.embedded_context_signature,
            current = %result.current_context_signature,
            "Image has been modified since signing"
        ),
        Verdict::Unsigned => warn!("No embedded signature"),
        Verdict::Unanchored => warn!("Embedded payload carries no context signature"),
    }

    if out.json {
        out.emit_json(&json!({
            "file": file.display().to_string(),
            "verdict": verdict,
            "verification": result,
            "similar": similar,
        }))?;
    } else if out.human() {
        print_report(verdict, &result, &similar);
    }

    if verdict == Verdict::Tampered {
        bail!("Verification failed: image has been modified since signing");
    }
    Ok(())
}

fn print_report(verdict: Verdict, result: &VerificationResult, similar: &[SimilarityMatch]) {
    println!();
    match verdict {
        Verdict::Authentic => {
            println!("{}", "╔════════════════════════════════════════╗".green());
            println!(
                "{}",
                "║              AUTHENTIC                 ║".green().bold()
            );
            println!("{}", "╚════════════════════════════════════════╝".green());
            println!();
            println!("   {} {}", "Content:".dimmed(), "Matches signature".green());
        }
        Verdict::Tampered => {
            println!("{}", "╔════════════════════════════════════════╗".red());
            println!(
                "{}",
                "║              TAMPERED                  ║".red().bold()
            );
            println!("{}", "╚════════════════════════════════════════╝".red());
            println!();
            println!(
                "   {} {}",
                "Content:".dimmed(),
                "MODIFIED since signing".red()
            );
        }
        Verdict::Unsigned => {
            println!("{}", "UNSIGNED".yellow().bold());
            println!();
            println!("   {} No embedded signature found", "Content:".dimmed());
        }
        Verdict::Unanchored => {
            println!("{}", "UNVERIFIABLE".yellow().bold());
            println!();
            println!(
                "   {} Payload present but carries no context signature",
                "Content:".dimmed()
            );
        }
    }

    if !result.user_signature.is_empty() {
        println!("   {} {}", "Signed by:".dimmed(), result.user_signature);
    }
    if result.detected {
        println!(
            "   {} {}",
            "Embedded:".dimmed(),
            display_or_none(&result.embedded_context_signature)
        );
    }
    println!(
        "   {} {}",
        "Current:".dimmed(),
        result.current_context_signature
    );

    if !similar.is_empty() {
        println!();
        println!("   {}", "Similar images:".dimmed());
        for m in similar {
            println!("     {} (distance {:.1})", m.id, m.distance);
        }
    }
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "none"
    } else {
        value
    }
}
