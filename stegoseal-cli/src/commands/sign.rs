//! Sign command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use stegoseal_core::{image_io, BitCodec, SignatureProtocol};
use tracing::{debug, info};

use crate::utils::{build_signed_path, load_image, Output};

/// Execute the sign command.
pub fn execute(
    file: PathBuf,
    signature: Option<String>,
    output: Option<PathBuf>,
    out: Output,
) -> Result<()> {
    let (_, pixels) = load_image(&file)?;

    debug!(
        capacity_bytes = BitCodec::max_payload_bytes(&pixels),
        "Payload capacity"
    );

    let signed = SignatureProtocol::new()
        .sign(&pixels, signature.as_deref())
        .with_context(|| format!("Failed to sign {}", file.display()))?;

    let output_path = output.unwrap_or_else(|| build_signed_path(&file));
    image_io::save_png(&signed.pixels, &output_path)
        .with_context(|| format!("Failed to write signed image: {}", output_path.display()))?;

    info!(path = %output_path.display(), "Signed image saved");

    if out.json {
        return out.emit_json(&json!({
            "file": file.display().to_string(),
            "output": output_path.display().to_string(),
            "context_signature": signed.context_signature,
            "combined_signature": signed.combined_signature,
        }));
    }

    if out.human() {
        println!();
        println!("{}", "Image signed".green().bold());
        println!();
        println!("   {} {}", "Saved to:".dimmed(), output_path.display());
        println!("   {} {}", "Context:".dimmed(), signed.context_signature);
        println!("   {} {}", "Embedded:".dimmed(), signed.combined_signature);
        println!(
            "   {} {} of {} bits",
            "Carrier use:".dimmed(),
            BitCodec::required_bits(signed.combined_signature.len()),
            BitCodec::capacity_bits(&signed.pixels)
        );
    }

    Ok(())
}
