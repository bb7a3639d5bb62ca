//! CLI integration tests for stegoseal-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts.

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the stegoseal binary.
fn stegoseal() -> Command {
    let mut cmd = Command::cargo_bin("stegoseal").unwrap();
    cmd.env_remove("STEGOSEAL_CORPUS")
        .env_remove("STEGOSEAL_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Write a structured test photo and return its path.
fn write_photo(dir: &Path, name: &str, size: u32) -> PathBuf {
    let img = RgbImage::from_fn(size, size, |x, y| {
        let r = (x * 255 / size) as u8;
        let g = (y * 255 / size) as u8;
        let b = if (x / 16 + y / 16) % 2 == 0 { 180 } else { 60 };
        Rgb([r, g, b])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    stegoseal()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tamper-evident image signatures"))
        .stdout(predicate::str::contains("sign"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("similar"));
}

#[test]
fn test_version_displays_version() {
    stegoseal()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stegoseal"));
}

#[test]
fn test_help_shows_exit_codes() {
    stegoseal()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_sign_help_shows_options() {
    stegoseal()
        .args(["sign", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--signature"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    stegoseal().arg("stamp").assert().code(64);
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    stegoseal()
        .args(["sign", "nonexistent_file.png"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_non_image_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.png");
    fs::write(&file, b"not really a picture").unwrap();

    stegoseal()
        .args(["verify", path_str(&file)])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to decode image"));
}

#[test]
fn test_tiny_image_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "tiny.png", 4);

    // Exit code 65 = EX_DATAERR (payload does not fit)
    stegoseal()
        .args(["sign", path_str(&file)])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Insufficient capacity"));
}

#[test]
fn test_ambiguous_signature_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal()
        .args(["sign", "--signature", "alice||bob", path_str(&file)])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Invalid user signature"));

    assert!(!temp.path().join("photo.signed.png").exists());
}

#[test]
fn test_similar_without_corpus_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal()
        .args(["similar", path_str(&file)])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("No corpus given"));
}

// ============================================================================
// Sign and Verify Roundtrip Tests
// ============================================================================

#[test]
fn test_sign_creates_signed_png() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal()
        .args(["sign", path_str(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Image signed"))
        .stdout(predicate::str::contains("CV:"));

    let signed = temp.path().join("photo.signed.png");
    assert!(signed.exists(), "Signed image should exist after signing");
    assert!(image::open(&signed).is_ok());
}

#[test]
fn test_sign_verify_roundtrip_authentic() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);
    let signed = temp.path().join("out.png");

    stegoseal()
        .args([
            "sign",
            "--signature",
            "newsroom",
            "--output",
            path_str(&signed),
            path_str(&file),
        ])
        .assert()
        .success();

    stegoseal()
        .args(["verify", path_str(&signed)])
        .assert()
        .success()
        .stdout(predicate::str::contains("AUTHENTIC"))
        .stdout(predicate::str::contains("newsroom"));
}

#[test]
fn test_sign_verify_roundtrip_tampered() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal().args(["sign", path_str(&file)]).assert().success();

    let signed = temp.path().join("photo.signed.png");
    let mut img = image::open(&signed).unwrap().to_rgb8();
    for y in 50..54 {
        for x in 50..54 {
            img.put_pixel(x, y, Rgb([255, 0, 0]));
        }
    }
    img.save(&signed).unwrap();

    // Exit code 65 = EX_DATAERR (tampered)
    stegoseal()
        .args(["verify", path_str(&signed)])
        .assert()
        .code(65)
        .stdout(predicate::str::contains("TAMPERED"))
        .stderr(predicate::str::contains("has been modified"));
}

#[test]
fn test_verify_unsigned_image() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "plain.png", 64);

    stegoseal()
        .args(["verify", path_str(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("UNSIGNED"));
}

#[test]
fn test_inspect_shows_user_signature() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal()
        .args(["sign", "-s", "alice", path_str(&file)])
        .assert()
        .success();

    stegoseal()
        .args(["inspect", path_str(&temp.path().join("photo.signed.png"))])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signature found"))
        .stdout(predicate::str::contains("alice||CV:"));
}

#[test]
fn test_inspect_json_unsigned() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "plain.png", 32);

    let output = stegoseal()
        .args(["--json", "inspect", path_str(&file)])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["detected"], false);
    assert!(json["raw_signature"].is_null());
}

// ============================================================================
// Fingerprint and Corpus Tests
// ============================================================================

#[test]
fn test_hash_json_lists_every_algorithm() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    let output = stegoseal()
        .args(["hash", "--json", path_str(&file)])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["content_digest"].as_str().unwrap().len(), 64);
    assert_eq!(json["metadata"]["format"], "PNG");
    for algorithm in ["ahash", "dhash", "phash"] {
        assert_eq!(
            json["fingerprints"][algorithm].as_str().unwrap().len(),
            16,
            "missing {}",
            algorithm
        );
    }
}

#[test]
fn test_index_then_find_signed_copy() {
    let temp = TempDir::new().unwrap();
    let original = write_photo(temp.path(), "original.png", 96);
    let corpus = temp.path().join("corpus.json");

    stegoseal()
        .args(["index", "--corpus", path_str(&corpus), path_str(&original)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corpus updated"));

    stegoseal().args(["sign", path_str(&original)]).assert().success();
    let signed = temp.path().join("original.signed.png");

    let output = stegoseal()
        .args([
            "--json",
            "similar",
            "--corpus",
            path_str(&corpus),
            path_str(&signed),
        ])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let matches = json["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["id"], "original.png");
    assert_eq!(matches[0]["similar"], true);
}

#[test]
fn test_index_twice_replaces_entry() {
    let temp = TempDir::new().unwrap();
    let photo = write_photo(temp.path(), "photo.png", 48);
    let corpus = temp.path().join("corpus.json");

    for _ in 0..2 {
        stegoseal()
            .args(["--quiet", "index", "--corpus", path_str(&corpus), path_str(&photo)])
            .assert()
            .success();
    }

    let entries: serde_json::Value = serde_json::from_slice(&fs::read(&corpus).unwrap()).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[test]
fn test_corpus_from_environment() {
    let temp = TempDir::new().unwrap();
    let photo = write_photo(temp.path(), "photo.png", 48);
    let corpus = temp.path().join("corpus.json");

    stegoseal()
        .args(["--quiet", "index", "--corpus", path_str(&corpus), path_str(&photo)])
        .assert()
        .success();

    stegoseal()
        .env("STEGOSEAL_CORPUS", &corpus)
        .args(["similar", path_str(&photo)])
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.png"));
}

#[test]
fn test_analyze_reports_everything() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    stegoseal()
        .args(["sign", "-s", "desk", path_str(&file)])
        .assert()
        .success();

    let output = stegoseal()
        .args(["analyze", path_str(&temp.path().join("photo.signed.png"))])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["verdict"], "Authentic");
    assert_eq!(json["report"]["verification"]["user_signature"], "desk");
    assert_eq!(json["report"]["metadata"]["width"], 64);
    assert!(json["report"]["similar"].as_array().unwrap().is_empty());
    assert!(json["analyzed_at"].is_string());
}

// ============================================================================
// Quiet and Color Mode Tests
// ============================================================================

#[test]
fn test_quiet_mode_minimal_output() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    let output = stegoseal()
        .args(["--quiet", "sign", path_str(&file)])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    assert!(
        stdout.trim().is_empty(),
        "Quiet mode should have no stdout, got: {}",
        stdout
    );
}

#[test]
fn test_color_never_no_ansi() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 64);

    let output = stegoseal()
        .args(["--color=never", "-v", "sign", path_str(&file)])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr);

    // ANSI escape codes start with \x1b[
    assert!(
        !stdout.contains("\x1b["),
        "Color=never stdout should not contain ANSI codes"
    );
    assert!(
        !stderr.contains("\x1b["),
        "Color=never stderr should not contain ANSI codes"
    );
}

#[test]
fn test_conflicting_verbose_quiet_rejected() {
    let temp = TempDir::new().unwrap();
    let file = write_photo(temp.path(), "photo.png", 32);

    // Use an actual command (not --help which bypasses conflicts)
    stegoseal()
        .args(["--verbose", "--quiet", "sign", path_str(&file)])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("cannot be used with"));
}
