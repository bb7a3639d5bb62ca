//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell a tampered image apart from an unreadable one or a
//! failed write without parsing stderr.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data error: the image was modified since signing, or cannot hold the
/// signature. Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open or decode an input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Text appended to `--help`.
pub const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error
  65  Image tampered or too small for the signature
  66  Input file missing, unreadable or not a supported image
  74  Output file could not be written";

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = if message.contains("Failed to read")
            || message.contains("Failed to decode")
            || message.contains("Unsupported image format")
        {
            INPUT_ERROR
        } else if message.contains("Verification failed")
            || message.contains("has been modified")
            || message.contains("Insufficient capacity")
        {
            VERIFICATION_FAILED
        } else if message.contains("Invalid user signature") || message.contains("No corpus given") {
            USAGE_ERROR
        } else if message.contains("Failed to write") || message.contains("serialize") {
            IO_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}
