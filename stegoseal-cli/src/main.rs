//! StegoSeal CLI - tamper-evident image signing tool.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;
mod exit_codes;
mod utils;

use config::CliConfig;
use exit_codes::{ExitCode, EXIT_CODES_HELP, SUCCESS, USAGE_ERROR};
use utils::Output;

#[derive(Parser)]
#[command(name = "stegoseal")]
#[command(author, version, about = "Tamper-evident image signatures", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Print nothing on stdout; rely on the exit code
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print machine-readable JSON instead of the human report
    #[arg(long, global = true)]
    json: bool,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a content-derived signature into an image (writes PNG)
    Sign {
        /// Path to the image to sign
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Free-form tag stored alongside the context signature
        #[arg(short, long)]
        signature: Option<String>,

        /// Output path (defaults to <FILE stem>.signed.png)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show the signature embedded in an image, if any
    Inspect {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check whether an image changed since it was signed
    Verify {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also list similar images from this corpus
        #[arg(long, value_name = "PATH")]
        corpus: Option<PathBuf>,
    },

    /// Print the content digest and perceptual fingerprints of an image
    Hash {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add images to a corpus file
    Index {
        /// Images to add
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Corpus file to create or update
        #[arg(long, value_name = "PATH")]
        corpus: PathBuf,
    },

    /// Find corpus images perceptually similar to an image
    Similar {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Corpus file (defaults to $STEGOSEAL_CORPUS)
        #[arg(long, value_name = "PATH")]
        corpus: Option<PathBuf>,

        /// Largest Hamming distance reported as similar
        #[arg(long, value_name = "N")]
        max_distance: Option<u32>,

        /// Report at most this many matches
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Produce a full JSON report: digest, metadata, fingerprints, signature, matches
    Analyze {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Corpus file for the similarity section
        #[arg(long, value_name = "PATH")]
        corpus: Option<PathBuf>,

        /// Largest Hamming distance reported as similar
        #[arg(long, value_name = "N")]
        max_distance: Option<u32>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { USAGE_ERROR } else { SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    };
    colored::control::set_override(use_color);
    init_tracing(cli.verbose, cli.quiet, use_color && std::io::stderr().is_terminal());

    let exit = match run(cli) {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}

fn init_tracing(verbose: u8, quiet: bool, ansi: bool) {
    let default_directive = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "stegoseal=info,stegoseal_core=info,warn",
        (false, _) => "stegoseal=debug,stegoseal_core=debug,info",
    };

    let filter = std::env::var("STEGOSEAL_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::from_env();
    let out = Output {
        quiet: cli.quiet,
        json: cli.json,
    };

    match cli.command {
        Commands::Sign {
            file,
            signature,
            output,
        } => commands::sign::execute(file, signature, output, out),
        Commands::Inspect { file } => commands::inspect::execute(file, out),
        Commands::Verify { file, corpus } => commands::verify::execute(file, corpus, &config, out),
        Commands::Hash { file } => commands::hash::execute(file, out),
        Commands::Index { files, corpus } => commands::index::execute(files, corpus, out),
        Commands::Similar {
            file,
            corpus,
            max_distance,
            limit,
        } => commands::similar::execute(file, corpus, max_distance, limit, &config, out),
        Commands::Analyze {
            file,
            corpus,
            max_distance,
        } => commands::analyze::execute(file, corpus, max_distance, &config, out),
    }
}
