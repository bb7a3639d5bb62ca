//! CLI configuration module
//!
//! Defaults come from environment variables; command-line flags override them.

use std::path::PathBuf;

use stegoseal_core::fingerprint::DEFAULT_SIMILARITY_THRESHOLD;
use stegoseal_core::SimilarityConfig;

/// Settings shared by the similarity-aware commands.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Largest distance reported as similar (default: 10)
    pub max_hamming_distance: u32,
    /// Corpus used when `--corpus` is not given
    pub corpus: Option<PathBuf>,
    /// Maximum number of matches to report (default: unlimited)
    pub similarity_limit: Option<usize>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            max_hamming_distance: DEFAULT_SIMILARITY_THRESHOLD,
            corpus: None,
            similarity_limit: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_hamming_distance = lookup("STEGOSEAL_MAX_HAMMING_DISTANCE")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        let corpus = lookup("STEGOSEAL_CORPUS")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let similarity_limit = lookup("STEGOSEAL_SIMILARITY_LIMIT")
            .and_then(|v| v.trim().parse().ok())
            .filter(|&n: &usize| n > 0);

        Self {
            max_hamming_distance,
            corpus,
            similarity_limit,
        }
    }

    /// Corpus path, preferring the command-line value.
    pub fn corpus_path(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.corpus.clone())
    }

    /// Build the search parameters, preferring command-line values.
    pub fn similarity(&self, max_distance: Option<u32>, limit: Option<usize>) -> SimilarityConfig {
        SimilarityConfig {
            max_hamming_distance: max_distance.unwrap_or(self.max_hamming_distance),
            limit: limit.or(self.similarity_limit),
            ..SimilarityConfig::default()
        }
    }
}
