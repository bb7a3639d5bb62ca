//! Near-duplicate search over a corpus of stored fingerprints.
//!
//! The corpus is an already-materialized snapshot handed over by the
//! caller; nothing here performs I/O or keeps state between calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StegoSealError};
use crate::fingerprint::perceptual::{FingerprintSet, HashAlgorithm, DEFAULT_SIMILARITY_THRESHOLD};

/// A stored image identity and its fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: String,
    pub fingerprints: FingerprintSet,
}

impl CorpusEntry {
    pub fn new(id: impl Into<String>, fingerprints: FingerprintSet) -> Self {
        Self {
            id: id.into(),
            fingerprints,
        }
    }
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarityConfig {
    /// Largest aggregate distance still reported as similar.
    pub max_hamming_distance: u32,
    /// Algorithms compared; others present in the sets are ignored.
    pub algorithms: Vec<HashAlgorithm>,
    /// Per-algorithm weight in the aggregate; missing entries weigh 1.0.
    pub weights: BTreeMap<HashAlgorithm, f64>,
    /// Keep at most this many matches.
    pub limit: Option<usize>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_hamming_distance: DEFAULT_SIMILARITY_THRESHOLD,
            algorithms: HashAlgorithm::ALL.to_vec(),
            weights: BTreeMap::new(),
            limit: None,
        }
    }
}

impl SimilarityConfig {
    /// Default configuration with a different threshold.
    pub fn with_max_distance(max_hamming_distance: u32) -> Self {
        Self {
            max_hamming_distance,
            ..Self::default()
        }
    }

    /// Parse from JSON, e.g. `{"maxHammingDistance": 12}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StegoSealError::SerializationError(e.to_string()))
    }

    fn weight(&self, algorithm: HashAlgorithm) -> f64 {
        self.weights.get(&algorithm).copied().unwrap_or(1.0)
    }
}

/// One corpus entry compared against the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub id: String,
    /// Weighted mean of the per-algorithm distances.
    pub distance: f64,
    pub distances: BTreeMap<HashAlgorithm, u32>,
    pub similar: bool,
}

/// Compare the candidate against a single corpus entry.
///
/// Returns `Ok(None)` when the two sets share no enabled algorithm, and an
/// error when a shared algorithm has fingerprints of different lengths.
pub fn compare(
    candidate: &FingerprintSet,
    entry: &CorpusEntry,
    config: &SimilarityConfig,
) -> Result<Option<SimilarityMatch>> {
    let mut distances = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for &algorithm in &config.algorithms {
        let (Some(ours), Some(theirs)) = (candidate.get(algorithm), entry.fingerprints.get(algorithm))
        else {
            continue;
        };

        let distance = ours.hamming_distance(theirs)?;
        let weight = config.weight(algorithm);
        weighted_sum += weight * distance as f64;
        total_weight += weight;
        distances.insert(algorithm, distance);
    }

    if distances.is_empty() || total_weight <= 0.0 {
        return Ok(None);
    }

    let distance = weighted_sum / total_weight;
    Ok(Some(SimilarityMatch {
        id: entry.id.clone(),
        distance,
        distances,
        similar: distance <= config.max_hamming_distance as f64,
    }))
}

/// Find corpus entries within `config.max_hamming_distance` of the candidate.
///
/// Results are ordered closest first; equal distances keep corpus order.
/// An entry whose fingerprints cannot be compared is skipped without
/// affecting the rest of the search.
pub fn find_similar(
    candidate: &FingerprintSet,
    corpus: &[CorpusEntry],
    config: &SimilarityConfig,
) -> Vec<SimilarityMatch> {
    let mut matches: Vec<SimilarityMatch> = corpus
        .iter()
        .filter_map(|entry| match compare(candidate, entry, config) {
            Ok(Some(m)) => Some(m),
            Ok(None) => {
                debug!(id = %entry.id, "No shared fingerprint algorithm, skipping");
                None
            }
            Err(e) => {
                warn!(id = %entry.id, error = %e, "Skipping incomparable corpus entry");
                None
            }
        })
        .filter(|m| m.similar)
        .collect();

    // sort_by is stable, so ties stay in corpus order.
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    if let Some(limit) = config.limit {
        matches.truncate(limit);
    }

    debug!(
        corpus = corpus.len(),
        matches = matches.len(),
        threshold = config.max_hamming_distance,
        "Similarity search complete"
    );

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::perceptual::PerceptualHash;

    fn set(ahash: u64, dhash: u64, phash: u64) -> FingerprintSet {
        [
            PerceptualHash::new(ahash.to_be_bytes(), HashAlgorithm::AverageHash),
            PerceptualHash::new(dhash.to_be_bytes(), HashAlgorithm::DifferenceHash),
            PerceptualHash::new(phash.to_be_bytes(), HashAlgorithm::DctHash),
        ]
        .into_iter()
        .collect()
    }

    fn phash_only(phash: u64) -> FingerprintSet {
        [PerceptualHash::new(phash.to_be_bytes(), HashAlgorithm::DctHash)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_identical_entry_first_with_zero_distance() {
        let candidate = set(0xF0F0, 0x0F0F, 0xAAAA);
        let corpus = vec![
            CorpusEntry::new("near", set(0xF0F1, 0x0F0F, 0xAAAB)),
            CorpusEntry::new("same", candidate.clone()),
            CorpusEntry::new("far", set(!0xF0F0, !0x0F0F, !0xAAAA)),
        ];

        let matches = find_similar(&candidate, &corpus, &SimilarityConfig::default());
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "same");
        assert_eq!(matches[0].distance, 0.0);
        assert!(matches[0].distances.values().all(|&d| d == 0));
        assert_eq!(matches[1].id, "near");
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let candidate = phash_only(0);
        let corpus = vec![
            CorpusEntry::new("b", phash_only(0b1)),
            CorpusEntry::new("a", phash_only(0b10)),
            CorpusEntry::new("c", phash_only(0b100)),
        ];

        let ids: Vec<_> = find_similar(&candidate, &corpus, &SimilarityConfig::default())
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let candidate = phash_only(0);
        let corpus = vec![
            CorpusEntry::new("at", phash_only(0b11)),
            CorpusEntry::new("over", phash_only(0b111)),
        ];

        let matches = find_similar(&candidate, &corpus, &SimilarityConfig::with_max_distance(2));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "at");
        assert_eq!(matches[0].distance, 2.0);
    }

    #[test]
    fn test_weighted_aggregate() {
        let candidate = set(0, 0, 0);
        let entry = CorpusEntry::new("x", set(0xFF, 0, 0b1111));

        let mut config = SimilarityConfig::with_max_distance(64);
        let unweighted = compare(&candidate, &entry, &config).unwrap().unwrap();
        assert_eq!(unweighted.distance, 4.0);
        assert_eq!(unweighted.distances[&HashAlgorithm::AverageHash], 8);

        config.weights.insert(HashAlgorithm::DctHash, 2.0);
        let weighted = compare(&candidate, &entry, &config).unwrap().unwrap();
        assert_eq!(weighted.distance, (8.0 + 0.0 + 2.0 * 4.0) / 4.0);
    }

    #[test]
    fn test_only_shared_algorithms_are_compared() {
        let candidate = set(0, 0xFFFF_FFFF, 0);
        let entry = CorpusEntry::new("legacy", phash_only(0));

        let m = compare(&candidate, &entry, &SimilarityConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(m.distances.len(), 1);
        assert_eq!(m.distance, 0.0);
        assert!(m.similar);
    }

    #[test]
    fn test_disabled_algorithms_are_ignored() {
        let candidate = set(0, 0, 0);
        let entry = CorpusEntry::new("x", set(u64::MAX, 0, 0));
        let config = SimilarityConfig {
            algorithms: vec![HashAlgorithm::DctHash],
            ..SimilarityConfig::default()
        };

        let m = compare(&candidate, &entry, &config).unwrap().unwrap();
        assert_eq!(m.distance, 0.0);
        assert!(!m.distances.contains_key(&HashAlgorithm::AverageHash));
    }

    #[test]
    fn test_no_shared_algorithm_is_skipped() {
        let candidate = phash_only(0);
        let entry = CorpusEntry::new(
            "ahash-only",
            [PerceptualHash::new([0; 8], HashAlgorithm::AverageHash)]
                .into_iter()
                .collect(),
        );
        assert_eq!(compare(&candidate, &entry, &SimilarityConfig::default()).unwrap(), None);
        assert!(find_similar(&candidate, &[entry], &SimilarityConfig::default()).is_empty());
    }

    #[test]
    fn test_length_mismatch_aborts_only_that_entry() {
        let candidate = phash_only(0);
        let broken: FingerprintSet =
            [PerceptualHash::from_bytes(vec![0; 5], HashAlgorithm::DctHash)]
                .into_iter()
                .collect();
        let corpus = vec![
            CorpusEntry::new("broken", broken.clone()),
            CorpusEntry::new("ok", phash_only(0)),
        ];

        assert!(compare(&candidate, &corpus[0], &SimilarityConfig::default()).is_err());

        let matches = find_similar(&candidate, &corpus, &SimilarityConfig::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "ok");
    }

    #[test]
    fn test_limit_truncates_after_sorting() {
        let candidate = phash_only(0);
        let corpus = vec![
            CorpusEntry::new("three", phash_only(0b111)),
            CorpusEntry::new("zero", phash_only(0)),
            CorpusEntry::new("one", phash_only(0b1)),
        ];
        let config = SimilarityConfig {
            limit: Some(2),
            ..SimilarityConfig::default()
        };

        let ids: Vec<_> = find_similar(&candidate, &corpus, &config)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["zero", "one"]);
    }

    #[test]
    fn test_config_from_json() {
        let config = SimilarityConfig::from_json(r#"{"maxHammingDistance": 12}"#).unwrap();
        assert_eq!(config.max_hamming_distance, 12);
        assert_eq!(config.algorithms, HashAlgorithm::ALL.to_vec());

        let config =
            SimilarityConfig::from_json(r#"{"algorithms": ["phash"], "weights": {"phash": 3.0}, "limit": 5}"#)
                .unwrap();
        assert_eq!(config.algorithms, vec![HashAlgorithm::DctHash]);
        assert_eq!(config.weight(HashAlgorithm::DctHash), 3.0);
        assert_eq!(config.limit, Some(5));

        assert!(SimilarityConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_corpus_entry_json() {
        let json = r#"[{"id": "42", "fingerprints": {"phash": "0000000000000001"}}]"#;
        let corpus: Vec<CorpusEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(corpus[0].id, "42");
        assert_eq!(
            corpus[0].fingerprints.get(HashAlgorithm::DctHash).unwrap().hash,
            vec![0, 0, 0, 0, 0, 0, 0, 1]
        );
    }
}
