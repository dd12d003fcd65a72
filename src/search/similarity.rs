//! Similarity queries.

use super::*;
use crate::codec::BinaryMoleculeBuilder;
use crate::config::SimilarityConfig;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Tanimoto similarity of two circular fingerprints, compared radius by radius
pub fn tanimoto(a: &SimilarityFingerprint, b: &SimilarityFingerprint) -> f32 {
    a.similarity(b)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityQuery {
    config: SimilarityConfig,
    fingerprint: SimilarityFingerprint,
}
impl SimilarityQuery {
    /// Fingerprint `graph` without any attributes or suppressed hydrogens
    pub fn new(graph: &MoleculeGraph, config: &SimilarityConfig) -> Result<Self, SearchError> {
        let bytes = BinaryMoleculeBuilder::new(graph)
            .with_charges(false)
            .with_isotopes(false)
            .with_radicals(false)
            .with_stereo(false)
            .as_bytes(false)?;
        Self::from_bytes(&bytes, config)
    }

    pub fn from_bytes(bytes: &[u8], config: &SimilarityConfig) -> Result<Self, SearchError> {
        let molecule = BinaryMolecule::new(bytes)?;
        Ok(Self::from_fingerprint(
            similarity_fingerprint(&molecule, config.radius()),
            config,
        ))
    }

    pub fn from_fingerprint(fingerprint: SimilarityFingerprint, config: &SimilarityConfig) -> Self {
        Self {
            config: *config,
            fingerprint,
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }
    pub fn fingerprint(&self) -> &SimilarityFingerprint {
        &self.fingerprint
    }

    /// Size points a candidate can have and still reach the threshold.
    ///
    /// A fingerprint of `n` features can only be `t`-similar to one with between `n * t` and
    /// `n / t` features.
    pub fn size_range(&self) -> RangeInclusive<u32> {
        let total = self.fingerprint.len() as f32;
        let threshold = self.config.threshold();
        let base = self.config.radius() as u32 * SEGMENT_OFFSET;
        (base + (total * threshold).floor() as u32)..=(base + (total / threshold).ceil() as u32)
    }

    /// Features of which a candidate must share at least one.
    ///
    /// Taking the rarest features until their multiplicities exceed `n * (1 - t)` leaves too few
    /// features outside the set for a candidate sharing none of them to reach the threshold.
    pub fn optional_bits<S: IndexStatistics + ?Sized>(&self, stats: &S) -> Vec<u32> {
        let limit = (self.fingerprint.len() as f32 * (1.0 - self.config.threshold())).ceil() as usize;
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for &bit in self.fingerprint.segments().iter().flatten() {
            *counts.entry(bit).or_default() += 1;
        }
        let by_freq: BTreeMap<usize, u32> = counts
            .keys()
            .map(|&bit| (stats.doc_freq(Field::Similarity, bit), bit))
            .collect();
        let mut selected = Vec::new();
        let mut count = 0;
        for bit in by_freq.into_values() {
            if count > limit {
                break;
            }
            count += counts[&bit];
            selected.push(bit);
        }
        selected
    }

    pub fn optional_terms<S: IndexStatistics + ?Sized>(&self, stats: &S) -> Vec<String> {
        self.optional_bits(stats).into_iter().map(bit_as_term).collect()
    }

    /// Similarity to a stored payload, or `None` if it's below the threshold.
    ///
    /// Only as many radii as the query has are compared.
    pub fn score(&self, payload: &[u8]) -> Result<Option<f32>, FormatError> {
        let stored = decode_similarity_payload(payload)?;
        let segments = self.fingerprint.segments().len();
        let stored = SimilarityFingerprint::from_segments(stored.into_segments().into_iter().take(segments).collect());
        let similarity = tanimoto(&self.fingerprint, &stored);
        Ok((similarity >= self.config.threshold()).then_some(similarity))
    }
}
