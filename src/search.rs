//! The two-phase search protocol.
//!
//! Documents are indexed under their fingerprint features. A query first narrows the corpus down
//! with a handful of its rarest features, then every surviving candidate is verified: by the
//! matcher for substructure and exact searches, by Tanimoto similarity for similarity searches.
//! The index itself lives outside of this crate, it's only seen through [`IndexStatistics`];
//! [`MemoryIndex`] is a small in-process stand-in.

use crate::codec::{self, BinaryMolecule, FormatError};
use crate::config::{ConfigError, MAX_RADIUS};
use crate::core::MoleculeGraph;
use crate::fingerprint::*;
use thiserror::Error;
use tracing::*;

pub mod memory;
pub mod similarity;
pub mod substructure;

pub use memory::{Hit, MemoryIndex, SubstructureResults};
pub use similarity::{tanimoto, SimilarityQuery};
pub use substructure::{Score, SubstructureQuery};

/// Most features a substructure filter uses
pub const MAX_SELECTED_BITS: usize = 32;
/// How many selected features every query atom should be covered by
pub const ATOM_COVERAGE: u32 = 2;
/// Separates the similarity size points of different radii
pub const SEGMENT_OFFSET: u32 = 1 << 28;

const TERM_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The two fingerprint fields of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Substructure,
    Similarity,
}

/// What the query side needs to know about the index
pub trait IndexStatistics {
    /// Number of documents with `feature` in `field`
    fn doc_freq(&self, field: Field, feature: u32) -> usize;
}

/// Render a feature code as a six character index term, six bits at a time from the low end
pub fn bit_as_term(bit: u32) -> String {
    (0..6)
        .map(|i| TERM_ALPHABET[((bit >> (6 * i)) & 0x3f) as usize] as char)
        .collect()
}

fn check_radius(radius: usize) -> Result<(), ConfigError> {
    if (1..=MAX_RADIUS).contains(&radius) {
        Ok(())
    } else {
        Err(ConfigError::RadiusOutOfRange(radius))
    }
}

/// Index size points, one per radius: the cumulative feature count offset by the radius
pub fn similarity_points(fingerprint: &SimilarityFingerprint) -> Vec<u32> {
    fingerprint
        .cumulative_sizes()
        .into_iter()
        .enumerate()
        .map(|(i, size)| i as u32 * SEGMENT_OFFSET + size as u32)
        .collect()
}

/// Per-radius feature lists, each prefixed by its length, all little-endian `u32`s
pub fn encode_similarity_payload(fingerprint: &SimilarityFingerprint) -> Vec<u8> {
    let mut out = Vec::with_capacity((fingerprint.len() + fingerprint.segments().len()) * 4);
    for segment in fingerprint.segments() {
        out.extend_from_slice(&(segment.len() as u32).to_le_bytes());
        for &bit in segment {
            out.extend_from_slice(&bit.to_le_bytes());
        }
    }
    out
}

pub fn decode_similarity_payload(bytes: &[u8]) -> Result<SimilarityFingerprint, FormatError> {
    use codec::FormatErrorKind::*;
    let mut words = bytes.chunks(4).enumerate().map(|(i, chunk)| {
        <[u8; 4]>::try_from(chunk)
            .map(u32::from_le_bytes)
            .map_err(|_| FormatError::new(i * 4, Truncated(4 - chunk.len())))
    });
    let mut segments = Vec::new();
    while let Some(len) = words.next() {
        let len = len? as usize;
        let segment = words.by_ref().take(len).collect::<Result<Vec<_>, _>>()?;
        if segment.len() < len {
            return Err(FormatError::new(bytes.len(), Truncated((len - segment.len()) * 4)));
        }
        segments.push(segment);
    }
    Ok(SimilarityFingerprint::from_segments(segments))
}

/// Everything stored for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    molecule: Vec<u8>,
    substructure: Fingerprint,
    similarity: SimilarityFingerprint,
}
impl IndexDocument {
    /// Encode a molecule with every attribute and its suppressed hydrogens, then fingerprint it
    pub fn new(graph: &MoleculeGraph, radius: usize) -> Result<Self, SearchError> {
        let bytes = codec::encode(graph, true)?;
        Self::from_bytes(bytes, radius)
    }

    #[instrument(level = "trace", skip(bytes))]
    pub fn from_bytes(bytes: Vec<u8>, radius: usize) -> Result<Self, SearchError> {
        check_radius(radius)?;
        let molecule = BinaryMolecule::new(&bytes)?;
        let substructure = substructure_fingerprint(&molecule, &FingerprintOptions::index());
        let similarity = similarity_fingerprint(&molecule, radius);
        debug!(
            substructure = substructure.len(),
            similarity = similarity.len(),
            "fingerprinted document"
        );
        Ok(Self {
            molecule: bytes,
            substructure,
            similarity,
        })
    }

    /// The stored payload
    pub fn molecule(&self) -> &[u8] {
        &self.molecule
    }
    pub fn substructure_fingerprint(&self) -> &Fingerprint {
        &self.substructure
    }
    pub fn similarity_fingerprint(&self) -> &SimilarityFingerprint {
        &self.similarity
    }
    pub fn substructure_terms(&self) -> Vec<String> {
        self.substructure.iter().map(bit_as_term).collect()
    }
    /// Distinct similarity features, as terms
    pub fn similarity_terms(&self) -> Vec<String> {
        self.similarity_features().into_iter().map(bit_as_term).collect()
    }
    pub(crate) fn similarity_features(&self) -> Vec<u32> {
        let mut bits: Vec<u32> = self.similarity.segments().iter().flatten().copied().collect();
        bits.sort_unstable();
        bits.dedup();
        bits
    }
    pub fn similarity_points(&self) -> Vec<u32> {
        similarity_points(&self.similarity)
    }
    pub fn similarity_payload(&self) -> Vec<u8> {
        encode_similarity_payload(&self.similarity)
    }
}
