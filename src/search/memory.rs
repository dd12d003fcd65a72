//! A small in-process index, enough to run the whole protocol without an external search engine.

use super::*;
use ahash::AHashMap;

/// A verified candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub document: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstructureResults {
    /// Matches, best first
    pub hits: Vec<Hit>,
    /// Documents that passed the filter
    pub candidates: usize,
    /// Candidates the matcher gave up on
    pub budget_exceeded: Vec<usize>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    molecule: Vec<u8>,
    similarity_payload: Vec<u8>,
    similarity_points: Vec<u32>,
    has_fingerprint: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    documents: Vec<StoredDocument>,
    postings: AHashMap<(Field, u32), Vec<usize>>,
}
impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.documents.len()
    }
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Store a document, returning its id
    pub fn add(&mut self, document: &IndexDocument) -> usize {
        let id = self.documents.len();
        for bit in document.substructure_fingerprint().iter() {
            self.postings.entry((Field::Substructure, bit)).or_default().push(id);
        }
        for bit in document.similarity_features() {
            self.postings.entry((Field::Similarity, bit)).or_default().push(id);
        }
        self.documents.push(StoredDocument {
            molecule: document.molecule().to_vec(),
            similarity_payload: document.similarity_payload(),
            similarity_points: document.similarity_points(),
            has_fingerprint: !document.substructure_fingerprint().is_empty(),
        });
        id
    }

    pub fn molecule(&self, id: usize) -> Option<&[u8]> {
        self.documents.get(id).map(|doc| doc.molecule.as_slice())
    }

    fn postings(&self, field: Field, bit: u32) -> &[usize] {
        self.postings.get(&(field, bit)).map_or(&[], Vec::as_slice)
    }

    /// Documents containing every one of `bits`, or every document with a fingerprint if there are none
    fn conjunction(&self, bits: &[u32]) -> Vec<usize> {
        let Some((first, rest)) = bits.split_first() else {
            return (0..self.documents.len())
                .filter(|&id| self.documents[id].has_fingerprint)
                .collect();
        };
        let mut out = self.postings(Field::Substructure, *first).to_vec();
        for &bit in rest {
            let list = self.postings(Field::Substructure, bit);
            out.retain(|id| list.binary_search(id).is_ok());
        }
        out
    }

    #[instrument(level = "debug", skip_all)]
    pub fn substructure_search(&self, query: &SubstructureQuery) -> SubstructureResults {
        let bits = query.select_bits(self);
        let candidates = self.conjunction(&bits);
        debug!(bits = bits.len(), candidates = candidates.len(), "filtered candidates");
        let mut results = SubstructureResults {
            candidates: candidates.len(),
            ..SubstructureResults::default()
        };
        for id in candidates {
            match query.score(&self.documents[id].molecule) {
                Ok(Score::Match(score)) => results.hits.push(Hit { document: id, score }),
                Ok(Score::NoMatch) => {}
                Ok(Score::BudgetExceeded) => results.budget_exceeded.push(id),
                Err(err) => warn!(document = id, %err, "skipping unreadable document"),
            }
        }
        sort_hits(&mut results.hits);
        results
    }

    #[instrument(level = "debug", skip_all)]
    pub fn similarity_search(&self, query: &SimilarityQuery) -> Vec<Hit> {
        let range = query.size_range();
        let bits = query.optional_bits(self);
        let mut candidates: Vec<usize> = bits
            .iter()
            .flat_map(|&bit| self.postings(Field::Similarity, bit).iter().copied())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        candidates.retain(|&id| {
            self.documents[id]
                .similarity_points
                .iter()
                .any(|point| range.contains(point))
        });
        debug!(bits = bits.len(), candidates = candidates.len(), "filtered candidates");
        let mut hits = Vec::new();
        for id in candidates {
            match query.score(&self.documents[id].similarity_payload) {
                Ok(Some(score)) => hits.push(Hit { document: id, score }),
                Ok(None) => {}
                Err(err) => warn!(document = id, %err, "skipping unreadable document"),
            }
        }
        sort_hits(&mut hits);
        hits
    }
}
impl IndexStatistics for MemoryIndex {
    fn doc_freq(&self, field: Field, feature: u32) -> usize {
        self.postings(field, feature).len()
    }
}

fn sort_hits(hits: &mut [Hit]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.document.cmp(&b.document)));
}
