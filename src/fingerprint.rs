//! Hash-based feature generators.
//!
//! Every generator produces raw feature counts. The substructure fingerprint folds the counts of
//! the subgraph, pattern and atom generators into a flat set of feature codes, each tagged with the
//! generator's family so codes of different generators never collide. The similarity fingerprint
//! is the circular generator alone, kept apart per radius.

use crate::molecule::Molecule;
use ahash::AHashMap;
use c_enum::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::*;

pub mod atom;
pub mod circular;
pub mod pattern;
pub mod subgraph;

pub use circular::SimilarityFingerprint;

/// Largest subgraph, in bonds, enumerated by default
pub const DEFAULT_GRAPH_SIZE: usize = 7;
/// Occurrence counts are bucketed by powers of two, up to this many buckets
pub const MAX_FEATURE_LOG_COUNT: u32 = 5;

#[inline]
pub fn update_seed(x: u32, seed: u32) -> u32 {
    let (x, s) = (x as u64, seed as u64);
    let mixed = x
        .wrapping_mul(2654435761)
        .wrapping_add(2654435769)
        .wrapping_add(s << 6)
        .wrapping_add(s >> 2);
    seed ^ mixed as u32
}

pub fn hash2(a: u32, b: u32) -> u32 {
    update_seed(b, update_seed(a, 0))
}

pub fn hash3(a: u32, b: u32, c: u32) -> u32 {
    update_seed(c, hash2(a, b))
}

/// Hash two values and a list, which gets sorted first
pub fn hash_list(a: u32, b: u32, list: &mut [u32]) -> u32 {
    list.sort_unstable();
    list.iter().fold(hash2(a, b), |seed, &x| update_seed(x, seed))
}

#[inline]
pub(crate) fn atom_hash<M: Molecule>(molecule: &M, atom: usize) -> u32 {
    molecule.atom_number(atom) as i32 as u32
}

#[inline]
pub(crate) fn bond_hash<M: Molecule>(molecule: &M, bond: usize) -> u32 {
    molecule.bond_type(bond).0 as u32
}

c_enum! {
    /// Tag mixed into every substructure feature code
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Family: u32 {
        Subgraph = 1,
        Pattern = 2,
        Atom = 3,
    }
}

/// Raw occurrence counts of one generator, and optionally the atoms behind each feature
#[derive(Debug, Clone, Default)]
pub struct FeatureCounts {
    counts: BTreeMap<u32, u32>,
    provenance: Option<AHashMap<u32, BTreeSet<usize>>>,
}
impl FeatureCounts {
    pub fn new(provenance: bool) -> Self {
        Self {
            counts: BTreeMap::new(),
            provenance: provenance.then(AHashMap::new),
        }
    }
    pub fn add(&mut self, key: u32, count: u32, atoms: impl IntoIterator<Item = usize>) {
        *self.counts.entry(key).or_default() += count;
        if let Some(prov) = &mut self.provenance {
            prov.entry(key).or_default().extend(atoms);
        }
    }
    pub fn count(&self, key: u32) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }
    pub fn len(&self) -> usize {
        self.counts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }
    pub fn atoms(&self, key: u32) -> Option<&BTreeSet<usize>> {
        self.provenance.as_ref()?.get(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintOptions {
    /// Largest subgraph in bonds
    pub graph_size: usize,
    pub max_log_count: u32,
    /// Emit only the highest count bucket of every feature
    pub query: bool,
    /// Record the atoms behind every feature
    pub provenance: bool,
}
impl FingerprintOptions {
    /// What a stored document gets: every count bucket, no provenance
    pub fn index() -> Self {
        Self {
            graph_size: DEFAULT_GRAPH_SIZE,
            max_log_count: MAX_FEATURE_LOG_COUNT,
            query: false,
            provenance: false,
        }
    }
    /// What a query gets: the highest bucket only, with provenance
    pub fn query() -> Self {
        Self {
            query: true,
            provenance: true,
            ..Self::index()
        }
    }
    pub fn with_graph_size(mut self, graph_size: usize) -> Self {
        self.graph_size = graph_size;
        self
    }
}
impl Default for FingerprintOptions {
    fn default() -> Self {
        Self::index()
    }
}

/// A set of substructure feature codes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    features: BTreeSet<u32>,
    provenance: BTreeMap<u32, BTreeSet<usize>>,
}
impl Fingerprint {
    pub fn len(&self) -> usize {
        self.features.len()
    }
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
    pub fn contains(&self, feature: u32) -> bool {
        self.features.contains(&feature)
    }
    /// Feature codes in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.features.iter().copied()
    }
    /// Atoms covered by a feature, if provenance was recorded
    pub fn atoms(&self, feature: u32) -> Option<&BTreeSet<usize>> {
        self.provenance.get(&feature)
    }
    pub fn has_provenance(&self) -> bool {
        !self.provenance.is_empty()
    }

    fn fold(&mut self, family: Family, counts: &FeatureCounts, options: &FingerprintOptions) {
        for (key, count) in counts.iter() {
            let buckets = (0..options.max_log_count)
                .scan(count, |left, c| {
                    (*left != 0).then(|| {
                        *left /= 2;
                        c
                    })
                });
            let buckets: Vec<u32> = if options.query {
                buckets.last().into_iter().collect()
            } else {
                buckets.collect()
            };
            for c in buckets {
                let code = hash3(family.0, c, key);
                self.features.insert(code);
                if let Some(atoms) = counts.atoms(key) {
                    self.provenance.entry(code).or_default().extend(atoms);
                }
            }
        }
    }
}

/// Subgraph, pattern and atom features of a molecule
#[instrument(level = "trace", skip_all)]
pub fn substructure_fingerprint<M: Molecule>(molecule: &M, options: &FingerprintOptions) -> Fingerprint {
    let mut out = Fingerprint::default();
    let subgraphs = subgraph::features(molecule, 0, options.graph_size, options.query, options.provenance);
    out.fold(Family::Subgraph, &subgraphs, options);
    let patterns = pattern::features(molecule, options.provenance);
    out.fold(Family::Pattern, &patterns, options);
    let atoms = atom::features(molecule, options.provenance);
    out.fold(Family::Atom, &atoms, options);
    debug!(
        subgraphs = subgraphs.len(),
        patterns = patterns.len(),
        atoms = atoms.len(),
        features = out.len(),
        "computed substructure fingerprint"
    );
    out
}

/// Circular features of a molecule, one segment per radius from 0 through `radius`
pub fn similarity_fingerprint<M: Molecule>(molecule: &M, radius: usize) -> SimilarityFingerprint {
    circular::fingerprint(molecule, 0, radius)
}
