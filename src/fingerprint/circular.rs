//! Morgan-style environment hashing

use super::*;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct AtomDesc {
    hash: u32,
    /// Bonds within the environment
    cover: BTreeSet<usize>,
}

/// Circular features, one sorted segment per radius
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SimilarityFingerprint {
    segments: Vec<Vec<u32>>,
}
impl SimilarityFingerprint {
    pub fn from_segments(mut segments: Vec<Vec<u32>>) -> Self {
        for seg in &mut segments {
            seg.sort_unstable();
        }
        Self { segments }
    }
    pub fn segments(&self) -> &[Vec<u32>] {
        &self.segments
    }
    pub fn into_segments(self) -> Vec<Vec<u32>> {
        self.segments
    }
    /// Total number of features over all segments
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Vec::is_empty)
    }
    /// Feature count through each segment
    pub fn cumulative_sizes(&self) -> Vec<usize> {
        self.segments
            .iter()
            .scan(0, |acc, seg| {
                *acc += seg.len();
                Some(*acc)
            })
            .collect()
    }

    /// Size of the multiset intersection, segment by segment
    pub fn shared_count(&self, other: &Self) -> usize {
        self.segments
            .iter()
            .zip(&other.segments)
            .map(|(a, b)| shared_sorted(a, b))
            .sum()
    }

    /// Tanimoto similarity, 1.0 for two empty fingerprints
    pub fn similarity(&self, other: &Self) -> f32 {
        let shared = self.shared_count(other);
        let union = self.len() + other.len() - shared;
        if union == 0 {
            1.0
        } else {
            shared as f32 / union as f32
        }
    }
}

fn shared_sorted(a: &[u32], b: &[u32]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

/// Circular features for every radius from `min_radius` through `max_radius`.
///
/// Radius 0 is the element of every non-hydrogen atom. Each further radius only rehashes atoms
/// whose environment still grew, so segments thin out as environments saturate.
#[instrument(level = "trace", skip(molecule))]
pub fn fingerprint<M: Molecule>(molecule: &M, min_radius: usize, max_radius: usize) -> SimilarityFingerprint {
    let n = molecule.atom_count();
    let mut desc: Vec<Option<AtomDesc>> = (0..n)
        .map(|a| {
            (!molecule.is_atom_hydrogen(a)).then(|| AtomDesc {
                hash: atom_hash(molecule, a),
                cover: BTreeSet::new(),
            })
        })
        .collect();
    let mut segments = Vec::with_capacity(max_radius + 1);
    if min_radius == 0 {
        segments.push(desc.iter().flatten().map(|d| d.hash).collect());
    }

    for radius in 1..=max_radius {
        let mut next = vec![None; n];
        let mut segment = Vec::new();
        for (i, current) in desc.iter().enumerate() {
            let Some(current) = current else {
                continue;
            };
            let mut hashes = Vec::new();
            let mut cover = BTreeSet::new();
            for &a in molecule.bonded_atoms(i) {
                let (Some(other), Some(bond)) = (&desc[a], molecule.bond(i, a)) else {
                    continue;
                };
                cover.insert(bond);
                cover.extend(other.cover.iter().copied());
                hashes.push(hash2(bond_hash(molecule, bond), other.hash));
            }
            if cover != current.cover {
                let hash = hash_list(current.hash, cover.len() as u32, &mut hashes);
                segment.push(hash);
                next[i] = Some(AtomDesc { hash, cover });
            }
        }
        if radius >= min_radius {
            segments.push(segment);
        }
        trace!(radius, live = next.iter().flatten().count(), "expanded environments");
        desc = next;
    }
    SimilarityFingerprint::from_segments(segments)
}
