//! Connected subgraph enumeration and canonical subgraph hashing.
//!
//! Only bonds between two heavy, non-pseudo atoms with a plain or aromatic bond order take part.
//! A subgraph is hashed by repeatedly folding its leaves into their neighbours until one atom, one
//! final pair, or one bare cycle remains. Subgraphs that reduce to anything else (fused or bridged
//! ring systems) are skipped.

use super::*;
use crate::core::{BondType, HYDROGEN};
use crate::utils::bitset::BitSet;

type BondSet = BitSet<u64, 2>;

/// Hash of the atom a doublet collapses into
const DOUBLET_HASH: u32 = 666;

fn is_walkable_atom<M: Molecule>(molecule: &M, atom: usize) -> bool {
    molecule.atom_number(atom) > HYDROGEN as i8
}

fn is_walkable_bond<M: Molecule>(molecule: &M, bond: usize) -> bool {
    molecule.bond_type(bond).0 <= BondType::Aromatic.0
        && is_walkable_atom(molecule, molecule.bond_atom(bond, 0))
        && is_walkable_atom(molecule, molecule.bond_atom(bond, 1))
}

/// For every bond, the walkable bonds sharing an atom with it
fn neighbour_lists<M: Molecule>(molecule: &M) -> Vec<Vec<usize>> {
    let mut nbrs = vec![Vec::new(); molecule.bond_count()];
    for atom in 0..molecule.atom_count() {
        if !is_walkable_atom(molecule, atom) {
            continue;
        }
        let bonds: Vec<usize> = molecule
            .bonded_atoms(atom)
            .iter()
            .filter(|&&other| is_walkable_atom(molecule, other))
            .filter_map(|&other| molecule.bond(atom, other))
            .filter(|&bond| molecule.bond_type(bond).0 <= BondType::Aromatic.0)
            .collect();
        for &b1 in &bonds {
            nbrs[b1].extend(bonds.iter().copied().filter(|&b2| b2 != b1));
        }
    }
    nbrs
}

/// A partially grown subgraph and the bonds it may still grow by
struct Walk {
    path: Vec<usize>,
    candidates: Vec<usize>,
    forbidden: BondSet,
}

/// All connected bond subsets with between `min` and `max` bonds, each exactly once
#[instrument(level = "trace", skip(molecule))]
pub fn find_subgraphs<M: Molecule>(molecule: &M, min: usize, max: usize) -> Vec<Vec<usize>> {
    let nbrs = neighbour_lists(molecule);
    let mut forbidden = BondSet::with_capacity(molecule.bond_count());
    let mut out = Vec::new();
    let mut stack = Vec::new();
    for start in 0..molecule.bond_count() {
        if !is_walkable_bond(molecule, start) || forbidden.get(start) {
            continue;
        }
        forbidden.set(start, true);
        let root = Walk {
            path: vec![start],
            candidates: nbrs[start].clone(),
            forbidden: forbidden.clone(),
        };
        if (min..=max).contains(&1) {
            out.push(root.path.clone());
        }
        if max > 1 {
            stack.push(root);
        }
        while let Some(walk) = stack.last_mut() {
            let Some(next) = walk.candidates.pop() else {
                stack.pop();
                continue;
            };
            if walk.forbidden.get(next) {
                continue;
            }
            walk.forbidden.set(next, true);
            let mut candidates = walk.candidates.clone();
            candidates.extend(nbrs[next].iter().copied().filter(|&b| !walk.forbidden.get(b)));
            let mut path = walk.path.clone();
            path.push(next);
            let child = Walk {
                forbidden: walk.forbidden.clone(),
                candidates,
                path,
            };
            if (min..=max).contains(&child.path.len()) {
                out.push(child.path.clone());
            }
            if child.path.len() < max {
                stack.push(child);
            }
        }
    }
    trace!(count = out.len(), "enumerated subgraphs");
    out
}

#[derive(Debug, Clone)]
struct AtomDesc {
    hash: u32,
    cover: Vec<u32>,
}

/// Canonical hash of the subgraph made of `bonds`, `None` if it isn't a tree or a single cycle
pub fn hash_subgraph<M: Molecule>(molecule: &M, bonds: &[usize]) -> Option<u32> {
    // neighbour -> bond hash, per atom
    let mut links: BTreeMap<usize, BTreeMap<usize, u32>> = BTreeMap::new();
    for &bond in bonds {
        let (a, b) = (molecule.bond_atom(bond, 0), molecule.bond_atom(bond, 1));
        let hash = bond_hash(molecule, bond);
        links.entry(a).or_default().insert(b, hash);
        links.entry(b).or_default().insert(a, hash);
    }
    let max_degree = links.values().map(BTreeMap::len).max().unwrap_or(1).max(1);
    // atoms bucketed by their remaining degree
    let mut atoms: Vec<BTreeMap<usize, AtomDesc>> = vec![BTreeMap::new(); max_degree + 1];
    for (&atom, nbrs) in &links {
        let desc = AtomDesc {
            hash: atom_hash(molecule, atom),
            cover: Vec::new(),
        };
        atoms[nbrs.len()].insert(atom, desc);
    }

    while !atoms[1].is_empty() {
        let leaves = std::mem::take(&mut atoms[1]);
        let mut rest = leaves.clone();
        for (&leaf, desc) in &leaves {
            if !rest.contains_key(&leaf) {
                continue;
            }
            let (&host, &bond) = links.get(&leaf)?.iter().next()?;
            let mut cover = desc.cover.clone();
            let leaf_hash = hash_list(desc.hash, bond, &mut cover);
            links.remove(&leaf);
            rest.remove(&leaf);
            let host_degree = links.get(&host)?.len();

            if let Some(other) = rest.remove(&host) {
                // the last two atoms collapse into one
                let mut cover = other.cover.clone();
                let other_hash = hash_list(other.hash, bond, &mut cover);
                links.get_mut(&host)?.remove(&leaf);
                atoms[0].insert(
                    host,
                    AtomDesc {
                        hash: DOUBLET_HASH,
                        cover: vec![leaf_hash, other_hash],
                    },
                );
                break;
            }

            let mut host_desc = atoms[host_degree].remove(&host)?;
            links.get_mut(&host)?.remove(&leaf);
            host_desc.cover.push(leaf_hash);
            atoms[host_degree - 1].insert(host, host_desc);
        }
        let leftover = std::mem::take(&mut atoms[1]);
        atoms[1] = rest;
        atoms[1].extend(leftover);
    }

    if let Some(last) = atoms[0].values_mut().next() {
        return Some(hash_list(last.hash, 0, &mut last.cover));
    }
    hash_cycle(&links, &mut atoms)
}

/// Hash of a bare cycle, independent of where the walk starts and which way it goes
fn hash_cycle(
    links: &BTreeMap<usize, BTreeMap<usize, u32>>,
    atoms: &mut [BTreeMap<usize, AtomDesc>],
) -> Option<u32> {
    if atoms
        .iter()
        .enumerate()
        .any(|(degree, bucket)| degree != 2 && !bucket.is_empty())
    {
        return None;
    }
    let ring = atoms.get_mut(2)?;
    let start = *ring.keys().next()?;
    let mut node_hash = |atom: usize| -> Option<u32> {
        let desc = ring.get_mut(&atom)?;
        Some(hash_list(desc.hash, 0, &mut desc.cover))
    };

    let mut cycle = vec![node_hash(start)?];
    let (mut last, mut current) = (usize::MAX, start);
    loop {
        let (&next, &bond) = links.get(&current)?.iter().find(|(&n, _)| n != last)?;
        cycle.push(bond);
        if next == start {
            break;
        }
        cycle.push(node_hash(next)?);
        last = current;
        current = next;
        if cycle.len() > 2 * links.len() {
            return None;
        }
    }

    let n = cycle.len() as isize;
    let at = |rot: isize, dir: isize, i: isize| cycle[(n + rot + i * dir).rem_euclid(n) as usize];
    let (mut min_rot, mut min_dir) = (0isize, -1isize);
    for rot in 0..n {
        for dir in [-1, 1] {
            for i in 0..n {
                match at(min_rot, min_dir, i).cmp(&at(rot, dir, i)) {
                    std::cmp::Ordering::Less => break,
                    std::cmp::Ordering::Equal => continue,
                    std::cmp::Ordering::Greater => {
                        min_rot = rot;
                        min_dir = dir;
                        break;
                    }
                }
            }
        }
    }
    Some((0..n).fold(0, |seed, i| update_seed(at(min_rot, min_dir, i), seed)))
}

/// Bonds in each connected fragment's walkable part, for fragments that have any
fn fragment_sizes<M: Molecule>(molecule: &M) -> Vec<usize> {
    let mut visited_atoms = vec![false; molecule.atom_count()];
    let mut visited_bonds = BondSet::with_capacity(molecule.bond_count());
    let mut sizes = Vec::new();
    for root in 0..molecule.atom_count() {
        if visited_atoms[root] {
            continue;
        }
        visited_atoms[root] = true;
        let mut size = 0;
        let mut stack = vec![root];
        while let Some(atom) = stack.pop() {
            if !is_walkable_atom(molecule, atom) {
                continue;
            }
            for &other in molecule.bonded_atoms(atom) {
                if !is_walkable_atom(molecule, other) {
                    continue;
                }
                let Some(bond) = molecule.bond(atom, other) else {
                    continue;
                };
                if molecule.bond_type(bond).0 > BondType::Aromatic.0 {
                    continue;
                }
                if !visited_bonds.get(bond) {
                    visited_bonds.set(bond, true);
                    size += 1;
                }
                if !visited_atoms[other] {
                    visited_atoms[other] = true;
                    stack.push(other);
                }
            }
        }
        if size > 0 {
            sizes.push(size);
        }
    }
    sizes
}

/// Subgraph feature counts.
///
/// In query mode the lower bound is raised to the smallest fragment size that is at least `min`
/// and below `max`, since smaller subgraphs of the query say nothing a larger one doesn't.
#[instrument(level = "trace", skip(molecule))]
pub fn features<M: Molecule>(
    molecule: &M,
    mut min: usize,
    max: usize,
    query: bool,
    provenance: bool,
) -> FeatureCounts {
    if query {
        min = fragment_sizes(molecule)
            .into_iter()
            .filter(|&s| s >= min && s < max)
            .min()
            .unwrap_or(max);
    }
    let mut out = FeatureCounts::new(provenance);
    for subgraph in find_subgraphs(molecule, min, max) {
        let Some(hash) = hash_subgraph(molecule, &subgraph) else {
            continue;
        };
        let atoms = subgraph
            .iter()
            .flat_map(|&b| [molecule.bond_atom(b, 0), molecule.bond_atom(b, 1)]);
        out.add(hash, 1, atoms);
    }
    out
}
