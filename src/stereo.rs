//! Stereocentre perception and parity normalization.
//!
//! Parities are always stored relative to a canonical ligand order: ascending index for
//! tetrahedral centres, and ascending index within each end's pair for double bonds and allenes.
//! Comparing two parities then only needs the permutation between the two orders.

use crate::core::*;
use crate::molecule::MAX_ATOM_IDX;
use itertools::Itertools;
use petgraph::prelude::*;
use std::collections::VecDeque;
use tracing::*;

/// Rings smaller than this lock a double bond's configuration
const MIN_STEREO_RING: usize = 8;

/// Whether the ligand order is an odd permutation of ascending order
pub fn is_odd_permutation(indexes: &[usize; 4]) -> bool {
    let mut inversions = 0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            if indexes[i] > indexes[j] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

/// Whether an odd number of the two ligand pairs are out of order
pub fn is_pair_swapped(indexes: &[usize; 4]) -> bool {
    (indexes[0] > indexes[1]) ^ (indexes[2] > indexes[3])
}

/// Re-express a tetrahedral parity given for `indexes` relative to their ascending order
pub fn normalize_atom_stereo(indexes: &[usize; 4], stereo: TetrahedralStereo) -> TetrahedralStereo {
    if is_odd_permutation(indexes) {
        stereo.inverted()
    } else {
        stereo
    }
}

/// Re-express a pairwise parity given for `indexes` relative to pairwise ascending order
pub fn normalize_bond_stereo<T: PairParity>(indexes: &[usize; 4], stereo: T) -> T {
    if is_pair_swapped(indexes) {
        stereo.flip()
    } else {
        stereo
    }
}

/// Parity codes that flip with a single swap inside one ligand pair
pub trait PairParity: Copy {
    fn flip(self) -> Self;
}
impl PairParity for BondStereo {
    fn flip(self) -> Self {
        self.inverted()
    }
}
impl PairParity for TetrahedralStereo {
    fn flip(self) -> Self {
        self.inverted()
    }
}

/// Whether `centre` sits between two double bonds
pub fn is_cumulated(graph: &MoleculeGraph, centre: NodeIndex) -> bool {
    let mut edges = graph.edges(centre);
    match (edges.next(), edges.next(), edges.next()) {
        (Some(a), Some(b), None) => {
            a.weight().kind == BondType::Double && b.weight().kind == BondType::Double
        }
        _ => false,
    }
}

/// Stored parity for a declared tetrahedral or allene centre.
///
/// `position` maps source nodes to the indices the parity should be relative to.
pub fn atom_parity<F: Fn(NodeIndex) -> usize>(
    graph: &MoleculeGraph,
    centre: NodeIndex,
    config: &AtomConfiguration,
    position: F,
) -> TetrahedralStereo {
    let indexes = config
        .ligands
        .map(|l| if l == centre { MAX_ATOM_IDX } else { position(l) });
    let stereo = config.winding.as_stereo();
    if is_cumulated(graph, centre) {
        normalize_bond_stereo(&indexes, stereo)
    } else {
        normalize_atom_stereo(&indexes, stereo)
    }
}

/// Stored parity for a declared double bond
pub fn bond_parity<F: Fn(NodeIndex) -> usize>(
    graph: &MoleculeGraph,
    bond: EdgeIndex,
    config: &BondConfiguration,
    position: F,
) -> BondStereo {
    let Some((a0, a1)) = graph.edge_endpoints(bond) else {
        return BondStereo::None;
    };
    let [mut l0, mut l1] = config.ligands;
    if !graph.contains_edge(a0, l0) || l0 == a1 {
        std::mem::swap(&mut l0, &mut l1);
    }
    let other = |end: NodeIndex, far: NodeIndex, ligand: NodeIndex| {
        graph
            .neighbors(end)
            .find(|&n| n != far && n != ligand)
            .map_or(MAX_ATOM_IDX, &position)
    };
    let indexes = [position(l0), other(a0, a1, l0), position(l1), other(a1, a0, l1)];
    normalize_bond_stereo(&indexes, config.conformation.as_stereo())
}

/// Which atoms and bonds of a source graph can carry a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stereocentres {
    pub atoms: Vec<bool>,
    pub bonds: Vec<bool>,
}
impl Stereocentres {
    #[instrument(level = "trace", skip_all)]
    pub fn perceive(graph: &MoleculeGraph) -> Self {
        let classes = symmetry_classes(graph);
        let atoms = graph
            .node_indices()
            .map(|ix| {
                is_tetrahedral_centre(graph, &classes, ix) || is_allene_centre(graph, &classes, ix)
            })
            .collect_vec();
        let bonds = graph
            .edge_indices()
            .map(|e| is_double_bond_centre(graph, &classes, e))
            .collect_vec();
        trace!(
            atoms = atoms.iter().filter(|&&b| b).count(),
            bonds = bonds.iter().filter(|&&b| b).count(),
            "perceived stereocentres"
        );
        Self { atoms, bonds }
    }
    pub fn is_atom_centre(&self, atom: NodeIndex) -> bool {
        self.atoms.get(atom.index()).copied().unwrap_or(false)
    }
    pub fn is_bond_centre(&self, bond: EdgeIndex) -> bool {
        self.bonds.get(bond.index()).copied().unwrap_or(false)
    }
}

/// Iteratively refined atom classes: atoms in the same class are topologically equivalent as far
/// as element, charge, isotope, hydrogens and bond types can tell.
pub fn symmetry_classes(graph: &MoleculeGraph) -> Vec<usize> {
    let n = graph.node_count();
    let initial = graph
        .node_indices()
        .map(|ix| {
            let a = &graph[ix];
            (
                a.kind.code(),
                a.charge,
                a.isotope.unwrap_or(0),
                a.hydrogens,
                graph.neighbors(ix).count(),
            )
        })
        .collect_vec();
    let mut classes = dense_ranks(&initial);
    let mut count = classes.iter().max().map_or(0, |&m| m + 1);
    for _ in 0..n {
        let signatures = graph
            .node_indices()
            .map(|ix| {
                let mut env = graph
                    .edges(ix)
                    .map(|e| {
                        let other = if e.source() == ix { e.target() } else { e.source() };
                        (e.weight().kind.0, classes[other.index()])
                    })
                    .collect_vec();
                env.sort_unstable();
                (classes[ix.index()], env)
            })
            .collect_vec();
        let refined = dense_ranks(&signatures);
        let refined_count = refined.iter().max().map_or(0, |&m| m + 1);
        classes = refined;
        if refined_count == count {
            break;
        }
        count = refined_count;
    }
    classes
}

fn dense_ranks<T: Ord>(keys: &[T]) -> Vec<usize> {
    let sorted = keys.iter().sorted().dedup().collect_vec();
    keys.iter()
        .map(|k| sorted.binary_search(&k).unwrap_or(0))
        .collect()
}

/// Ligand classes around `atom`, excluding `skip`. Hydrogens, implicit or not, share one class.
fn ligand_classes(
    graph: &MoleculeGraph,
    classes: &[usize],
    atom: NodeIndex,
    skip: Option<NodeIndex>,
) -> Vec<usize> {
    const H_CLASS: usize = usize::MAX;
    let mut out = graph
        .neighbors(atom)
        .filter(|&n| Some(n) != skip)
        .map(|n| {
            if graph[n].kind.is_hydrogen() && graph.neighbors(n).count() == 1 {
                H_CLASS
            } else {
                classes[n.index()]
            }
        })
        .collect_vec();
    out.extend(std::iter::repeat(H_CLASS).take(graph[atom].hydrogens as usize));
    out
}

fn all_distinct(list: &[usize]) -> bool {
    list.iter().all_unique()
}

fn is_tetrahedral_centre(graph: &MoleculeGraph, classes: &[usize], atom: NodeIndex) -> bool {
    let a = &graph[atom];
    let AtomKind::Element(number) = a.kind else {
        return false;
    };
    if number == HYDROGEN {
        return false;
    }
    let ligands = ligand_classes(graph, classes, atom, None);
    let doubles = graph
        .edges(atom)
        .filter(|e| e.weight().kind == BondType::Double)
        .count();
    let others = graph
        .edges(atom)
        .filter(|e| !matches!(e.weight().kind, BondType::Single | BondType::Double))
        .count();
    if others > 0 {
        return false;
    }
    let shape_ok = match (ligands.len(), number) {
        (4, 15 | 16 | 33 | 34) => doubles <= 1,
        (4, _) => doubles == 0,
        // lone pair as the fourth ligand: phosphines, sulfoxides and friends
        (3, 15 | 33) => doubles == 0,
        (3, 16 | 34) => doubles == 1 || (doubles == 0 && a.charge == 1),
        _ => false,
    };
    shape_ok && all_distinct(&ligands)
}

/// Walks a cumulated chain away from `prev`, returning the terminal atom and the chain length
fn walk_cumulene(
    graph: &MoleculeGraph,
    mut prev: NodeIndex,
    mut cur: NodeIndex,
) -> (NodeIndex, NodeIndex, usize) {
    let mut len = 0;
    while is_cumulated(graph, cur) && len < graph.node_count() {
        let Some(next) = graph.neighbors(cur).find(|&n| n != prev) else {
            break;
        };
        prev = cur;
        cur = next;
        len += 1;
    }
    (prev, cur, len)
}

fn is_allene_centre(graph: &MoleculeGraph, classes: &[usize], atom: NodeIndex) -> bool {
    if !is_cumulated(graph, atom) {
        return false;
    }
    let ends = graph.neighbors(atom).collect_vec();
    let [left, right] = ends[..] else {
        return false;
    };
    let (lp, lt, ll) = walk_cumulene(graph, atom, left);
    let (rp, rt, rl) = walk_cumulene(graph, atom, right);
    if ll != rl || lt == rt {
        return false;
    }
    [(lp, lt), (rp, rt)].into_iter().all(|(prev, term)| {
        let ligands = ligand_classes(graph, classes, term, Some(prev));
        ligands.len() == 2 && all_distinct(&ligands)
    })
}

fn is_double_bond_centre(graph: &MoleculeGraph, classes: &[usize], bond: EdgeIndex) -> bool {
    if graph[bond].kind != BondType::Double {
        return false;
    }
    let Some((a0, a1)) = graph.edge_endpoints(bond) else {
        return false;
    };
    let end_ok = |end: NodeIndex, far: NodeIndex| {
        if is_cumulated(graph, end) || graph[end].kind.is_pseudo() {
            return false;
        }
        let ligands = ligand_classes(graph, classes, end, Some(far));
        match ligands.len() {
            1 => ligands[0] != usize::MAX,
            2 => all_distinct(&ligands),
            _ => false,
        }
    };
    end_ok(a0, a1) && end_ok(a1, a0) && !in_small_ring(graph, a0, a1)
}

/// Whether `a` and `b` are also connected by a path shorter than a stereo-capable ring
fn in_small_ring(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> bool {
    let mut depth = vec![usize::MAX; graph.node_count()];
    let mut queue = VecDeque::new();
    depth[a.index()] = 0;
    queue.push_back(a);
    while let Some(cur) = queue.pop_front() {
        let d = depth[cur.index()];
        if d + 1 >= MIN_STEREO_RING {
            continue;
        }
        for n in graph.neighbors(cur) {
            if cur == a && n == b {
                continue;
            }
            if n == b {
                return true;
            }
            if depth[n.index()] == usize::MAX {
                depth[n.index()] = d + 1;
                queue.push_back(n);
            }
        }
    }
    false
}
