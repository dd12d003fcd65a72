use crate::codec::{BinaryMolecule, DecodeOptions};
use crate::core::*;
use petgraph::prelude::*;

pub(crate) const SINGLE: BondType = BondType::Single;
pub(crate) const DOUBLE: BondType = BondType::Double;
pub(crate) const AROMATIC: BondType = BondType::Aromatic;
pub(crate) const SINGLE_OR_DOUBLE: BondType = BondType::SingleOrDouble;

mod macros;

mod codec;
mod config;
mod fingerprint;
mod isomorphism;
mod sort;
mod stereo;
mod utils;

/// Build a graph from `(atomic number, implicit hydrogens)` atoms and `(a, b, order)` bonds
pub(crate) fn molecule(atoms: &[(u8, u8)], bonds: &[(usize, usize, BondType)]) -> MoleculeGraph {
    let mut graph = MoleculeGraph::with_capacity(atoms.len(), bonds.len());
    for &(number, hydrogens) in atoms {
        graph.add_node(Atom::element(number).with_hydrogens(hydrogens));
    }
    for &(a, b, kind) in bonds {
        graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), Bond::new(kind));
    }
    graph
}

/// Hydrogen-free carbon chain
pub(crate) fn carbon_chain(len: usize) -> MoleculeGraph {
    let atoms = vec![(6, 0); len];
    let bonds: Vec<_> = (1..len).map(|i| (i - 1, i, SINGLE)).collect();
    molecule(&atoms, &bonds)
}

pub(crate) fn ethanol() -> MoleculeGraph {
    molecule(&[(6, 3), (6, 2), (8, 1)], &[(0, 1, SINGLE), (1, 2, SINGLE)])
}

pub(crate) fn propane() -> MoleculeGraph {
    molecule(&[(6, 3), (6, 2), (6, 3)], &[(0, 1, SINGLE), (1, 2, SINGLE)])
}

pub(crate) fn acetic_acid() -> MoleculeGraph {
    molecule(
        &[(6, 3), (6, 0), (8, 0), (8, 1)],
        &[(0, 1, SINGLE), (1, 2, DOUBLE), (1, 3, SINGLE)],
    )
}

pub(crate) fn benzene() -> MoleculeGraph {
    let bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, AROMATIC)).collect();
    molecule(&[(6, 1); 6], &bonds)
}

pub(crate) fn phenol() -> MoleculeGraph {
    let mut graph = benzene();
    graph[NodeIndex::new(0)].hydrogens = 0;
    let oxygen = graph.add_node(Atom::element(8).with_hydrogens(1));
    graph.add_edge(NodeIndex::new(0), oxygen, Bond::new(SINGLE));
    graph
}

pub(crate) fn pyridine() -> MoleculeGraph {
    let mut graph = benzene();
    graph[NodeIndex::new(3)] = Atom::element(7);
    graph
}

/// Encode with suppressed hydrogens and decode with `options`
pub(crate) fn round_trip(graph: &MoleculeGraph, options: &DecodeOptions) -> BinaryMolecule {
    let bytes = crate::codec::encode(graph, true).unwrap();
    BinaryMolecule::decode(&bytes, options).unwrap()
}

/// Encode without suppressed hydrogens and decode compactly, the way queries are read
pub(crate) fn bare(graph: &MoleculeGraph) -> BinaryMolecule {
    let bytes = crate::codec::encode(graph, false).unwrap();
    BinaryMolecule::new(&bytes).unwrap()
}
