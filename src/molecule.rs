//! The read-only graph contract shared by decoded payloads and source graphs

use crate::core::*;
use ahash::AHashMap;
use petgraph::prelude::*;
use smallvec::SmallVec;

/// Stands in for a missing ligand when normalizing stereo parities.
///
/// Larger than any 12-bit atom index, so it always sorts last.
pub const MAX_ATOM_IDX: usize = i16::MAX as usize;

/// Everything the matcher and the fingerprints need to know about a molecule.
///
/// Atom and bond indices are dense, starting at zero.
pub trait Molecule {
    /// Atom count including hydrogens that are only recorded as counts
    fn original_atom_count(&self) -> usize;
    /// Bond count including bonds to hydrogens that are only recorded as counts
    fn original_bond_count(&self) -> usize;
    fn atom_count(&self) -> usize;
    fn bond_count(&self) -> usize;
    fn has_pseudo_atom(&self) -> bool;
    fn has_rest_hydrogen_flags(&self) -> bool;

    /// Signed element code, negative for pseudo atoms
    fn atom_number(&self, atom: usize) -> i8;
    /// Number of bonded hydrogens, whether or not they are atoms of this graph
    fn atom_hydrogen_count(&self, atom: usize) -> u8;
    fn atom_formal_charge(&self, atom: usize) -> i8;
    /// Mass number minus atomic number plus one, zero when no isotope is set
    fn atom_mass(&self, atom: usize) -> u8;
    fn atom_radical(&self, atom: usize) -> Radical;
    fn atom_stereo(&self, atom: usize) -> TetrahedralStereo;
    fn atom_rest_hydrogen_flag(&self, atom: usize) -> bool;

    /// Index of the bond between two atoms, if there is one
    fn bond(&self, atom0: usize, atom1: usize) -> Option<usize>;
    fn bond_type(&self, bond: usize) -> BondType;
    fn bond_stereo(&self, bond: usize) -> BondStereo;
    /// One end of a bond, `end` is 0 or 1
    fn bond_atom(&self, bond: usize, end: usize) -> usize;
    fn bonded_atoms(&self, atom: usize) -> &[usize];

    fn atom_kind(&self, atom: usize) -> AtomKind {
        AtomKind::from_code(self.atom_number(atom))
    }
    fn is_atom_pseudo(&self, atom: usize) -> bool {
        self.atom_number(atom) < 0
    }
    fn is_atom_hydrogen(&self, atom: usize) -> bool {
        self.atom_number(atom) == HYDROGEN as i8
    }
    fn is_atom_metal(&self, atom: usize) -> bool {
        self.atom_kind(atom).is_metal()
    }
    fn is_atom_halogen(&self, atom: usize) -> bool {
        self.atom_kind(atom).is_halogen()
    }
    fn is_query_bond(&self, bond: usize) -> bool {
        self.bond_type(bond).is_query()
    }
    fn is_atom_in_bond(&self, atom: usize, bond: usize) -> bool {
        self.bond_atom(bond, 0) == atom || self.bond_atom(bond, 1) == atom
    }
    /// The end of `bond` that isn't `atom`
    fn other_bond_atom(&self, bond: usize, atom: usize) -> Option<usize> {
        let a0 = self.bond_atom(bond, 0);
        let a1 = self.bond_atom(bond, 1);
        if a0 == atom {
            Some(a1)
        } else if a1 == atom {
            Some(a0)
        } else {
            None
        }
    }
    /// For a two-connected `centre`, the neighbour that isn't `atom`
    fn opposite_atom(&self, centre: usize, atom: usize) -> Option<usize> {
        match *self.bonded_atoms(centre) {
            [a, b] if a == atom => Some(b),
            [a, b] if b == atom => Some(a),
            _ => None,
        }
    }
    /// The ligand of a double bond end that is neither the other end nor `ligand`.
    ///
    /// Returns [`MAX_ATOM_IDX`] when the end only has one ligand.
    fn last_stereo_bond_ligand(&self, atom: usize, other: usize, ligand: usize) -> usize {
        let list = self.bonded_atoms(atom);
        if list.len() == 3 {
            list.iter()
                .copied()
                .find(|&a| a != other && a != ligand)
                .unwrap_or(MAX_ATOM_IDX)
        } else {
            MAX_ATOM_IDX
        }
    }
    /// The neighbour of a tetrahedral centre not among the first three `ligands`.
    ///
    /// Returns [`MAX_ATOM_IDX`] for a three-connected centre.
    fn last_chiral_ligand(&self, centre: usize, ligands: &[usize]) -> usize {
        let list = self.bonded_atoms(centre);
        if list.len() == 4 {
            list.iter()
                .copied()
                .find(|a| !ligands[..3].contains(a))
                .unwrap_or(MAX_ATOM_IDX)
        } else {
            MAX_ATOM_IDX
        }
    }
    /// Centre of a cumulated double bond chain: two neighbours, both double bonded
    fn is_extended_tetrahedral_centre(&self, centre: usize) -> bool {
        let list = self.bonded_atoms(centre);
        list.len() == 2
            && list.iter().all(|&l| {
                self.bond(centre, l)
                    .is_some_and(|b| self.bond_type(b) == BondType::Double)
            })
    }
    /// A double bond whose ends both continue into further double bonds (a cumulene)
    fn is_extended_cis_trans(&self, bond: usize) -> bool {
        (0..2).all(|i| self.is_extended_tetrahedral_centre(self.bond_atom(bond, i)))
    }
}

/// Presents a [`MoleculeGraph`] through the [`Molecule`] contract.
///
/// Explicit hydrogen nodes stay atoms, and every atom's hydrogen count includes both its
/// implicit hydrogens and its hydrogen neighbours.
#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    graph: &'a MoleculeGraph,
    adjacency: Vec<SmallVec<usize, 4>>,
    bonds: AHashMap<(usize, usize), usize>,
    hydrogens: Vec<u8>,
    bond_stereo: Vec<BondStereo>,
    atom_stereo: Vec<TetrahedralStereo>,
    has_pseudo: bool,
    has_rest_h: bool,
}
impl<'a> GraphView<'a> {
    /// Stereo parities are taken from the declared configurations, normalized the same way the
    /// encoder does.
    pub fn new(graph: &'a MoleculeGraph) -> Self {
        let n = graph.node_count();
        let mut adjacency = vec![SmallVec::new(); n];
        let mut bonds = AHashMap::with_capacity(graph.edge_count());
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            adjacency[a].push(b);
            adjacency[b].push(a);
            bonds.insert((a.min(b), a.max(b)), edge.id().index());
        }
        let hydrogens = graph
            .node_indices()
            .map(|ix| {
                let explicit = graph
                    .neighbors(ix)
                    .filter(|&n| graph[n].kind.is_hydrogen())
                    .count();
                graph[ix].hydrogens.saturating_add(explicit as u8)
            })
            .collect();
        let identity = |ix: NodeIndex| ix.index();
        let atom_stereo = graph
            .node_indices()
            .map(|ix| {
                graph[ix].configuration.map_or(TetrahedralStereo::None, |c| {
                    crate::stereo::atom_parity(graph, ix, &c, identity)
                })
            })
            .collect();
        let bond_stereo = graph
            .edge_indices()
            .map(|e| {
                graph[e].configuration.map_or(BondStereo::None, |c| {
                    crate::stereo::bond_parity(graph, e, &c, identity)
                })
            })
            .collect();
        Self {
            graph,
            adjacency,
            bonds,
            hydrogens,
            atom_stereo,
            bond_stereo,
            has_pseudo: graph.node_weights().any(|a| a.kind.is_pseudo()),
            has_rest_h: graph.node_weights().any(|a| a.rest_hydrogen),
        }
    }
    pub fn graph(&self) -> &'a MoleculeGraph {
        self.graph
    }
}
impl Molecule for GraphView<'_> {
    fn original_atom_count(&self) -> usize {
        self.graph.node_count()
            + self
                .graph
                .node_weights()
                .map(|a| a.hydrogens as usize)
                .sum::<usize>()
    }
    fn original_bond_count(&self) -> usize {
        self.graph.edge_count()
            + self
                .graph
                .node_weights()
                .map(|a| a.hydrogens as usize)
                .sum::<usize>()
    }
    fn atom_count(&self) -> usize {
        self.graph.node_count()
    }
    fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }
    fn has_pseudo_atom(&self) -> bool {
        self.has_pseudo
    }
    fn has_rest_hydrogen_flags(&self) -> bool {
        self.has_rest_h
    }
    fn atom_number(&self, atom: usize) -> i8 {
        self.graph[NodeIndex::new(atom)].kind.code()
    }
    fn atom_hydrogen_count(&self, atom: usize) -> u8 {
        self.hydrogens[atom]
    }
    fn atom_formal_charge(&self, atom: usize) -> i8 {
        self.graph[NodeIndex::new(atom)].charge
    }
    fn atom_mass(&self, atom: usize) -> u8 {
        self.graph[NodeIndex::new(atom)]
            .isotope_delta()
            .and_then(|delta| u8::try_from(delta).ok())
            .unwrap_or(0)
    }
    fn atom_radical(&self, atom: usize) -> Radical {
        self.graph[NodeIndex::new(atom)].radical
    }
    fn atom_stereo(&self, atom: usize) -> TetrahedralStereo {
        self.atom_stereo[atom]
    }
    fn atom_rest_hydrogen_flag(&self, atom: usize) -> bool {
        self.graph[NodeIndex::new(atom)].rest_hydrogen
    }
    fn bond(&self, atom0: usize, atom1: usize) -> Option<usize> {
        self.bonds.get(&(atom0.min(atom1), atom0.max(atom1))).copied()
    }
    fn bond_type(&self, bond: usize) -> BondType {
        self.graph[EdgeIndex::new(bond)].kind
    }
    fn bond_stereo(&self, bond: usize) -> BondStereo {
        self.bond_stereo[bond]
    }
    fn bond_atom(&self, bond: usize, end: usize) -> usize {
        let (a, b) = self
            .graph
            .edge_endpoints(EdgeIndex::new(bond))
            .map_or((0, 0), |(a, b)| (a.index(), b.index()));
        if end == 0 {
            a
        } else {
            b
        }
    }
    fn bonded_atoms(&self, atom: usize) -> &[usize] {
        &self.adjacency[atom]
    }
}
