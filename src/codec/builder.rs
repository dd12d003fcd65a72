use super::records::*;
use super::*;
use crate::core::*;
use crate::sort::{is_frequency_sorted, sort_by_frequency};
use crate::stereo::{self, Stereocentres};
use itertools::Itertools;
use petgraph::prelude::*;
use std::borrow::Cow;
use tracing::*;

/// Writes a [`MoleculeGraph`] in the binary layout.
///
/// The graph is put into frequency order first, so atom indices in the payload generally differ
/// from the source graph's.
#[derive(Debug, Clone)]
pub struct BinaryMoleculeBuilder<'a> {
    graph: Cow<'a, MoleculeGraph>,
    centres: Stereocentres,
    charges: bool,
    isotopes: bool,
    radicals: bool,
    stereo: bool,
}
impl<'a> BinaryMoleculeBuilder<'a> {
    pub fn new(graph: &'a MoleculeGraph) -> Self {
        let graph = if is_frequency_sorted(graph) {
            Cow::Borrowed(graph)
        } else {
            Cow::Owned(sort_by_frequency(graph))
        };
        let centres = Stereocentres::perceive(&graph);
        Self {
            graph,
            centres,
            charges: true,
            isotopes: true,
            radicals: true,
            stereo: true,
        }
    }
    pub fn with_charges(mut self, charges: bool) -> Self {
        self.charges = charges;
        self
    }
    pub fn with_isotopes(mut self, isotopes: bool) -> Self {
        self.isotopes = isotopes;
        self
    }
    pub fn with_radicals(mut self, radicals: bool) -> Self {
        self.radicals = radicals;
        self
    }
    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.stereo = stereo;
        self
    }

    /// The graph in the order it gets written
    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    /// Rest-hydrogen flags in payload order, if any atom carries one
    pub fn rest_hydrogen_flags(&self) -> Option<Vec<bool>> {
        self.graph
            .node_weights()
            .any(|a| a.rest_hydrogen)
            .then(|| self.graph.node_weights().map(|a| a.rest_hydrogen).collect())
    }

    /// A hydrogen that isn't attached to exactly one atom keeps its bonds in the bond section
    fn is_hydrogen_bond(&self, heavy: usize, atom: NodeIndex) -> bool {
        atom.index() >= heavy && self.graph.neighbors(atom).count() == 1
    }

    #[instrument(level = "trace", skip(self))]
    pub fn as_bytes(&self, write_suppressed_hydrogens: bool) -> Result<Vec<u8>, FormatError> {
        let graph = &*self.graph;
        let mut header = Header::default();
        for atom in graph.node_weights() {
            if atom.kind.is_hydrogen() {
                header.h_atoms += 1;
            } else if atom.kind.is_carbon() {
                header.c_atoms += 1;
            } else {
                header.x_atoms += 1;
            }
            if write_suppressed_hydrogens {
                header.h_atoms += atom.hydrogens as usize;
            }
        }
        let heavy = header.heavy_atoms();
        let last_atom = (heavy + header.h_atoms).saturating_sub(1);
        if last_atom > MAX_RECORD_INDEX {
            return Err(FormatError::new(0, AtomIndexOverflow(last_atom)));
        }

        // heavy bonds first, then the bonds of hydrogens with zero or several partners
        let mut bond_numbers = vec![None; graph.edge_count()];
        let mut bonds = Vec::new();
        for edge in graph.edge_references() {
            if edge.source().index() < heavy && edge.target().index() < heavy {
                bond_numbers[edge.id().index()] = Some(bonds.len());
                bonds.push(edge);
            }
        }
        for edge in graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            if (a.index() >= heavy || b.index() >= heavy)
                && !self.is_hydrogen_bond(heavy, a)
                && !self.is_hydrogen_bond(heavy, b)
            {
                bond_numbers[edge.id().index()] = Some(bonds.len());
                bonds.push(edge);
            }
        }
        header.x_bonds = bonds.len();

        let specials = self.special_records(&bond_numbers)?;
        header.specials = specials.len();

        let mut out = Vec::with_capacity(header.payload_len());
        header.write(&mut out)?;
        for atom in graph.node_weights().take(header.x_atoms) {
            out.push(atom.kind.code() as u8);
        }
        for edge in &bonds {
            let kind = edge.weight().kind;
            if !kind.is_known() {
                return Err(FormatError::new(out.len(), UnsupportedBondOrder(kind.0)));
            }
            let record = BondRecord::pack(edge.source().index(), edge.target().index(), kind);
            out.extend_from_slice(&record.into_bytes());
        }
        for ix in graph.node_indices().skip(heavy) {
            let mut edges = graph.edges(ix);
            let record = match (edges.next(), edges.next()) {
                (Some(edge), None) => {
                    let other = if edge.source() == ix { edge.target() } else { edge.source() };
                    if graph[other].kind.is_hydrogen()
                        && ix > other
                        && graph.neighbors(other).count() == 1
                    {
                        // the pair was already written from the other side
                        HydrogenRecord::empty()
                    } else {
                        let kind = edge.weight().kind;
                        if !kind.is_known() {
                            return Err(FormatError::new(out.len(), UnsupportedBondOrder(kind.0)));
                        }
                        HydrogenRecord::pack(other.index(), kind)
                    }
                }
                _ => HydrogenRecord::empty(),
            };
            out.extend_from_slice(&record.into_bytes());
        }
        if write_suppressed_hydrogens {
            for ix in graph.node_indices() {
                let record = HydrogenRecord::pack(ix.index(), BondType::Single).into_bytes();
                for _ in 0..graph[ix].hydrogens {
                    out.extend_from_slice(&record);
                }
            }
        }
        specials.write(&mut out);
        debug_assert_eq!(out.len(), header.payload_len());
        debug!(?header, "encoded molecule");
        Ok(out)
    }

    fn special_records(&self, bond_numbers: &[Option<usize>]) -> Result<SpecialRecords, FormatError> {
        let graph = &*self.graph;
        let mut specials = SpecialRecords::new();
        for ix in graph.node_indices() {
            let atom = &graph[ix];
            if self.charges && atom.charge != 0 {
                specials.insert_atom(RecordKind::Charge, ix.index(), atom.charge as u8)?;
            }
            if let (true, Some(delta)) = (self.isotopes, atom.isotope_delta()) {
                let delta = u8::try_from(delta)
                    .ok()
                    .filter(|&d| d > 0)
                    .ok_or(FormatError::new(0, IsotopeOutOfRange(delta)))?;
                specials.insert_atom(RecordKind::Isotope, ix.index(), delta)?;
            }
            if self.radicals && atom.radical != Radical::None {
                specials.insert_atom(RecordKind::Radical, ix.index(), atom.radical.0)?;
            }
            if self.stereo {
                let parity = match &atom.configuration {
                    Some(config) => stereo::atom_parity(graph, ix, config, |n| n.index()),
                    None if self.centres.is_atom_centre(ix) => TetrahedralStereo::Undefined,
                    None => continue,
                };
                specials.insert_atom(RecordKind::TetrahedralStereo, ix.index(), parity.0)?;
            }
        }
        if self.stereo {
            for edge in graph.edge_references() {
                let Some(number) = bond_numbers[edge.id().index()] else {
                    continue;
                };
                let bond = edge.weight();
                if bond.kind == BondType::Aromatic {
                    continue;
                }
                let parity = match &bond.configuration {
                    Some(config) => stereo::bond_parity(graph, edge.id(), config, |n| n.index()),
                    None if self.centres.is_bond_centre(edge.id()) => BondStereo::Undefined,
                    None => continue,
                };
                specials.insert_bond(RecordKind::BondStereo, number, parity.0)?;
            }
        }
        trace!(
            kinds = ?specials.iter().map(|(k, _, _)| k).dedup().collect_vec(),
            "collected special records"
        );
        Ok(specials)
    }
}

/// Encode `graph` with every attribute
pub fn encode(graph: &MoleculeGraph, write_suppressed_hydrogens: bool) -> Result<Vec<u8>, FormatError> {
    BinaryMoleculeBuilder::new(graph).as_bytes(write_suppressed_hydrogens)
}
