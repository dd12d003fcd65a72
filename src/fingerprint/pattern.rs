//! Counts of common functional groups.
//!
//! The library is compiled once, on first use, into matchers that are then shared read-only by
//! every thread. A feature's key is the motif's position in the library.

use super::*;
use crate::codec::{self, BinaryMolecule, DecodeOptions};
use crate::core::*;
use crate::isomorphism::Isomorphism;

/// Matches counted per motif and molecule
pub const MATCH_LIMIT: usize = 256;

const C: AtomKind = AtomKind::CARBON;
const N: AtomKind = AtomKind::Element(7);
const O: AtomKind = AtomKind::Element(8);
const P: AtomKind = AtomKind::Element(15);
const S: AtomKind = AtomKind::Element(16);
const R: AtomKind = AtomKind::Pseudo(Pseudo::Any);
const Q: AtomKind = AtomKind::Pseudo(Pseudo::Hetero);
const M: AtomKind = AtomKind::Pseudo(Pseudo::Metal);
const X: AtomKind = AtomKind::Pseudo(Pseudo::Halogen);

const SINGLE: BondType = BondType::Single;
const DOUBLE: BondType = BondType::Double;
const TRIPLE: BondType = BondType::Triple;
const AROMATIC: BondType = BondType::Aromatic;

/// A motif: atoms with their minimum hydrogen counts, and bonds between atom positions
#[derive(Debug, Clone, Copy)]
pub struct Motif {
    pub name: &'static str,
    pub atoms: &'static [(AtomKind, u8)],
    pub bonds: &'static [(usize, usize, BondType)],
}
impl Motif {
    pub fn graph(&self) -> MoleculeGraph {
        let mut graph = MoleculeGraph::with_capacity(self.atoms.len(), self.bonds.len());
        let nodes: Vec<_> = self
            .atoms
            .iter()
            .map(|&(kind, h)| graph.add_node(Atom::new(kind).with_hydrogens(h)))
            .collect();
        for &(a, b, kind) in self.bonds {
            graph.add_edge(nodes[a], nodes[b], Bond::new(kind));
        }
        graph
    }

    pub fn compile(&self) -> Result<Isomorphism<BinaryMolecule>, codec::FormatError> {
        let bytes = codec::encode(&self.graph(), true)?;
        let extended = codec::scan::is_extended(&bytes, false, false)?;
        let molecule = BinaryMolecule::decode(&bytes, &DecodeOptions::compact().with_extended(extended))?;
        Ok(Isomorphism::new(molecule))
    }
}

macro_rules! motif {
    ($name:literal: [$($kind:ident $h:literal),*] [$($a:literal $bond:ident $b:literal),*]) => {
        Motif {
            name: $name,
            atoms: &[$(($kind, $h)),*],
            bonds: &[$(($a, $b, $bond)),*],
        }
    };
}

/// The motif library, in key order
pub const MOTIFS: &[Motif] = &[
    motif!("carbonyl": [C 0, O 0] [0 DOUBLE 1]),
    motif!("hydroxyl": [C 0, O 1] [0 SINGLE 1]),
    motif!("aldehyde": [C 1, O 0] [0 DOUBLE 1]),
    motif!("ketone": [C 0, C 0, O 0, C 0] [0 SINGLE 1, 1 DOUBLE 2, 1 SINGLE 3]),
    motif!("carboxylic acid": [C 0, O 0, O 1] [0 DOUBLE 1, 0 SINGLE 2]),
    motif!("ester": [C 0, O 0, O 0, C 0] [0 DOUBLE 1, 0 SINGLE 2, 2 SINGLE 3]),
    motif!("ether": [C 0, O 0, C 0] [0 SINGLE 1, 1 SINGLE 2]),
    motif!("amide": [C 0, O 0, N 0] [0 DOUBLE 1, 0 SINGLE 2]),
    motif!("urea": [N 0, C 0, O 0, N 0] [0 SINGLE 1, 1 DOUBLE 2, 1 SINGLE 3]),
    motif!("primary amine": [C 0, N 2] [0 SINGLE 1]),
    motif!("secondary amine": [C 0, N 1, C 0] [0 SINGLE 1, 1 SINGLE 2]),
    motif!("imine": [C 0, N 0] [0 DOUBLE 1]),
    motif!("nitrile": [C 0, N 0] [0 TRIPLE 1]),
    motif!("nitro": [N 0, O 0, O 0] [0 DOUBLE 1, 0 SINGLE 2]),
    motif!("azo": [N 0, N 0] [0 DOUBLE 1]),
    motif!("thiol": [C 0, S 1] [0 SINGLE 1]),
    motif!("thioether": [C 0, S 0, C 0] [0 SINGLE 1, 1 SINGLE 2]),
    motif!("sulfonyl": [O 0, S 0, O 0] [0 DOUBLE 1, 1 DOUBLE 2]),
    motif!("phosphate": [O 0, P 0, O 0, O 0] [0 DOUBLE 1, 1 SINGLE 2, 1 SINGLE 3]),
    motif!("alkene": [C 0, C 0] [0 DOUBLE 1]),
    motif!("alkyne": [C 0, C 0] [0 TRIPLE 1]),
    motif!("halide": [C 0, X 0] [0 SINGLE 1]),
    motif!("metal bond": [M 0, R 0] [0 SINGLE 1]),
    motif!("benzene ring": [C 0, C 0, C 0, C 0, C 0, C 0]
        [0 AROMATIC 1, 1 AROMATIC 2, 2 AROMATIC 3, 3 AROMATIC 4, 4 AROMATIC 5, 5 AROMATIC 0]),
    motif!("heteroaromatic ring": [C 0, C 0, C 0, C 0, C 0, Q 0]
        [0 AROMATIC 1, 1 AROMATIC 2, 2 AROMATIC 3, 3 AROMATIC 4, 4 AROMATIC 5, 5 AROMATIC 0]),
    motif!("five-membered aromatic ring": [R 0, R 0, R 0, R 0, R 0]
        [0 AROMATIC 1, 1 AROMATIC 2, 2 AROMATIC 3, 3 AROMATIC 4, 4 AROMATIC 0]),
    motif!("cyclohexane": [C 0, C 0, C 0, C 0, C 0, C 0]
        [0 SINGLE 1, 1 SINGLE 2, 2 SINGLE 3, 3 SINGLE 4, 4 SINGLE 5, 5 SINGLE 0]),
];

lazy_static::lazy_static! {
    static ref LIBRARY: Vec<Option<Isomorphism<BinaryMolecule>>> = MOTIFS
        .iter()
        .map(|motif| {
            motif
                .compile()
                .map_err(|err| error!(motif = motif.name, %err, "failed to compile motif"))
                .ok()
        })
        .collect();
}

/// Compiled matchers, indexed like [`MOTIFS`]
pub fn library() -> &'static [Option<Isomorphism<BinaryMolecule>>] {
    &LIBRARY
}

/// How often each motif occurs, up to [`MATCH_LIMIT`]
#[instrument(level = "trace", skip_all)]
pub fn features<T: Molecule>(molecule: &T, provenance: bool) -> FeatureCounts {
    let mut out = FeatureCounts::new(provenance);
    for (key, iso) in library().iter().enumerate() {
        let Some(iso) = iso else {
            continue;
        };
        let matches = iso.match_all(molecule, MATCH_LIMIT);
        if matches.is_empty() {
            continue;
        }
        out.add(key as u32, matches.len() as u32, matches.into_iter().flatten());
    }
    out
}
