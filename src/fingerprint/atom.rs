use super::*;
use crate::core::HYDROGEN;

/// Element code of every heavy, non-pseudo atom
pub fn features<M: Molecule>(molecule: &M, provenance: bool) -> FeatureCounts {
    let mut out = FeatureCounts::new(provenance);
    for atom in 0..molecule.atom_count() {
        if molecule.atom_number(atom) <= HYDROGEN as i8 {
            continue;
        }
        out.add(atom_hash(molecule, atom), 1, [atom]);
    }
    out
}
