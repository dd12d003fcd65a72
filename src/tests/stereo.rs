use super::*;
use crate::molecule::{GraphView, Molecule};
use crate::stereo::*;

#[test]
fn permutations() {
    assert!(!is_odd_permutation(&[0, 1, 2, 3]));
    assert!(is_odd_permutation(&[1, 0, 2, 3]));
    assert!(!is_odd_permutation(&[1, 2, 0, 3]));
    assert!(!is_odd_permutation(&[3, 2, 1, 0]));

    assert!(is_pair_swapped(&[1, 0, 2, 3]));
    assert!(!is_pair_swapped(&[1, 0, 3, 2]));

    assert_eq!(
        normalize_atom_stereo(&[1, 0, 2, 3], TetrahedralStereo::Clockwise),
        TetrahedralStereo::AntiClockwise
    );
    assert_eq!(
        normalize_bond_stereo(&[0, 1, 3, 2], BondStereo::Together),
        BondStereo::Opposite
    );
    assert_eq!(
        normalize_bond_stereo(&[0, 1, 2, 3], BondStereo::Undefined),
        BondStereo::Undefined
    );
}

#[test]
fn inversion() {
    assert_eq!(TetrahedralStereo::Clockwise.inverted(), TetrahedralStereo::AntiClockwise);
    assert_eq!(TetrahedralStereo::None.inverted(), TetrahedralStereo::Undefined);
    assert_eq!(BondStereo::Opposite.inverted(), BondStereo::Together);
    assert!(!BondStereo::Undefined.is_defined());
}

#[test]
fn perceived_centres() {
    let chiral = molecule(
        &[(6, 1), (9, 0), (17, 0), (35, 0)],
        &[(0, 1, SINGLE), (0, 2, SINGLE), (0, 3, SINGLE)],
    );
    let centres = Stereocentres::perceive(&chiral);
    assert!(centres.is_atom_centre(NodeIndex::new(0)));
    assert!(!centres.is_atom_centre(NodeIndex::new(1)));

    let achiral = molecule(
        &[(6, 2), (9, 0), (17, 0)],
        &[(0, 1, SINGLE), (0, 2, SINGLE)],
    );
    assert!(!Stereocentres::perceive(&achiral).is_atom_centre(NodeIndex::new(0)));

    // 2-butene can be cis or trans, propene can't
    let butene = molecule(
        &[(6, 3), (6, 1), (6, 1), (6, 3)],
        &[(0, 1, SINGLE), (1, 2, DOUBLE), (2, 3, SINGLE)],
    );
    assert!(Stereocentres::perceive(&butene).is_bond_centre(EdgeIndex::new(1)));
    let propene = molecule(&[(6, 3), (6, 1), (6, 2)], &[(0, 1, SINGLE), (1, 2, DOUBLE)]);
    assert!(!Stereocentres::perceive(&propene).is_bond_centre(EdgeIndex::new(1)));
}

#[test]
fn symmetry() {
    let classes = symmetry_classes(&propane());
    assert_eq!(classes[0], classes[2]);
    assert_ne!(classes[0], classes[1]);
    let classes = symmetry_classes(&benzene());
    assert!(classes.iter().all(|&c| c == classes[0]));
}

#[test]
fn declared_parities() {
    let mut butene = molecule(
        &[(6, 3), (6, 1), (6, 1), (6, 3)],
        &[(0, 1, SINGLE), (1, 2, DOUBLE), (2, 3, SINGLE)],
    );
    let ix = NodeIndex::new;
    let double = EdgeIndex::new(1);
    butene[double].configuration = Some(BondConfiguration {
        ligands: [ix(0), ix(3)],
        conformation: Conformation::Opposite,
    });
    let view = GraphView::new(&butene);
    assert_eq!(view.bond_stereo(1), BondStereo::Opposite);
    assert_eq!(view.atom_hydrogen_count(1), 1);

    let bytes = crate::codec::encode(&butene, true).unwrap();
    let decoded = BinaryMolecule::decode(&bytes, &DecodeOptions::compact().with_stereo(true)).unwrap();
    let bond = decoded.bond(0, 1).unwrap();
    assert_eq!(decoded.bond_type(bond), DOUBLE);
    assert_eq!(decoded.bond_stereo(bond), BondStereo::Opposite);
}
