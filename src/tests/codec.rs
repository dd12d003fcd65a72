use super::macros::*;
use super::*;
use crate::codec::records::{BondRecord, HydrogenRecord, RecordKind, SpecialRecord};
use crate::codec::*;
use crate::molecule::Molecule;

#[test]
fn header_layout() {
    trace_capture!();
    // C-N-C without hydrogens
    let graph = molecule(&[(6, 0), (7, 0), (6, 0)], &[(0, 1, SINGLE), (1, 2, SINGLE)]);
    let bytes = encode(&graph, false).unwrap();
    assert_eq!(&bytes[..Header::SIZE], &[0u8, 1, 0, 2, 0, 0, 0, 2, 0, 0]);
    assert_eq!(bytes[Header::SIZE], 7);
    assert_eq!(bytes.len(), Header::SIZE + 1 + 2 * Header::BOND_SIZE);

    let decoded = BinaryMolecule::new(&bytes).unwrap();
    assert_eq!(decoded.atom_count(), 3);
    assert_eq!(decoded.bond_count(), 2);
    assert_eq!(decoded.atom_number(0), 7);
    assert_eq!(decoded.atom_number(1), 6);
    assert_eq!(decoded.atom_number(2), 6);
    assert_eq!(decoded.bonded_atoms(0).len(), 2);
}

#[test]
fn compact_and_extended() {
    trace_capture!();
    let bytes = encode(&ethanol(), true).unwrap();
    let header = Header::read(&bytes).unwrap();
    assert_eq!(
        header,
        Header {
            x_atoms: 1,
            c_atoms: 2,
            h_atoms: 6,
            x_bonds: 2,
            specials: 0,
        }
    );

    let compact = BinaryMolecule::new(&bytes).unwrap();
    assert_eq!(compact.atom_count(), 3);
    assert_eq!(compact.original_atom_count(), 9);
    assert_eq!(compact.bond_count(), 2);
    assert_eq!(compact.original_bond_count(), 8);
    // oxygen first, then the carbon with more heavy neighbours
    let hydrogens: Vec<_> = (0..3).map(|a| compact.atom_hydrogen_count(a)).collect();
    assert_eq!(hydrogens, [1, 2, 3]);

    let extended = BinaryMolecule::decode(&bytes, &DecodeOptions::compact().with_extended(true)).unwrap();
    assert_eq!(extended.atom_count(), 9);
    assert_eq!(extended.bond_count(), 8);
    assert!((3..9).all(|a| extended.is_atom_hydrogen(a)));
    assert_eq!(extended.heavy_atom_count(), 3);
    assert_eq!(extended.hydrogen_atom_count(), 6);
    assert_eq!(extended.heavy_bond_count(), 2);
    assert_eq!(extended.hydrogen_bond_count(), 6);

    let again = compact.extend().unwrap();
    assert_eq!(again.atom_count(), 9);
    assert_eq!(again.as_bytes(), bytes);
}

#[test]
fn attributes_are_opt_in() {
    trace_capture!();
    let mut graph = molecule(&[(7, 4)], &[]);
    graph[NodeIndex::new(0)].charge = 1;
    let mut methane = molecule(&[(6, 4)], &[]);
    methane[NodeIndex::new(0)].isotope = Some(13);

    let ammonium = encode(&graph, false).unwrap();
    assert_eq!(Header::read(&ammonium).unwrap().specials, 1);
    let plain = BinaryMolecule::new(&ammonium).unwrap();
    assert_eq!(plain.atom_formal_charge(0), 0);
    let charged = BinaryMolecule::decode(&ammonium, &DecodeOptions::compact().with_charges(true)).unwrap();
    assert_eq!(charged.atom_formal_charge(0), 1);

    let labelled = encode(&methane, false).unwrap();
    let decoded = BinaryMolecule::decode(&labelled, &DecodeOptions::full()).unwrap();
    assert_eq!(decoded.atom_mass(0), 8);

    let stripped = BinaryMoleculeBuilder::new(&methane)
        .with_isotopes(false)
        .as_bytes(false)
        .unwrap();
    assert_eq!(Header::read(&stripped).unwrap().specials, 0);
}

#[test]
fn isotope_range() {
    let mut graph = molecule(&[(6, 0)], &[]);
    graph[NodeIndex::new(0)].isotope = Some(4);
    let err = encode(&graph, false).unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::IsotopeOutOfRange(-1));
}

#[test]
fn malformed_payloads() {
    let bytes = encode(&ethanol(), true).unwrap();

    let err = BinaryMolecule::new(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::Truncated(1));

    let mut long = bytes.clone();
    long.push(0);
    let err = BinaryMolecule::new(&long).unwrap_err();
    assert_eq!(err, FormatError::new(bytes.len(), FormatErrorKind::TrailingBytes(1)));

    let err = BinaryMolecule::new(&[0, 1]).unwrap_err();
    assert_eq!(err, FormatError::new(2, FormatErrorKind::Truncated(8)));

    // two carbons and a bond to atom 5
    let mut bad = Vec::new();
    Header {
        c_atoms: 2,
        x_bonds: 1,
        ..Header::default()
    }
    .write(&mut bad)
    .unwrap();
    bad.extend_from_slice(&BondRecord::pack(0, 5, BondType::Single).into_bytes());
    let err = BinaryMolecule::new(&bad).unwrap_err();
    assert_eq!(err, FormatError::new(Header::SIZE, FormatErrorKind::AtomIndexOutOfRange(5)));
}

/// A payload with the given header followed by raw record bytes
fn payload(header: Header, records: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    header.write(&mut out).unwrap();
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

#[test]
fn oversized_headers() {
    let mut bytes = vec![0, 0, 0xff, 0xff, 0, 0, 0, 0, 0, 0];
    let expected = FormatError::new(0, FormatErrorKind::AtomIndexOverflow(0xfffe));
    assert_eq!(BinaryMolecule::new(&bytes).unwrap_err(), expected);
    assert_eq!(Header::split(&bytes).unwrap_err(), expected);
    assert!(scan::has_pseudo_atom(&bytes).is_err());

    // one past the last addressable atom, even with the full body present
    bytes = payload(
        Header {
            c_atoms: 4097,
            ..Header::default()
        },
        &[],
    );
    assert_eq!(
        BinaryMolecule::new(&bytes).unwrap_err().kind,
        FormatErrorKind::AtomIndexOverflow(4096)
    );

    let bytes = payload(
        Header {
            c_atoms: 4096,
            ..Header::default()
        },
        &[],
    );
    assert_eq!(BinaryMolecule::new(&bytes).unwrap().atom_count(), 4096);
}

#[test]
fn special_records_out_of_range() {
    let charge = SpecialRecord::pack(RecordKind::Charge, 500, 1).into_bytes();
    let bytes = payload(
        Header {
            c_atoms: 1,
            specials: 1,
            ..Header::default()
        },
        &[&charge],
    );
    let err = BinaryMolecule::decode(&bytes, &DecodeOptions::full()).unwrap_err();
    assert_eq!(err, FormatError::new(Header::SIZE, FormatErrorKind::AtomIndexOutOfRange(500)));
    assert!(BinaryMolecule::new(&bytes).is_err());
    assert!(scan::is_extended(&bytes, true, true).is_err());
    assert!(scan::has_charged_hydrogen(&bytes).is_err());

    let double = BondRecord::pack(0, 1, DOUBLE).into_bytes();
    let stereo = SpecialRecord::pack(RecordKind::BondStereo, 1, 1).into_bytes();
    let bytes = payload(
        Header {
            c_atoms: 2,
            x_bonds: 1,
            specials: 1,
            ..Header::default()
        },
        &[&double, &stereo],
    );
    let err = BinaryMolecule::decode(&bytes, &DecodeOptions::full()).unwrap_err();
    assert_eq!(
        err,
        FormatError::new(Header::SIZE + Header::BOND_SIZE, FormatErrorKind::BondIndexOutOfRange(1))
    );
}

#[test]
fn self_bonds() {
    let bond = BondRecord::pack(0, 0, SINGLE).into_bytes();
    let bytes = payload(
        Header {
            c_atoms: 1,
            x_bonds: 1,
            ..Header::default()
        },
        &[&bond],
    );
    let err = BinaryMolecule::new(&bytes).unwrap_err();
    assert_eq!(err, FormatError::new(Header::SIZE, FormatErrorKind::SelfBond(0)));

    // the only hydrogen names itself as host
    let hydrogen = HydrogenRecord::pack(1, SINGLE).into_bytes();
    let bytes = payload(
        Header {
            c_atoms: 1,
            h_atoms: 1,
            ..Header::default()
        },
        &[&hydrogen],
    );
    let err = BinaryMolecule::new(&bytes).unwrap_err();
    assert_eq!(err, FormatError::new(Header::SIZE, FormatErrorKind::SelfBond(1)));
}

#[test]
fn pseudo_isotopes_keep_their_mass() {
    trace_capture!();
    let mut graph = molecule(&[(6, 3)], &[]);
    let star = graph.add_node(Atom::pseudo(Pseudo::Any).with_isotope(2));
    graph.add_edge(NodeIndex::new(0), star, Bond::new(SINGLE));
    let sorted = crate::sort::sort_by_frequency(&graph);
    let view = crate::molecule::GraphView::new(&sorted);
    let bytes = encode(&graph, true).unwrap();
    let decoded = BinaryMolecule::decode(&bytes, &DecodeOptions::full()).unwrap();
    let pseudo = (0..view.atom_count())
        .find(|&a| view.atom_number(a) < 0)
        .unwrap();
    assert_eq!(view.atom_mass(pseudo), 3);
    assert_eq!(decoded.atom_number(pseudo), view.atom_number(pseudo));
    assert_eq!(decoded.atom_mass(pseudo), 3);
}

#[test]
fn extended_detection() {
    trace_capture!();
    assert!(!scan::is_extended(&encode(&ethanol(), true).unwrap(), true, true).unwrap());

    let mut wildcard = molecule(&[(6, 3)], &[]);
    let any = wildcard.add_node(Atom::pseudo(Pseudo::Any));
    wildcard.add_edge(NodeIndex::new(0), any, Bond::new(SINGLE));
    let bytes = encode(&wildcard, true).unwrap();
    assert!(scan::has_pseudo_atom(&bytes).unwrap());
    assert!(scan::is_extended(&bytes, false, false).unwrap());
    assert!(!scan::needs_extended_search(&bytes, false, false, false).unwrap());

    // diborane-like bridge: one hydrogen between two borons
    let bridged = molecule(&[(5, 2), (5, 2), (1, 0)], &[(0, 2, SINGLE), (1, 2, SINGLE)]);
    let bytes = encode(&bridged, true).unwrap();
    assert!(scan::has_multivalent_hydrogen(&bytes).unwrap());
    assert!(scan::is_extended(&bytes, false, false).unwrap());
    let decoded = BinaryMolecule::decode(&bytes, &DecodeOptions::full()).unwrap();
    assert_eq!(decoded.bonded_atoms(2).len(), 2);

    let mut protonated = molecule(&[(6, 3), (1, 0)], &[(0, 1, SINGLE)]);
    protonated[NodeIndex::new(1)].charge = 1;
    let bytes = encode(&protonated, false).unwrap();
    assert!(scan::has_charged_hydrogen(&bytes).unwrap());
    assert!(!scan::has_hydrogen_isotope(&bytes).unwrap());
    assert!(!scan::is_extended(&bytes, false, false).unwrap());
    assert!(scan::is_extended(&bytes, true, false).unwrap());
}

#[test]
fn ignored_hydrogens_stay_out_of_counts() {
    let mut graph = molecule(&[(6, 3), (1, 0)], &[(0, 1, BondType::Single)]);
    graph[NodeIndex::new(1)].isotope = Some(2);
    let bytes = encode(&graph, false).unwrap();
    assert!(scan::has_hydrogen_isotope(&bytes).unwrap());
    let counted = BinaryMolecule::new(&bytes).unwrap();
    assert_eq!(counted.atom_hydrogen_count(0), 1);
    let ignored = BinaryMolecule::decode(
        &bytes,
        &DecodeOptions::compact().with_ignore_hydrogen_isotopes(true),
    )
    .unwrap();
    assert_eq!(ignored.atom_hydrogen_count(0), 0);
}

#[test]
fn rest_hydrogen_flags() {
    let mut graph = ethanol();
    assert_eq!(BinaryMoleculeBuilder::new(&graph).rest_hydrogen_flags(), None);
    graph[NodeIndex::new(2)].rest_hydrogen = true;
    let builder = BinaryMoleculeBuilder::new(&graph);
    // the oxygen moves to the front
    assert_eq!(builder.rest_hydrogen_flags(), Some(vec![true, false, false]));
    let bytes = builder.as_bytes(false).unwrap();
    let decoded = BinaryMolecule::new(&bytes).unwrap().with_rest_hydrogen_flags(&[true]);
    assert!(decoded.has_rest_hydrogen_flags());
    assert!(decoded.atom_rest_hydrogen_flag(0));
    assert!(!decoded.atom_rest_hydrogen_flag(2));
}
