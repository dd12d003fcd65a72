use super::macros::*;
use super::*;
use crate::config::*;
use crate::isomorphism::*;
use crate::molecule::GraphView;
use crate::search::{Score, SubstructureQuery};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn target(graph: &MoleculeGraph) -> BinaryMolecule {
    round_trip(graph, &DecodeOptions::compact())
}

#[test]
fn carbon_pair_in_ethanol() {
    trace_capture!();
    let iso = Isomorphism::new(bare(&carbon_chain(2)));
    let ethanol = target(&ethanol());
    assert!(iso.matches(&ethanol));
    let all = iso.match_all(&ethanol, 0);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], [1, 2]);
    assert_eq!(iso.match_all(&ethanol, 1).len(), 1);
}

#[test]
fn distinct_images() {
    let iso = Isomorphism::new(bare(&carbon_chain(2)));
    let propane = target(&propane());
    assert_eq!(iso.match_all(&propane, 0).len(), 2);
    assert_eq!(iso.match_all(&propane, 1).len(), 1);

    // every rotation of the ring covers the same atoms
    let ring = Isomorphism::new(bare(&benzene()));
    assert_eq!(ring.match_all(&target(&benzene()), 0).len(), 1);
}

#[test]
fn no_match() {
    let methanol = target(&molecule(&[(6, 3), (8, 1)], &[(0, 1, SINGLE)]));
    let iso = Isomorphism::new(bare(&carbon_chain(2)));
    assert!(!iso.matches(&methanol));
    assert!(iso.match_all(&methanol, 0).is_empty());

    // aromatic bonds aren't single bonds
    assert!(!iso.matches(&target(&benzene())));
}

#[test]
fn exact_needs_the_whole_target() {
    let ethane = molecule(&[(6, 3), (6, 3)], &[(0, 1, BondType::Single)]);
    let exact = Isomorphism::new(target(&ethane)).with_search(SearchMode::Exact);
    assert_eq!(exact.search_mode(), SearchMode::Exact);
    assert!(exact.matches(&target(&ethane)));
    assert!(!exact.matches(&target(&ethanol())));
    assert!(!exact.matches(&target(&propane())));
}

#[test]
fn hydrogen_counts_are_minimums() {
    let iso = Isomorphism::new(target(&benzene()));
    assert!(iso.matches(&target(&benzene())));
    // the substituted carbon has lost its hydrogen
    assert!(!iso.matches(&target(&phenol())));
    assert!(Isomorphism::new(bare(&benzene())).matches(&target(&phenol())));
}

#[test]
fn query_bonds_and_wildcards() {
    let either = molecule(&[(6, 0), (8, 0)], &[(0, 1, SINGLE_OR_DOUBLE)]);
    let iso = Isomorphism::new(GraphView::new(&either));
    assert!(iso.matches(&target(&acetic_acid())));
    assert!(iso.matches(&target(&ethanol())));

    let mut halide = molecule(&[(6, 0)], &[]);
    let x = halide.add_node(Atom::pseudo(Pseudo::Halogen));
    halide.add_edge(NodeIndex::new(0), x, Bond::new(SINGLE));
    let iso = Isomorphism::new(GraphView::new(&halide));
    let chloromethane = molecule(&[(6, 3), (17, 0)], &[(0, 1, SINGLE)]);
    assert!(iso.matches(&target(&chloromethane)));
    assert!(!iso.matches(&target(&ethanol())));
}

#[test]
fn charge_modes() {
    let mut ammonium = molecule(&[(7, 4)], &[]);
    ammonium[NodeIndex::new(0)].charge = 1;
    let options = DecodeOptions::compact().with_charges(true);
    let ammonium = round_trip(&ammonium, &options);
    let nitrogen = BinaryMolecule::decode(&crate::codec::encode(&molecule(&[(7, 0)], &[]), false).unwrap(), &options)
        .unwrap();

    let iso = Isomorphism::new(nitrogen);
    assert!(iso.clone().with_charge(ChargeMode::Ignore).matches(&ammonium));
    assert!(iso.clone().with_charge(ChargeMode::DefaultAsAny).matches(&ammonium));
    assert!(!iso.with_charge(ChargeMode::DefaultAsUncharged).matches(&ammonium));
}

#[test]
fn budgets() {
    trace_capture!();
    let iso = Isomorphism::new(bare(&benzene()));
    let ring = target(&benzene());

    let mut budget = Budget::unlimited();
    assert_eq!(iso.match_with_budget(&ring, &mut budget), MatchOutcome::Match);
    assert!(budget.trials() >= 6);

    let mut budget = Budget::iterations(2);
    assert_eq!(iso.match_with_budget(&ring, &mut budget), MatchOutcome::BudgetExceeded);
    assert!(iso.match_all_with_budget(&ring, 0, &mut Budget::iterations(2)).is_err());

    let flag = Arc::new(AtomicBool::new(true));
    let mut budget = Budget::unlimited().with_cancel_flag(flag);
    assert_eq!(iso.match_with_budget(&ring, &mut budget), MatchOutcome::BudgetExceeded);
    assert!(!MatchOutcome::BudgetExceeded.is_match());
}

#[test]
fn rest_hydrogen() {
    let mut capped = carbon_chain(2);
    for atom in capped.node_weights_mut() {
        atom.rest_hydrogen = true;
    }
    let query = SubstructureQuery::new(&capped, &SearchConfig::new()).unwrap();
    let ethane = molecule(&[(6, 3), (6, 3)], &[(0, 1, BondType::Single)]);
    let score = |graph: &MoleculeGraph| query.score(&crate::codec::encode(graph, true).unwrap()).unwrap();
    assert!(score(&ethane).is_match());
    assert_eq!(score(&propane()), Score::NoMatch);
}

/// Bromochlorofluoromethane with the given winding around `F, Cl, Br, H`
fn halomethane(winding: Winding) -> MoleculeGraph {
    let mut graph = molecule(
        &[(6, 1), (9, 0), (17, 0), (35, 0)],
        &[(0, 1, SINGLE), (0, 2, SINGLE), (0, 3, SINGLE)],
    );
    let ix = NodeIndex::new;
    graph[ix(0)].configuration = Some(AtomConfiguration {
        ligands: [ix(1), ix(2), ix(3), ix(0)],
        winding,
    });
    graph
}

#[test]
fn enantiomers() {
    trace_capture!();
    let left = halomethane(Winding::Clockwise);
    let right = halomethane(Winding::AntiClockwise);
    let right_bytes = crate::codec::encode(&right, true).unwrap();

    let strict = SubstructureQuery::new(&left, &SearchConfig::strict_exact()).unwrap();
    assert!(strict.score(&crate::codec::encode(&left, true).unwrap()).unwrap().is_match());
    assert_eq!(strict.score(&right_bytes).unwrap(), Score::NoMatch);

    let relaxed = SearchConfig::strict_exact().with_stereo(StereoMode::Ignore);
    let relaxed = SubstructureQuery::new(&left, &relaxed).unwrap();
    assert!(relaxed.score(&right_bytes).unwrap().is_match());
}

#[test]
fn undeclared_stereo_matches_anything() {
    let declared = halomethane(Winding::Clockwise);
    let mut undeclared = declared.clone();
    undeclared[NodeIndex::new(0)].configuration = None;
    let query = SubstructureQuery::new(&undeclared, &SearchConfig::strict_exact()).unwrap();
    assert!(query
        .score(&crate::codec::encode(&declared, true).unwrap())
        .unwrap()
        .is_match());
}
