use super::macros::*;
use super::*;
use crate::fingerprint::*;
use crate::molecule::Molecule;

fn index_fingerprint(graph: &MoleculeGraph) -> Fingerprint {
    substructure_fingerprint(&round_trip(graph, &DecodeOptions::compact()), &FingerprintOptions::index())
}

#[test]
fn subgraph_enumeration() {
    trace_capture!();
    let propane = bare(&propane());
    assert_eq!(subgraph::find_subgraphs(&propane, 1, 7).len(), 3);
    assert_eq!(subgraph::find_subgraphs(&propane, 2, 7).len(), 1);

    // isobutane: three single bonds, three pairs, the whole star
    let isobutane = bare(&molecule(
        &[(6, 1), (6, 3), (6, 3), (6, 3)],
        &[(0, 1, SINGLE), (0, 2, SINGLE), (0, 3, SINGLE)],
    ));
    let mut found = subgraph::find_subgraphs(&isobutane, 1, 7);
    assert_eq!(found.len(), 7);
    for subgraph in &mut found {
        subgraph.sort_unstable();
    }
    found.sort();
    found.dedup();
    assert_eq!(found.len(), 7);
}

#[test]
fn subgraph_hashes() {
    let ring = bare(&benzene());
    let bonds: Vec<_> = (0..ring.bond_count()).collect();
    let whole = subgraph::hash_subgraph(&ring, &bonds);
    assert!(whole.is_some());
    let mut reversed = bonds.clone();
    reversed.reverse();
    assert_eq!(subgraph::hash_subgraph(&ring, &reversed), whole);

    // the same three-bond path, wherever it sits in the ring
    let paths: Vec<_> = (0..ring.bond_count())
        .map(|start| {
            let path: Vec<_> = (0..3).map(|i| (start + i) % 6).collect();
            let path: Vec<_> = path
                .iter()
                .map(|&i| ring.bond(i, (i + 1) % 6).unwrap_or(usize::MAX))
                .collect();
            subgraph::hash_subgraph(&ring, &path)
        })
        .collect();
    assert!(paths.iter().all(|h| h.is_some() && *h == paths[0]));
    assert_ne!(paths[0], whole);

    // two fused rings reduce to neither a tree nor a cycle
    let mut bonds: Vec<_> = (0..10).map(|i| (i, (i + 1) % 10, SINGLE)).collect();
    bonds.push((0, 5, SINGLE));
    let decalin = bare(&molecule(&[(6, 0); 10], &bonds));
    let all: Vec<_> = (0..decalin.bond_count()).collect();
    assert_eq!(subgraph::hash_subgraph(&decalin, &all), None);
}

#[test]
fn atom_order_does_not_matter() {
    trace_capture!();
    let forward = molecule(
        &[(6, 3), (6, 2), (7, 1), (6, 2), (8, 1)],
        &[(0, 1, SINGLE), (1, 2, SINGLE), (2, 3, SINGLE), (3, 4, SINGLE)],
    );
    let backward = molecule(
        &[(8, 1), (6, 2), (7, 1), (6, 2), (6, 3)],
        &[(0, 1, SINGLE), (1, 2, SINGLE), (2, 3, SINGLE), (3, 4, SINGLE)],
    );
    assert_eq!(index_fingerprint(&forward), index_fingerprint(&backward));
    let fp = |g: &MoleculeGraph| similarity_fingerprint(&bare(g), 3);
    assert_eq!(fp(&forward), fp(&backward));
}

#[test]
fn query_features_are_in_the_target() {
    trace_capture!();
    let query = substructure_fingerprint(&bare(&benzene()), &FingerprintOptions::query());
    assert!(query.has_provenance());
    let target = index_fingerprint(&phenol());
    assert!(!target.has_provenance());
    for feature in query.iter() {
        assert!(target.contains(feature), "missing feature {feature}");
        assert!(query.atoms(feature).is_some_and(|atoms| !atoms.is_empty()));
    }
    let unrelated = index_fingerprint(&ethanol());
    assert!(query.iter().any(|f| !unrelated.contains(f)));
}

#[test]
fn motifs() {
    trace_capture!();
    assert_eq!(pattern::library().len(), pattern::MOTIFS.len());
    assert!(pattern::library().iter().all(Option::is_some));

    let key = |name: &str| {
        pattern::MOTIFS
            .iter()
            .position(|m| m.name == name)
            .unwrap_or(usize::MAX) as u32
    };
    let acid = pattern::features(&round_trip(&acetic_acid(), &DecodeOptions::compact()), true);
    assert_eq!(acid.count(key("carboxylic acid")), 1);
    assert_eq!(acid.count(key("carbonyl")), 1);
    assert_eq!(acid.count(key("hydroxyl")), 1);
    assert_eq!(acid.count(key("aldehyde")), 0);
    assert_eq!(acid.atoms(key("carboxylic acid")).map(|a| a.len()), Some(3));

    let ring = pattern::features(&round_trip(&pyridine(), &DecodeOptions::compact()), false);
    assert_eq!(ring.count(key("heteroaromatic ring")), 1);
    assert_eq!(ring.count(key("benzene ring")), 0);
}

#[test]
fn similarity() {
    let ethanol = similarity_fingerprint(&bare(&ethanol()), 3);
    assert_eq!(ethanol.segments().len(), 4);
    assert_eq!(ethanol.segments()[0].len(), 3);
    assert_eq!(ethanol.similarity(&ethanol), 1.0);
    assert_eq!(
        ethanol.cumulative_sizes().last().copied(),
        Some(ethanol.len())
    );

    let propane = similarity_fingerprint(&bare(&propane()), 3);
    let score = ethanol.similarity(&propane);
    assert!(score > 0.0 && score < 1.0, "{score}");
    assert_eq!(score, propane.similarity(&ethanol));

    let empty = SimilarityFingerprint::default();
    assert_eq!(empty.similarity(&empty), 1.0);
    assert_eq!(empty.similarity(&ethanol), 0.0);
}

#[test]
fn query_counts_use_the_top_bucket() {
    let chain = bare(&carbon_chain(5));
    let index = substructure_fingerprint(&chain, &FingerprintOptions::index());
    let query = substructure_fingerprint(&chain, &FingerprintOptions::query());
    // five carbons: buckets for 1, 2 and 4
    let atom = |c| hash3(3, c, 6);
    assert!(index.contains(atom(0)) && index.contains(atom(1)) && index.contains(atom(2)));
    assert!(!query.contains(atom(0)) && !query.contains(atom(1)) && query.contains(atom(2)));
}
