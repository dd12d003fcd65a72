use super::*;
use crate::sort::*;

#[test]
fn rare_elements_first() {
    // C-C-O with an explicit hydrogen on the oxygen
    let graph = molecule(
        &[(6, 3), (6, 2), (8, 0), (1, 0)],
        &[(0, 1, SINGLE), (1, 2, SINGLE), (2, 3, SINGLE)],
    );
    let order: Vec<_> = frequency_order(&graph).into_iter().map(|ix| ix.index()).collect();
    assert_eq!(order, [2, 1, 0, 3]);
    assert!(!is_frequency_sorted(&graph));

    let sorted = sort_by_frequency(&graph);
    assert!(is_frequency_sorted(&sorted));
    assert_eq!(sorted[NodeIndex::new(0)].kind, AtomKind::Element(8));
    assert_eq!(sorted[NodeIndex::new(3)].kind, AtomKind::HYDROGEN);
    assert_eq!(sorted.edge_count(), 3);
    assert!(sorted.contains_edge(NodeIndex::new(0), NodeIndex::new(3)));
}

#[test]
fn pseudo_atoms_share_a_bucket() {
    let mut graph = molecule(&[(6, 0), (7, 0), (7, 0)], &[(0, 1, SINGLE), (0, 2, SINGLE)]);
    let a = graph.add_node(Atom::pseudo(Pseudo::Any));
    let b = graph.add_node(Atom::pseudo(Pseudo::Halogen));
    let c = graph.add_node(Atom::pseudo(Pseudo::Metal));
    for ix in [a, b, c] {
        graph.add_edge(NodeIndex::new(0), ix, Bond::new(SINGLE));
    }
    let sorted = sort_by_frequency(&graph);
    let kinds: Vec<_> = sorted.node_weights().map(|a| a.kind).collect();
    // two nitrogens beat three pseudo atoms, carbon always goes last
    assert_eq!(kinds[0], AtomKind::Element(7));
    assert_eq!(kinds[1], AtomKind::Element(7));
    assert!(kinds[2..5].iter().all(|k| k.is_pseudo()));
    assert_eq!(kinds[5], AtomKind::CARBON);
}

#[test]
fn configurations_follow_their_atoms() {
    let mut graph = molecule(
        &[(6, 1), (9, 0), (17, 0), (35, 0)],
        &[(0, 1, SINGLE), (0, 2, SINGLE), (0, 3, SINGLE)],
    );
    let ix = NodeIndex::new;
    graph[ix(0)].configuration = Some(AtomConfiguration {
        ligands: [ix(1), ix(2), ix(3), ix(0)],
        winding: Winding::Clockwise,
    });
    let sorted = sort_by_frequency(&graph);
    let centre = ix(3);
    assert!(sorted[centre].kind.is_carbon());
    let config = sorted[centre].configuration.unwrap();
    assert_eq!(config.ligands, [ix(0), ix(1), ix(2), centre]);
}
