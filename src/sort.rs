//! Frequency ordering of atoms.
//!
//! Rare elements come first so that the matcher hits its most selective atoms early, carbon comes
//! second to last and hydrogen last so the binary layout can leave both implicit.

use crate::core::*;
use ahash::AHashMap;
use petgraph::prelude::*;
use std::cmp::Ordering;

/// Elements are counted per atomic number, every pseudo atom shares one bucket.
fn frequency_key(kind: AtomKind) -> i8 {
    match kind {
        AtomKind::Element(n) => n as i8,
        AtomKind::Pseudo(_) => 0,
    }
}

/// Rank of an atom's bucket: everything else, then carbon, then hydrogen
fn bucket(kind: AtomKind) -> u8 {
    if kind.is_hydrogen() {
        2
    } else if kind.is_carbon() {
        1
    } else {
        0
    }
}

/// Returns the node indices of `graph` in frequency order.
///
/// The sort is stable, so an already sorted graph maps onto itself.
pub fn frequency_order(graph: &MoleculeGraph) -> Vec<NodeIndex> {
    let mut element_counts = AHashMap::<i8, usize>::new();
    for atom in graph.node_weights() {
        *element_counts.entry(frequency_key(atom.kind)).or_default() += 1;
    }
    let mut participation = vec![0usize; graph.node_count()];
    for edge in graph.edge_references() {
        let (a, b) = (edge.source(), edge.target());
        if graph[a].kind.is_hydrogen() || graph[b].kind.is_hydrogen() {
            continue;
        }
        participation[a.index()] += 1;
        participation[b.index()] += 1;
    }
    let mut order = graph.node_indices().collect::<Vec<_>>();
    order.sort_by(|&l, &r| {
        let (lk, rk) = (graph[l].kind, graph[r].kind);
        bucket(lk).cmp(&bucket(rk)).then_with(|| {
            let lc = element_counts[&frequency_key(lk)];
            let rc = element_counts[&frequency_key(rk)];
            match lc.cmp(&rc) {
                Ordering::Equal => participation[r.index()].cmp(&participation[l.index()]),
                o => o,
            }
        })
    });
    order
}

/// Whether the graph is already in frequency order
pub fn is_frequency_sorted(graph: &MoleculeGraph) -> bool {
    frequency_order(graph)
        .iter()
        .enumerate()
        .all(|(i, ix)| ix.index() == i)
}

/// Rebuild `graph` with its atoms in frequency order.
///
/// Edges keep their relative order, and stereo declarations follow their atoms.
pub fn sort_by_frequency(graph: &MoleculeGraph) -> MoleculeGraph {
    let order = frequency_order(graph);
    let mut position = vec![NodeIndex::end(); graph.node_count()];
    for (new, old) in order.iter().enumerate() {
        position[old.index()] = NodeIndex::new(new);
    }
    let remap = |ix: NodeIndex| position[ix.index()];
    let mut out = MoleculeGraph::with_capacity(graph.node_count(), graph.edge_count());
    for &old in &order {
        let mut atom = graph[old];
        if let Some(config) = &mut atom.configuration {
            config.ligands = config.ligands.map(remap);
        }
        out.add_node(atom);
    }
    for edge in graph.edge_references() {
        let mut bond = *edge.weight();
        if let Some(config) = &mut bond.configuration {
            config.ligands = config.ligands.map(remap);
        }
        out.add_edge(remap(edge.source()), remap(edge.target()), bond);
    }
    out
}
