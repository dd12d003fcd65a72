//! VF2-style substructure and exact matching over the [`Molecule`] contract.
//!
//! An [`Isomorphism`] holds everything that only depends on the query (the visiting order and the
//! parent of every query atom in that order), so it can be shared between threads and reused for
//! any number of targets. Every match call builds its own private state.

use crate::config::*;
use crate::core::*;
use crate::molecule::{Molecule, MAX_ATOM_IDX};
use crate::stereo::{normalize_atom_stereo, normalize_bond_stereo, PairParity};
use ahash::AHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::*;

const UNMAPPED: usize = usize::MAX;

/// How often the wall clock is looked at, in candidate pairs
const DEADLINE_INTERVAL: u64 = 1024;

/// A match was abandoned because its budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("the match budget was exhausted before the search finished")]
pub struct BudgetExceeded;

/// Result of a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    Match,
    /// The whole search space was explored
    NoMatch,
    /// The search was cut short, nothing is known about the target
    BudgetExceeded,
}
impl MatchOutcome {
    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

/// Limits on how much work a match may do.
///
/// Every candidate pair the matcher tries counts as one step. A budget may be reused across
/// several calls, in which case the steps add up.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    iterations: Option<u64>,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
    trials: u64,
}
impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }
    pub fn iterations(limit: u64) -> Self {
        Self::default().with_iterations(limit)
    }
    pub fn deadline(at: Instant) -> Self {
        Self::default().with_deadline(at)
    }
    /// The limits a search configuration asks for, starting now
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            iterations: config.iteration_limit,
            deadline: config.time_limit.map(|d| Instant::now() + d),
            ..Self::default()
        }
    }
    pub fn with_iterations(mut self, limit: u64) -> Self {
        self.iterations = Some(limit);
        self
    }
    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }
    /// Abort as soon as `flag` is set, from any thread
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
    /// Candidate pairs tried so far
    pub fn trials(&self) -> u64 {
        self.trials
    }

    #[inline]
    fn tick(&mut self) -> Result<(), BudgetExceeded> {
        self.trials += 1;
        if self.iterations.is_some_and(|limit| self.trials > limit) {
            return Err(BudgetExceeded);
        }
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(BudgetExceeded);
        }
        if self.trials % DEADLINE_INTERVAL == 0
            && self.deadline.is_some_and(|at| Instant::now() >= at)
        {
            return Err(BudgetExceeded);
        }
        Ok(())
    }
}

/// Matcher for one query molecule
#[derive(Debug, Clone)]
pub struct Isomorphism<Q> {
    query: Q,
    order: Vec<usize>,
    parents: Vec<Option<usize>>,
    search: SearchMode,
    charge: ChargeMode,
    isotope: IsotopeMode,
    radical: RadicalMode,
    stereo: StereoMode,
}
impl<Q: Molecule> Isomorphism<Q> {
    /// A substructure matcher that ignores charges, isotopes, radicals and stereo
    #[instrument(level = "trace", skip_all)]
    pub fn new(query: Q) -> Self {
        let n = query.atom_count();
        let mut order = Vec::with_capacity(n);
        let mut parents = vec![None; n];
        // 0: unseen, 1: next to a visited atom, 2: visited
        let mut flags = vec![0u8; n];
        for _ in 0..n {
            let selected = flags
                .iter()
                .position(|&f| f == 1)
                .or_else(|| flags.iter().position(|&f| f == 0));
            let Some(selected) = selected else {
                break;
            };
            flags[selected] = 2;
            for &other in query.bonded_atoms(selected) {
                if flags[other] == 0 {
                    flags[other] = 1;
                    parents[other] = Some(selected);
                }
            }
            order.push(selected);
        }
        Self {
            query,
            order,
            parents,
            search: SearchMode::Substructure,
            charge: ChargeMode::Ignore,
            isotope: IsotopeMode::Ignore,
            radical: RadicalMode::Ignore,
            stereo: StereoMode::Ignore,
        }
    }
    /// A matcher with the modes of `config`
    pub fn with_config(query: Q, config: &SearchConfig) -> Self {
        Self::new(query)
            .with_search(config.search)
            .with_charge(config.charge)
            .with_isotope(config.isotope)
            .with_radical(config.radical)
            .with_stereo(config.stereo)
    }
    pub fn with_search(mut self, search: SearchMode) -> Self {
        self.search = search;
        self
    }
    pub fn with_charge(mut self, charge: ChargeMode) -> Self {
        self.charge = charge;
        self
    }
    pub fn with_isotope(mut self, isotope: IsotopeMode) -> Self {
        self.isotope = isotope;
        self
    }
    pub fn with_radical(mut self, radical: RadicalMode) -> Self {
        self.radical = radical;
        self
    }
    pub fn with_stereo(mut self, stereo: StereoMode) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn query(&self) -> &Q {
        &self.query
    }
    pub fn into_query(self) -> Q {
        self.query
    }
    pub fn search_mode(&self) -> SearchMode {
        self.search
    }
    /// Query atoms in the order they get mapped
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Whether the query can be mapped onto `target`
    pub fn matches<T: Molecule>(&self, target: &T) -> bool {
        self.match_with_budget(target, &mut Budget::unlimited())
            .is_match()
    }

    pub fn match_with_budget<T: Molecule>(&self, target: &T, budget: &mut Budget) -> MatchOutcome {
        match self.run(target, 1, budget) {
            Ok(found) if found.is_empty() => MatchOutcome::NoMatch,
            Ok(_) => MatchOutcome::Match,
            Err(BudgetExceeded) => MatchOutcome::BudgetExceeded,
        }
    }

    /// Distinct sets of target atoms the query maps onto, each sorted, at most `limit` of them.
    ///
    /// A `limit` of 0 collects every match.
    pub fn match_all<T: Molecule>(&self, target: &T, limit: usize) -> Vec<Vec<usize>> {
        self.run(target, limit, &mut Budget::unlimited())
            .unwrap_or_default()
    }

    pub fn match_all_with_budget<T: Molecule>(
        &self,
        target: &T,
        limit: usize,
        budget: &mut Budget,
    ) -> Result<Vec<Vec<usize>>, BudgetExceeded> {
        self.run(target, limit, budget)
    }

    /// Counts that have to line up before trying any mapping
    fn sizes_compatible<T: Molecule>(&self, target: &T) -> bool {
        let q = &self.query;
        let pairs = [
            (q.original_atom_count(), target.original_atom_count()),
            (q.original_bond_count(), target.original_bond_count()),
            (q.atom_count(), target.atom_count()),
            (q.bond_count(), target.bond_count()),
        ];
        match self.search {
            SearchMode::Exact => pairs.iter().all(|(q, t)| q == t),
            SearchMode::Substructure => pairs.iter().all(|(q, t)| q <= t),
        }
    }

    #[instrument(level = "trace", skip_all)]
    fn run<T: Molecule>(
        &self,
        target: &T,
        limit: usize,
        budget: &mut Budget,
    ) -> Result<Vec<Vec<usize>>, BudgetExceeded> {
        if !self.sizes_compatible(target) {
            trace!("sizes rule out a match");
            return Ok(Vec::new());
        }
        let mut state = Vf2State::new(self, target);
        let mut found = Vec::new();
        let mut seen = AHashSet::new();
        // true once enough distinct matches were collected
        let mut record = |image: Vec<usize>| {
            if seen.insert(image.clone()) {
                found.push(image);
            }
            limit != 0 && found.len() >= limit
        };

        if self.order.is_empty() {
            if state.is_match_valid() {
                record(Vec::new());
            }
            return Ok(found);
        }

        let mut stack = vec![Frame::Outer];
        while let Some(frame) = stack.pop() {
            let (query, cursor) = match frame {
                Frame::Outer => (self.order[state.depth], 0),
                Frame::Inner { query, cursor } => (query, cursor),
                Frame::Unwind {
                    query,
                    target,
                    cursor,
                } => {
                    state.pop_pair(query, target);
                    (query, cursor)
                }
            };
            let Some((candidate, cursor)) = state.next_candidate(query, cursor) else {
                continue;
            };
            budget.tick()?;
            if state.is_feasible(query, candidate) {
                state.push_pair(query, candidate);
                stack.push(Frame::Unwind {
                    query,
                    target: candidate,
                    cursor,
                });
                if state.depth == self.order.len() {
                    if state.is_match_valid() && record(state.sorted_image()) {
                        break;
                    }
                } else {
                    stack.push(Frame::Outer);
                }
            } else {
                stack.push(Frame::Inner { query, cursor });
            }
        }
        trace!(found = found.len(), trials = budget.trials(), "search finished");
        Ok(found)
    }
}

fn heavy_neighbours<M: Molecule>(molecule: &M, atom: usize) -> usize {
    molecule
        .bonded_atoms(atom)
        .iter()
        .filter(|&&n| !molecule.is_atom_hydrogen(n))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Pick the next query atom
    Outer,
    /// Try the candidates for `query` starting at `cursor`
    Inner { query: usize, cursor: usize },
    /// Undo the pair, then keep trying candidates for `query`
    Unwind {
        query: usize,
        target: usize,
        cursor: usize,
    },
}

/// Mutable matching state, private to a single call
struct Vf2State<'a, Q, T> {
    iso: &'a Isomorphism<Q>,
    query: &'a Q,
    target: &'a T,
    query_core: Vec<usize>,
    target_core: Vec<usize>,
    depth: usize,
}
impl<'a, Q: Molecule, T: Molecule> Vf2State<'a, Q, T> {
    fn new(iso: &'a Isomorphism<Q>, target: &'a T) -> Self {
        Self {
            iso,
            query: &iso.query,
            target,
            query_core: vec![UNMAPPED; iso.query.atom_count()],
            target_core: vec![UNMAPPED; target.atom_count()],
            depth: 0,
        }
    }

    fn push_pair(&mut self, query: usize, target: usize) {
        self.query_core[query] = target;
        self.target_core[target] = query;
        self.depth += 1;
    }
    fn pop_pair(&mut self, query: usize, target: usize) {
        self.query_core[query] = UNMAPPED;
        self.target_core[target] = UNMAPPED;
        self.depth -= 1;
    }

    /// Next unmapped target atom for `query`: a neighbour of its parent's image if it has a
    /// parent, any atom otherwise. Returns the candidate and the cursor to resume from.
    fn next_candidate(&self, query: usize, cursor: usize) -> Option<(usize, usize)> {
        match self.iso.parents[query] {
            Some(parent) => {
                let list = self.target.bonded_atoms(self.query_core[parent]);
                (cursor..list.len())
                    .find(|&i| self.target_core[list[i]] == UNMAPPED)
                    .map(|i| (list[i], i + 1))
            }
            None => (cursor..self.target.atom_count())
                .find(|&t| self.target_core[t] == UNMAPPED)
                .map(|t| (t, t + 1)),
        }
    }

    fn atom_matches(&self, q: usize, t: usize) -> bool {
        let (query, target) = (self.query.atom_kind(q), self.target.atom_kind(t));
        match (query, target) {
            (AtomKind::Pseudo(Pseudo::Unknown), _) | (_, AtomKind::Pseudo(Pseudo::Unknown)) => false,
            (q, t) if q == t => true,
            (AtomKind::Pseudo(Pseudo::Any), _) => true,
            (AtomKind::Pseudo(Pseudo::Hetero), AtomKind::Pseudo(p)) => {
                matches!(p, Pseudo::Metal | Pseudo::Halogen)
            }
            (_, AtomKind::Pseudo(_)) => false,
            (AtomKind::Pseudo(Pseudo::Hetero), t) => !t.is_carbon() && !t.is_hydrogen(),
            (AtomKind::Pseudo(Pseudo::Metal), t) => t.is_metal(),
            (AtomKind::Pseudo(Pseudo::Halogen), t) => t.is_halogen(),
            _ => false,
        }
    }

    fn bond_matches(&self, q0: usize, q1: usize, t0: usize, t1: usize) -> bool {
        match (self.query.bond(q0, q1), self.target.bond(t0, t1)) {
            (Some(qb), Some(tb)) => self
                .query
                .bond_type(qb)
                .accepts(self.target.bond_type(tb)),
            _ => false,
        }
    }

    fn is_feasible(&self, q: usize, t: usize) -> bool {
        let (query, target, iso) = (self.query, self.target, self.iso);
        if !self.atom_matches(q, t) {
            return false;
        }
        if iso.charge != ChargeMode::Ignore {
            let (qc, tc) = (query.atom_formal_charge(q), target.atom_formal_charge(t));
            if qc != tc && (qc != 0 || iso.charge == ChargeMode::DefaultAsUncharged) {
                return false;
            }
        }
        if iso.isotope != IsotopeMode::Ignore {
            let (qm, tm) = (query.atom_mass(q), target.atom_mass(t));
            if qm != tm && (qm != 0 || iso.isotope == IsotopeMode::DefaultAsStandard) {
                return false;
            }
        }
        if iso.radical != RadicalMode::Ignore {
            let (qr, tr) = (query.atom_radical(q), target.atom_radical(t));
            if qr != tr && (qr != Radical::None || iso.radical == RadicalMode::DefaultAsStandard) {
                return false;
            }
        }
        // hydrogen counts mean nothing next to wildcards
        if !query.has_pseudo_atom() && !target.has_pseudo_atom() {
            let (qh, th) = (query.atom_hydrogen_count(q), target.atom_hydrogen_count(t));
            let ok = match iso.search {
                SearchMode::Exact => qh == th,
                SearchMode::Substructure => qh <= th,
            };
            if !ok {
                return false;
            }
        }

        let mut new_query = 0;
        for &other in query.bonded_atoms(q) {
            match self.query_core[other] {
                UNMAPPED => new_query += 1,
                mapped => {
                    if !self.bond_matches(q, other, t, mapped) {
                        return false;
                    }
                }
            }
        }
        let mut new_target = 0;
        for &other in target.bonded_atoms(t) {
            match self.target_core[other] {
                UNMAPPED => new_target += 1,
                mapped => {
                    if iso.search == SearchMode::Exact && !self.bond_matches(q, mapped, t, other) {
                        return false;
                    }
                }
            }
        }
        match iso.search {
            SearchMode::Exact => new_query == new_target,
            SearchMode::Substructure => new_query <= new_target,
        }
    }

    /// Mapped target atoms in ascending order
    fn sorted_image(&self) -> Vec<usize> {
        let mut image = self.query_core.clone();
        image.sort_unstable();
        image
    }

    /// Checks that only make sense on a complete mapping
    fn is_match_valid(&self) -> bool {
        if self.query.has_rest_hydrogen_flags() {
            for q in 0..self.query.atom_count() {
                if !self.query.atom_rest_hydrogen_flag(q) {
                    continue;
                }
                let t = self.query_core[q];
                let query_heavy = heavy_neighbours(self.query, q);
                let target_heavy = heavy_neighbours(self.target, t);
                if target_heavy > query_heavy {
                    return false;
                }
            }
        }
        self.iso.stereo != StereoMode::Strict || self.is_stereo_valid()
    }

    /// Follow a cumulated chain from `atom` through `bonded` to its terminal.
    ///
    /// Returns the terminal, the atom before it, and the terminal's two outer ligands, the second
    /// being [`MAX_ATOM_IDX`] when there is only one.
    fn walk_to_terminal(&self, mut atom: usize, mut bonded: usize) -> Option<(usize, usize, [usize; 2])> {
        let query = self.query;
        for _ in 0..query.atom_count() {
            match *query.bonded_atoms(bonded) {
                [a, b, c] => {
                    let mut others = [a, b, c].into_iter().filter(|&o| o != atom);
                    let first = others.next()?;
                    let second = others.next()?;
                    return Some((bonded, atom, [first, second]));
                }
                [_, _] => {
                    let next = query.opposite_atom(bonded, atom)?;
                    let double = query
                        .bond(bonded, next)
                        .is_some_and(|b| query.bond_type(b) == BondType::Double);
                    if !double {
                        return Some((bonded, atom, [next, MAX_ATOM_IDX]));
                    }
                    atom = bonded;
                    bonded = next;
                }
                _ => return None,
            }
        }
        None
    }

    /// Pair up the ligands of two chain terminals in the target and bring the stored parity into
    /// the query's order
    fn normalized_pair_parity<P: PairParity>(
        &self,
        mut ligands: [usize; 4],
        ends: [(usize, usize); 2],
        stereo: P,
    ) -> P {
        if ligands[0] > ligands[1] {
            ligands.swap(0, 1);
        }
        if ligands[2] > ligands[3] {
            ligands.swap(2, 3);
        }
        let mut targets = ligands.map(|l| if l == MAX_ATOM_IDX { UNMAPPED } else { self.query_core[l] });
        let [(term0, pre0), (term1, pre1)] = ends.map(|(t, p)| (self.query_core[t], self.query_core[p]));
        if ligands[1] == MAX_ATOM_IDX {
            targets[1] = self.target.last_stereo_bond_ligand(term0, pre0, targets[0]);
        }
        if ligands[3] == MAX_ATOM_IDX {
            targets[3] = self.target.last_stereo_bond_ligand(term1, pre1, targets[2]);
        }
        normalize_bond_stereo(&targets, stereo)
    }

    fn is_stereo_valid(&self) -> bool {
        let (query, target) = (self.query, self.target);
        for q in 0..query.atom_count() {
            let query_stereo = query.atom_stereo(q);
            let target_stereo = target.atom_stereo(self.query_core[q]);
            if !query_stereo.is_defined() || !target_stereo.is_defined() {
                continue;
            }
            if query.is_extended_tetrahedral_centre(q) {
                let list = query.bonded_atoms(q);
                let (Some(left), Some(right)) = (
                    self.walk_to_terminal(q, list[0]),
                    self.walk_to_terminal(q, list[1]),
                ) else {
                    continue;
                };
                let ligands = [left.2[0], left.2[1], right.2[0], right.2[1]];
                let ends = [(left.0, left.1), (right.0, right.1)];
                if self.normalized_pair_parity(ligands, ends, target_stereo) != query_stereo {
                    trace!(atom = q, "allene parity differs");
                    return false;
                }
            } else {
                let list = query.bonded_atoms(q);
                if !(3..=4).contains(&list.len()) {
                    continue;
                }
                let mut ligands = [MAX_ATOM_IDX; 4];
                ligands[..list.len()].copy_from_slice(list);
                ligands.sort_unstable();
                let mut targets = ligands.map(|l| if l == MAX_ATOM_IDX { UNMAPPED } else { self.query_core[l] });
                if list.len() == 3 {
                    targets[3] = target.last_chiral_ligand(self.query_core[q], &targets);
                }
                if normalize_atom_stereo(&targets, target_stereo) != query_stereo {
                    trace!(atom = q, "tetrahedral parity differs");
                    return false;
                }
            }
        }

        for b in 0..query.bond_count() {
            let query_stereo = query.bond_stereo(b);
            if !query_stereo.is_defined() {
                continue;
            }
            let (a0, a1) = (query.bond_atom(b, 0), query.bond_atom(b, 1));
            let (t0, t1) = (self.query_core[a0], self.query_core[a1]);
            let Some(target_bond) = target.bond(t0, t1) else {
                continue;
            };
            let target_stereo = target.bond_stereo(target_bond);
            if !target_stereo.is_defined() {
                continue;
            }
            let parity = if query.is_extended_cis_trans(b) {
                let walks = [(a0, a1), (a1, a0)].map(|(from, to)| self.walk_to_terminal(from, to));
                let [Some(left), Some(right)] = walks else {
                    continue;
                };
                let ligands = [left.2[0], left.2[1], right.2[0], right.2[1]];
                self.normalized_pair_parity(ligands, [(left.0, left.1), (right.0, right.1)], target_stereo)
            } else {
                let (list0, list1) = (query.bonded_atoms(a0), query.bonded_atoms(a1));
                if !(2..=3).contains(&list0.len()) || !(2..=3).contains(&list1.len()) {
                    continue;
                }
                let mut ligands = [MAX_ATOM_IDX; 4];
                for (slot, l) in list0.iter().filter(|&&l| l != a1).enumerate() {
                    ligands[slot] = *l;
                }
                for (slot, l) in list1.iter().filter(|&&l| l != a0).enumerate() {
                    ligands[2 + slot] = *l;
                }
                self.normalized_pair_parity(ligands, [(a0, a1), (a1, a0)], target_stereo)
            };
            if parity != query_stereo {
                trace!(bond = b, "double bond parity differs");
                return false;
            }
        }
        true
    }
}
