//! Substructure and exact queries.

use super::*;
use crate::codec::{scan, BinaryMoleculeBuilder, DecodeOptions};
use crate::config::*;
use crate::isomorphism::{Budget, Isomorphism, MatchOutcome};
use crate::molecule::Molecule;
use std::collections::BTreeMap;

/// Outcome of verifying one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// The query was found. The score is how much of the target it covers, in `(0, 1]`.
    Match(f32),
    NoMatch,
    /// The matcher ran out of budget, the candidate is neither a hit nor a miss
    BudgetExceeded,
}
impl Score {
    pub fn is_match(self) -> bool {
        matches!(self, Self::Match(_))
    }
    pub fn value(self) -> Option<f32> {
        match self {
            Self::Match(score) => Some(score),
            _ => None,
        }
    }
}

/// Pick the index features a query filters on.
///
/// Rare features come first. A feature is only taken if it covers some atom that is still covered
/// fewer than [`ATOM_COVERAGE`] times, and selection stops once every atom is covered or
/// [`MAX_SELECTED_BITS`] features are taken. Features sharing a document frequency collapse into
/// the last one seen.
pub fn select_fingerprint_bits<S: IndexStatistics + ?Sized>(
    fingerprint: &Fingerprint,
    atom_count: usize,
    stats: &S,
) -> Vec<u32> {
    let by_freq: BTreeMap<usize, u32> = fingerprint
        .iter()
        .map(|bit| (stats.doc_freq(Field::Substructure, bit), bit))
        .collect();
    let mut coverage = vec![0u32; atom_count];
    let mut uncovered = atom_count;
    let mut selected = Vec::new();
    for bit in by_freq.into_values() {
        if uncovered == 0 || selected.len() >= MAX_SELECTED_BITS {
            break;
        }
        let Some(atoms) = fingerprint.atoms(bit) else {
            continue;
        };
        let mut useful = false;
        for &atom in atoms {
            let Some(count) = coverage.get_mut(atom) else {
                continue;
            };
            if *count < ATOM_COVERAGE {
                useful = true;
                *count += 1;
                if *count == ATOM_COVERAGE {
                    uncovered -= 1;
                }
            }
        }
        if useful {
            selected.push(bit);
        }
    }
    selected
}

/// A substructure or exact query, ready to filter and verify
#[derive(Debug, Clone)]
pub struct SubstructureQuery {
    config: SearchConfig,
    bytes: Vec<u8>,
    atom_count: usize,
    fingerprint: Fingerprint,
    matcher: Isomorphism<BinaryMolecule>,
}
impl SubstructureQuery {
    /// Encode `graph` with the attributes the configuration compares.
    ///
    /// Exact searches also write the suppressed hydrogens, so they take part in the match.
    pub fn new(graph: &MoleculeGraph, config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let builder = BinaryMoleculeBuilder::new(graph)
            .with_charges(config.charge != ChargeMode::Ignore)
            .with_isotopes(config.isotope != IsotopeMode::Ignore)
            .with_radicals(config.radical != RadicalMode::Ignore)
            .with_stereo(config.stereo != StereoMode::Ignore);
        let bytes = builder.as_bytes(config.search == SearchMode::Exact)?;
        let rest_h = builder.rest_hydrogen_flags();
        Self::from_bytes(bytes, rest_h.as_deref(), config)
    }

    /// Build a query from an already encoded payload and optional rest-hydrogen flags
    #[instrument(level = "trace", skip(bytes, rest_h))]
    pub fn from_bytes(bytes: Vec<u8>, rest_h: Option<&[bool]>, config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let compact = BinaryMolecule::new(&bytes)?;
        let fingerprint = substructure_fingerprint(&compact, &FingerprintOptions::query());
        let extended = scan::needs_extended_search(
            &bytes,
            config.search != SearchMode::Exact,
            config.charge != ChargeMode::Ignore,
            config.isotope != IsotopeMode::Ignore,
        )?;
        let options = DecodeOptions::compact()
            .with_extended(extended)
            .with_charges(config.charge != ChargeMode::Ignore)
            .with_isotopes(config.isotope != IsotopeMode::Ignore)
            .with_radicals(config.radical != RadicalMode::Ignore)
            .with_stereo(config.stereo != StereoMode::Ignore);
        let mut query = BinaryMolecule::decode(&bytes, &options)?;
        if let Some(flags) = rest_h {
            query = query.with_rest_hydrogen_flags(flags);
        }
        debug!(
            extended,
            atoms = query.atom_count(),
            features = fingerprint.len(),
            "built substructure query"
        );
        Ok(Self {
            config: *config,
            atom_count: compact.atom_count(),
            matcher: Isomorphism::with_config(query, config),
            fingerprint,
            bytes,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    /// Query-mode fingerprint, with the atoms behind every feature
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
    pub fn matcher(&self) -> &Isomorphism<BinaryMolecule> {
        &self.matcher
    }

    pub fn select_bits<S: IndexStatistics + ?Sized>(&self, stats: &S) -> Vec<u32> {
        select_fingerprint_bits(&self.fingerprint, self.atom_count, stats)
    }

    /// Terms every candidate must contain, or `None` if any document with a fingerprint will do
    pub fn filter_terms<S: IndexStatistics + ?Sized>(&self, stats: &S) -> Option<Vec<String>> {
        let bits = self.select_bits(stats);
        (!bits.is_empty()).then(|| bits.into_iter().map(bit_as_term).collect())
    }

    /// Verify one stored payload within the configured limits
    pub fn score(&self, target: &[u8]) -> Result<Score, FormatError> {
        self.score_with_budget(target, &mut Budget::from_config(&self.config))
    }

    /// Verify one stored payload
    #[instrument(level = "trace", skip_all)]
    pub fn score_with_budget(&self, target: &[u8], budget: &mut Budget) -> Result<Score, FormatError> {
        let config = &self.config;
        let exact = config.search == SearchMode::Exact;
        let query = self.matcher.query();
        let extend = !query.is_extended()
            && query.hydrogen_atom_count() > 0
            && (scan::has_multivalent_hydrogen(target)?
                || (exact
                    && ((config.charge == ChargeMode::DefaultAsUncharged && scan::has_charged_hydrogen(target)?)
                        || (config.isotope == IsotopeMode::DefaultAsStandard
                            && scan::has_hydrogen_isotope(target)?)
                        || (config.radical == RadicalMode::DefaultAsStandard
                            && scan::has_hydrogen_radical(target)?))));
        let options = DecodeOptions {
            extended: query.is_extended() || extend,
            charges: config.charge != ChargeMode::Ignore,
            isotopes: config.isotope != IsotopeMode::Ignore,
            radicals: config.radical != RadicalMode::Ignore,
            stereo: config.stereo != StereoMode::Ignore,
            ignore_charged_hydrogens: config.charge == ChargeMode::DefaultAsUncharged,
            ignore_hydrogen_isotopes: config.isotope == IsotopeMode::DefaultAsStandard,
            ignore_hydrogen_radicals: config.radical == RadicalMode::DefaultAsStandard,
        };
        let molecule = BinaryMolecule::decode(target, &options)?;

        let extended;
        let matcher = if extend {
            trace!("target needs explicit hydrogens, extending the query");
            extended = Isomorphism::with_config(query.extend()?, config);
            &extended
        } else {
            &self.matcher
        };
        Ok(match matcher.match_with_budget(&molecule, budget) {
            MatchOutcome::Match => Score::Match(coverage_score(matcher.query(), &molecule)),
            MatchOutcome::NoMatch => Score::NoMatch,
            MatchOutcome::BudgetExceeded => {
                warn!(trials = budget.trials(), "match budget exceeded");
                Score::BudgetExceeded
            }
        })
    }
}

/// How much of `target` a matched `query` covers, weighting heavy atoms over heavy bonds over
/// hydrogens over hydrogen bonds. Never zero.
pub fn coverage_score(query: &BinaryMolecule, target: &BinaryMolecule) -> f32 {
    fn ratio(query: usize, target: usize) -> f32 {
        if target == 0 {
            1.0
        } else {
            query as f32 / target as f32
        }
    }
    let score = (8.0 * ratio(query.heavy_atom_count(), target.heavy_atom_count())
        + 4.0 * ratio(query.heavy_bond_count(), target.heavy_bond_count())
        + 2.0 * ratio(query.hydrogen_atom_count(), target.hydrogen_atom_count())
        + ratio(query.hydrogen_bond_count(), target.hydrogen_bond_count()))
        / 15.0;
    if score > 0.0 {
        score
    } else {
        f32::from_bits(1)
    }
}
