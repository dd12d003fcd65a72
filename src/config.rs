//! Search modes and their validation.
//!
//! None of these have hidden defaults inside the engine: the matcher and the fingerprints only
//! ever see what is configured here.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Largest supported similarity radius
pub const MAX_RADIUS: usize = 8;

/// A configuration value was rejected before any matching started
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown {kind} mode {name:?}")]
    UnknownMode { kind: &'static str, name: String },
    #[error("similarity threshold {0} is outside of [0.5, 1.0]")]
    ThresholdOutOfRange(f32),
    #[error("fingerprint radius {0} is outside of 1..=8")]
    RadiusOutOfRange(usize),
    #[error("limit {0} must be positive")]
    LimitOutOfRange(u64),
}

macro_rules! modes {
    ($(#[$meta:meta])* $name:ident: $kind:literal { $($(#[$vmeta:meta])* $variant:ident = $text:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            #[default]
            $($(#[$vmeta])* $variant,)*
        }
        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];
            pub fn as_static_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_static_str())
            }
        }
        impl FromStr for $name {
            type Err = ConfigError;
            fn from_str(s: &str) -> Result<Self, ConfigError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|m| m.as_static_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ConfigError::UnknownMode {
                        kind: $kind,
                        name: s.to_string(),
                    })
            }
        }
    };
}

modes! {
    SearchMode: "search" {
        /// The query must be contained in the target
        Substructure = "substructure",
        /// The query and the target must be the same graph
        Exact = "exact",
    }
}
modes! {
    ChargeMode: "charge" {
        Ignore = "ignore",
        /// An uncharged query atom matches any charge
        DefaultAsAny = "default_as_any",
        /// An uncharged query atom only matches uncharged atoms
        DefaultAsUncharged = "default_as_uncharged",
    }
}
modes! {
    IsotopeMode: "isotope" {
        Ignore = "ignore",
        DefaultAsAny = "default_as_any",
        /// A query atom without isotope only matches atoms without one
        DefaultAsStandard = "default_as_standard",
    }
}
modes! {
    RadicalMode: "radical" {
        Ignore = "ignore",
        DefaultAsAny = "default_as_any",
        DefaultAsStandard = "default_as_standard",
    }
}
modes! {
    StereoMode: "stereo" {
        Ignore = "ignore",
        Strict = "strict",
    }
}
modes! {
    /// Passed through to whatever produces the molecule graphs
    AromaticityMode: "aromaticity" {
        Preserve = "preserve",
        Detect = "detect",
        AutoDetect = "auto_detect",
    }
}
modes! {
    /// Passed through to whatever produces the molecule graphs
    TautomerMode: "tautomer" {
        Ignore = "ignore",
        Inchi = "inchi",
    }
}

impl RadicalMode {
    /// The strict radical mode is the one that treats an unset radical as "no radical"
    pub const STRICT: Self = Self::DefaultAsStandard;
}

/// Everything a substructure or exact search needs to know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchConfig {
    pub search: SearchMode,
    pub charge: ChargeMode,
    pub isotope: IsotopeMode,
    pub radical: RadicalMode,
    pub stereo: StereoMode,
    pub aromaticity: AromaticityMode,
    pub tautomer: TautomerMode,
    /// Candidate pairs a single match may try
    pub iteration_limit: Option<u64>,
    /// Wall-clock time a single match may take
    pub time_limit: Option<Duration>,
}
impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }
    /// Exact search with every attribute compared strictly
    pub fn strict_exact() -> Self {
        Self::new()
            .with_search(SearchMode::Exact)
            .with_charge(ChargeMode::DefaultAsUncharged)
            .with_isotope(IsotopeMode::DefaultAsStandard)
            .with_radical(RadicalMode::STRICT)
            .with_stereo(StereoMode::Strict)
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
    pub fn with_aromaticity(mut self, aromaticity: AromaticityMode) -> Self {
        self.aromaticity = aromaticity;
        self
    }
    pub fn with_tautomer(mut self, tautomer: TautomerMode) -> Self {
        self.tautomer = tautomer;
        self
    }
    pub fn with_iteration_limit(mut self, limit: Option<u64>) -> Self {
        self.iteration_limit = limit;
        self
    }
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.iteration_limit {
            Some(0) => Err(ConfigError::LimitOutOfRange(0)),
            _ => Ok(()),
        }
    }
}

/// Threshold and radius of a similarity search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityConfig {
    threshold: f32,
    radius: usize,
}
impl SimilarityConfig {
    pub const DEFAULT_THRESHOLD: f32 = 0.8;
    pub const DEFAULT_RADIUS: usize = 3;

    pub fn new(threshold: f32, radius: usize) -> Result<Self, ConfigError> {
        if !(0.5..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if !(1..=MAX_RADIUS).contains(&radius) {
            return Err(ConfigError::RadiusOutOfRange(radius));
        }
        Ok(Self { threshold, radius })
    }
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
    pub fn radius(&self) -> usize {
        self.radius
    }
}
impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            radius: Self::DEFAULT_RADIUS,
        }
    }
}
