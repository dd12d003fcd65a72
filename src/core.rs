//! Atom and bond codes, plus the source graph handed to the encoder

use crate::atom_info::{element, ElementClass};
use c_enum::*;
use petgraph::prelude::*;
use std::fmt::{self, Display, Formatter};

/// Atomic number of hydrogen
pub const HYDROGEN: u8 = 1;
/// Atomic number of carbon
pub const CARBON: u8 = 6;

/// Pseudo atom classes. On the wire these are the negated ASCII code of their mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pseudo {
    /// `R`, matches anything
    Any,
    /// `Q`, anything but carbon or hydrogen
    Hetero,
    /// `M`, any metal
    Metal,
    /// `X`, any halogen
    Halogen,
    /// `A`
    Heavy,
    /// `G`, a generic group
    Group,
    Positronium,
    Electron,
    Photon,
    Muonium,
    Enzyme,
    AcylCarrier,
    Empty,
    /// Never matches anything, not even itself
    Unknown,
}
impl Pseudo {
    const fn mnemonic(self) -> u8 {
        match self {
            Self::Any => b'R',
            Self::Hetero => b'Q',
            Self::Metal => b'M',
            Self::Halogen => b'X',
            Self::Heavy => b'A',
            Self::Group => b'G',
            Self::Positronium => b'p',
            Self::Electron => b'e',
            Self::Photon => b'h',
            Self::Muonium => b'm',
            Self::Enzyme => b'z',
            Self::AcylCarrier => b'a',
            Self::Empty => b' ',
            Self::Unknown => b'?',
        }
    }
    pub const fn code(self) -> i8 {
        -(self.mnemonic() as i8)
    }
    /// Unrecognized negative codes are treated as [`Pseudo::Unknown`]
    pub const fn from_code(code: i8) -> Self {
        match code.unsigned_abs() {
            b'R' => Self::Any,
            b'Q' => Self::Hetero,
            b'M' => Self::Metal,
            b'X' => Self::Halogen,
            b'A' => Self::Heavy,
            b'G' => Self::Group,
            b'p' => Self::Positronium,
            b'e' => Self::Electron,
            b'h' => Self::Photon,
            b'm' => Self::Muonium,
            b'z' => Self::Enzyme,
            b'a' => Self::AcylCarrier,
            b' ' => Self::Empty,
            _ => Self::Unknown,
        }
    }
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Any => "R",
            Self::Hetero => "Q",
            Self::Metal => "M",
            Self::Halogen => "X",
            Self::Heavy => "A",
            Self::Group => "G",
            Self::Positronium => "Ps",
            Self::Electron => "e",
            Self::Photon => "hv",
            Self::Muonium => "Mu",
            Self::Enzyme => "Enz",
            Self::AcylCarrier => "ACP",
            Self::Empty => "",
            Self::Unknown => "?",
        }
    }
}

/// What an atom is: a real element or one of the pseudo atom classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Element(u8),
    Pseudo(Pseudo),
}
impl AtomKind {
    pub const HYDROGEN: Self = Self::Element(HYDROGEN);
    pub const CARBON: Self = Self::Element(CARBON);

    /// Signed wire code, negative for pseudo atoms
    pub const fn code(self) -> i8 {
        match self {
            Self::Element(n) => n as i8,
            Self::Pseudo(p) => p.code(),
        }
    }
    pub const fn from_code(code: i8) -> Self {
        if code > 0 {
            Self::Element(code as u8)
        } else {
            Self::Pseudo(Pseudo::from_code(code))
        }
    }

    pub const fn is_pseudo(self) -> bool {
        matches!(self, Self::Pseudo(_))
    }
    pub const fn is_hydrogen(self) -> bool {
        matches!(self, Self::Element(HYDROGEN))
    }
    pub const fn is_carbon(self) -> bool {
        matches!(self, Self::Element(CARBON))
    }
    /// Hydrogen or any pseudo atom, the atoms fingerprints skip
    pub const fn is_hydrogen_or_pseudo(self) -> bool {
        self.code() <= HYDROGEN as i8
    }
    pub fn class(self) -> Option<ElementClass> {
        match self {
            Self::Element(n) => Some(element(n).map_or(ElementClass::Metal, |e| e.class)),
            Self::Pseudo(_) => None,
        }
    }
    pub fn is_metal(self) -> bool {
        self.class() == Some(ElementClass::Metal)
    }
    pub fn is_halogen(self) -> bool {
        self.class() == Some(ElementClass::Halogen)
    }
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Element(n) => element(n).map_or("?", |e| e.sym),
            Self::Pseudo(p) => p.symbol(),
        }
    }
}
impl Display for AtomKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

c_enum! {
    /// Bond order codes, values are the wire format
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub enum BondType: u8 {
        None = 0,
        Single = 1,
        Double = 2,
        Triple = 3,
        Quadruple = 4,
        Quintuple = 5,
        Sextuple = 6,
        Aromatic = 11,
        SingleOrDouble = 12,
        SingleOrAromatic = 13,
        DoubleOrAromatic = 14,
        Any = 15,
    }
}
impl BondType {
    /// Whether this is one of the codes the format knows about
    pub fn is_known(self) -> bool {
        matches!(self.0, 0..=6 | 11..=15)
    }
    pub fn is_query(self) -> bool {
        self.0 >= Self::SingleOrDouble.0
    }
    /// Whether a query bond of this type accepts a target bond of type `other`
    pub fn accepts(self, other: Self) -> bool {
        if self == other || self == Self::Any {
            return true;
        }
        match self {
            Self::SingleOrDouble => other == Self::Single || other == Self::Double,
            Self::SingleOrAromatic => other == Self::Single || other == Self::Aromatic,
            Self::DoubleOrAromatic => other == Self::Double || other == Self::Aromatic,
            _ => false,
        }
    }
    pub fn as_static_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Double => "double",
            Self::Triple => "triple",
            Self::Quadruple => "quadruple",
            Self::Quintuple => "quintuple",
            Self::Sextuple => "sextuple",
            Self::Aromatic => "aromatic",
            Self::SingleOrDouble => "single or double",
            Self::SingleOrAromatic => "single or aromatic",
            Self::DoubleOrAromatic => "double or aromatic",
            Self::Any => "any",
            _ => "invalid",
        }
    }
}
impl Display for BondType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_static_str())
    }
}

c_enum! {
    /// Tetrahedral parity relative to ascending ligand order
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub enum TetrahedralStereo: u8 {
        None = 0,
        Clockwise = 1,
        AntiClockwise = 2,
        Undefined = 3,
    }
}
impl TetrahedralStereo {
    pub fn is_defined(self) -> bool {
        self == Self::Clockwise || self == Self::AntiClockwise
    }
    /// Swap clockwise and anticlockwise, `~x & 3` on the wire code
    pub fn inverted(self) -> Self {
        Self(!self.0 & 3)
    }
}

c_enum! {
    /// Double bond parity relative to the lower-index ligand on each end
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub enum BondStereo: u8 {
        None = 0,
        Opposite = 1,
        Together = 2,
        Undefined = 3,
    }
}
impl BondStereo {
    pub fn is_defined(self) -> bool {
        self == Self::Opposite || self == Self::Together
    }
    pub fn inverted(self) -> Self {
        Self(!self.0 & 3)
    }
}

c_enum! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Radical: u8 {
        None = 0,
        Singlet = 1,
        Doublet = 2,
        Triplet = 3,
    }
}

/// Winding of a declared tetrahedral or allene centre, looking from the first ligand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    AntiClockwise,
}
impl Winding {
    pub fn as_stereo(self) -> TetrahedralStereo {
        match self {
            Self::Clockwise => TetrahedralStereo::Clockwise,
            Self::AntiClockwise => TetrahedralStereo::AntiClockwise,
        }
    }
}

/// Declared tetrahedral or allene configuration.
///
/// A ligand equal to the centre stands for its implicit hydrogen. For allenes the ligands come
/// in two pairs, one per terminal atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomConfiguration {
    pub ligands: [NodeIndex; 4],
    pub winding: Winding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conformation {
    Together,
    Opposite,
}
impl Conformation {
    pub fn as_stereo(self) -> BondStereo {
        match self {
            Self::Together => BondStereo::Together,
            Self::Opposite => BondStereo::Opposite,
        }
    }
}

/// Declared double bond configuration: one ligand on the source end, one on the target end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BondConfiguration {
    pub ligands: [NodeIndex; 2],
    pub conformation: Conformation,
}

/// An atom in the source graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom {
    pub kind: AtomKind,
    /// Hydrogens not present as nodes
    pub hydrogens: u8,
    pub charge: i8,
    /// Mass number, if an isotope was given
    pub isotope: Option<u16>,
    pub radical: Radical,
    pub configuration: Option<AtomConfiguration>,
    /// Open valences may only be filled by hydrogen or an explicit substituent
    pub rest_hydrogen: bool,
}
impl Atom {
    pub fn new(kind: AtomKind) -> Self {
        Self {
            kind,
            hydrogens: 0,
            charge: 0,
            isotope: None,
            radical: Radical::None,
            configuration: None,
            rest_hydrogen: false,
        }
    }
    pub fn element(protons: u8) -> Self {
        Self::new(AtomKind::Element(protons))
    }
    pub fn pseudo(pseudo: Pseudo) -> Self {
        Self::new(AtomKind::Pseudo(pseudo))
    }
    pub fn with_hydrogens(mut self, hydrogens: u8) -> Self {
        self.hydrogens = hydrogens;
        self
    }
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }
    pub fn with_isotope(mut self, mass: u16) -> Self {
        self.isotope = Some(mass);
        self
    }
    pub fn with_radical(mut self, radical: Radical) -> Self {
        self.radical = radical;
        self
    }
    pub fn with_rest_hydrogen(mut self, rest: bool) -> Self {
        self.rest_hydrogen = rest;
        self
    }
    /// Mass number minus protons plus one, as stored in isotope records.
    ///
    /// Pseudo atoms have no protons.
    pub fn isotope_delta(&self) -> Option<i32> {
        let protons = match self.kind {
            AtomKind::Element(n) => n as i32,
            AtomKind::Pseudo(_) => 0,
        };
        self.isotope.map(|mass| mass as i32 - protons + 1)
    }
}
impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use fmtastic::*;
        if let Some(mass) = self.isotope {
            write!(f, "{}", Superscript(mass))?;
        }
        write!(f, "{}", self.kind)?;
        if self.hydrogens > 0 {
            f.write_str("H")?;
            if self.hydrogens > 1 {
                write!(f, "{}", Subscript(self.hydrogens))?;
            }
        }
        match self.charge {
            0 => {}
            1 => f.write_str("⁺")?,
            -1 => f.write_str("⁻")?,
            _ => write!(f, "{:+}", Superscript(self.charge))?,
        }
        Ok(())
    }
}

/// A bond in the source graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub kind: BondType,
    pub configuration: Option<BondConfiguration>,
}
impl Bond {
    pub fn new(kind: BondType) -> Self {
        Self {
            kind,
            configuration: None,
        }
    }
}
impl From<BondType> for Bond {
    fn from(kind: BondType) -> Self {
        Self::new(kind)
    }
}

/// A molecule graph is an undirected graph between atoms, connected with bonds
pub type MoleculeGraph = UnGraph<Atom, Bond>;
