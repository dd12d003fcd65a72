//! The binary molecule layout.
//!
//! A payload is a big-endian header of five 16-bit counts followed by four sections:
//!
//! | section | record size | content |
//! |---|---|---|
//! | atoms | 1 | element codes of every atom that is neither carbon nor hydrogen |
//! | bonds | 4 | two 12-bit atom indices and a bond type |
//! | hydrogens | 2 | host index and bond type, or 0 for a hydrogen without a single host |
//! | specials | 3 | sparse charge, isotope, stereo and radical overrides |
//!
//! Carbons and hydrogens are implied by their position: atoms come in frequency order, so the
//! explicit atoms are followed by the carbons and then the hydrogens.

use thiserror::Error;
use FormatErrorKind::*;

pub mod binary;
pub mod builder;
pub mod records;
pub mod scan;

pub use binary::{BinaryMolecule, DecodeOptions};
pub use builder::{encode, BinaryMoleculeBuilder};
pub use records::RecordKind;

/// Largest atom index a record can hold
pub const MAX_RECORD_INDEX: usize = 0xFFF;

/// Inner enum for `FormatError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    #[error("expected {0} more bytes")]
    Truncated(usize),
    #[error("{0} unexpected bytes after the last record")]
    TrailingBytes(usize),
    #[error("atom index {0} doesn't fit in a 12-bit record")]
    AtomIndexOverflow(usize),
    #[error("bond number {0} doesn't fit in a 12-bit record")]
    BondIndexOverflow(usize),
    #[error("atom index {0} is out of range")]
    AtomIndexOutOfRange(usize),
    #[error("bond number {0} is out of range")]
    BondIndexOutOfRange(usize),
    #[error("atom {0} is bonded to itself")]
    SelfBond(usize),
    #[error("isotope delta {0} is outside of 1..=255")]
    IsotopeOutOfRange(i32),
    #[error("bond order {0} isn't supported")]
    UnsupportedBondOrder(u8),
    #[error("record type {0} isn't recognized")]
    UnsupportedRecordType(u8),
    #[error("{0} records don't fit in a 16-bit count")]
    CountOverflow(usize),
}

/// A payload couldn't be written or read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("an error occured at byte {offset} of the molecule payload: {kind}")]
pub struct FormatError {
    pub offset: usize,
    pub kind: FormatErrorKind,
}
impl FormatError {
    /// Convenience method
    pub const fn new(offset: usize, kind: FormatErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// The five counts at the start of every payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Header {
    /// Atoms stored with an explicit element byte
    pub x_atoms: usize,
    /// Implied carbons
    pub c_atoms: usize,
    /// Hydrogen records, one per hydrogen
    pub h_atoms: usize,
    /// Bond records: every heavy bond, then bonds of hydrogens without a single host
    pub x_bonds: usize,
    pub specials: usize,
}
impl Header {
    pub const SIZE: usize = 10;
    pub const BOND_SIZE: usize = 4;
    pub const HYDROGEN_SIZE: usize = 2;
    pub const SPECIAL_SIZE: usize = 3;

    pub fn heavy_atoms(&self) -> usize {
        self.x_atoms + self.c_atoms
    }
    /// Every atom, hydrogens included
    pub fn atom_count(&self) -> usize {
        self.heavy_atoms() + self.h_atoms
    }
    /// Every bond a special record may point at
    pub fn bond_count(&self) -> usize {
        self.x_bonds + self.h_atoms
    }
    /// Offset of the bond section
    pub fn bonds_offset(&self) -> usize {
        Self::SIZE + self.x_atoms
    }
    pub fn hydrogens_offset(&self) -> usize {
        self.bonds_offset() + self.x_bonds * Self::BOND_SIZE
    }
    pub fn specials_offset(&self) -> usize {
        self.hydrogens_offset() + self.h_atoms * Self::HYDROGEN_SIZE
    }
    /// Exact length of a payload with this header
    pub fn payload_len(&self) -> usize {
        self.specials_offset() + self.specials * Self::SPECIAL_SIZE
    }

    /// Read the header alone, without checking the rest of the payload
    pub fn read(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::new(bytes.len(), Truncated(Self::SIZE - bytes.len())));
        }
        let field = |i: usize| u16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]) as usize;
        Ok(Self {
            x_atoms: field(0),
            c_atoms: field(1),
            h_atoms: field(2),
            x_bonds: field(3),
            specials: field(4),
        })
    }
    /// Read the header and check that the payload has exactly the length it announces
    pub fn split(bytes: &[u8]) -> Result<(Self, Sections<'_>), FormatError> {
        let header = Self::read(bytes)?;
        if header.atom_count() > MAX_RECORD_INDEX + 1 {
            return Err(FormatError::new(0, AtomIndexOverflow(header.atom_count() - 1)));
        }
        let len = header.payload_len();
        match bytes.len().cmp(&len) {
            std::cmp::Ordering::Less => Err(FormatError::new(
                bytes.len(),
                Truncated(len - bytes.len()),
            )),
            std::cmp::Ordering::Greater => {
                Err(FormatError::new(len, TrailingBytes(bytes.len() - len)))
            }
            std::cmp::Ordering::Equal => Ok((
                header,
                Sections {
                    atoms: &bytes[Self::SIZE..header.bonds_offset()],
                    bonds: &bytes[header.bonds_offset()..header.hydrogens_offset()],
                    hydrogens: &bytes[header.hydrogens_offset()..header.specials_offset()],
                    specials: &bytes[header.specials_offset()..len],
                },
            )),
        }
    }
    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), FormatError> {
        for count in [
            self.x_atoms,
            self.c_atoms,
            self.h_atoms,
            self.x_bonds,
            self.specials,
        ] {
            let count = u16::try_from(count)
                .map_err(|_| FormatError::new(out.len(), CountOverflow(count)))?;
            out.extend_from_slice(&count.to_be_bytes());
        }
        Ok(())
    }
}

/// The four record sections of a payload, borrowed from it
#[derive(Debug, Clone, Copy)]
pub struct Sections<'a> {
    pub atoms: &'a [u8],
    pub bonds: &'a [u8],
    pub hydrogens: &'a [u8],
    pub specials: &'a [u8],
}
