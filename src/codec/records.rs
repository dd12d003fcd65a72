//! Bit-packed record layouts.
//!
//! Fields are declared least significant first, so a nibble pair `hi: B4, kind: B4` puts `kind`
//! in the upper half of its byte.

use super::*;
use crate::core::BondType;
use c_enum::*;
use modular_bitfield::prelude::*;
use std::collections::BTreeMap;

c_enum! {
    /// Tag of a special record
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum RecordKind: u8 {
        Charge = 0,
        Isotope = 1,
        TetrahedralStereo = 2,
        BondStereo = 3,
        Radical = 4,
    }
}
impl RecordKind {
    pub fn is_known(self) -> bool {
        self.0 <= Self::Radical.0
    }
}

/// A bond between atoms `x` and `y`
#[allow(clippy::identity_op)]
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct BondRecord {
    x_lo: B8,
    y_hi: B4,
    x_hi: B4,
    y_lo: B8,
    kind: B8,
}
impl BondRecord {
    pub fn pack(x: usize, y: usize, kind: BondType) -> Self {
        Self::new()
            .with_x_lo((x & 0xFF) as u8)
            .with_x_hi(((x >> 8) & 0xF) as u8)
            .with_y_lo((y & 0xFF) as u8)
            .with_y_hi(((y >> 8) & 0xF) as u8)
            .with_kind(kind.0)
    }
    pub fn read(bytes: &[u8]) -> Self {
        Self::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
    pub fn x(&self) -> usize {
        self.x_lo() as usize | (self.x_hi() as usize) << 8
    }
    pub fn y(&self) -> usize {
        self.y_lo() as usize | (self.y_hi() as usize) << 8
    }
    pub fn bond_type(&self) -> BondType {
        BondType(self.kind())
    }
}

/// The bond of a hydrogen to its host
#[allow(clippy::identity_op)]
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct HydrogenRecord {
    host_hi: B4,
    kind: B4,
    host_lo: B8,
}
impl HydrogenRecord {
    /// The record of a hydrogen that isn't singly bonded
    pub fn empty() -> Self {
        Self::new()
    }
    pub fn pack(host: usize, kind: BondType) -> Self {
        Self::new()
            .with_host_lo((host & 0xFF) as u8)
            .with_host_hi(((host >> 8) & 0xF) as u8)
            .with_kind(kind.0 & 0xF)
    }
    pub fn read(bytes: &[u8]) -> Self {
        Self::from_bytes([bytes[0], bytes[1]])
    }
    pub fn is_empty(&self) -> bool {
        self.into_bytes() == [0, 0]
    }
    pub fn host(&self) -> usize {
        self.host_lo() as usize | (self.host_hi() as usize) << 8
    }
    pub fn bond_type(&self) -> BondType {
        BondType(self.kind())
    }
}

/// A sparse override of one atom or bond attribute
#[allow(clippy::identity_op)]
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct SpecialRecord {
    idx_hi: B4,
    kind: B4,
    idx_lo: B8,
    payload: B8,
}
impl SpecialRecord {
    pub fn pack(kind: RecordKind, idx: usize, payload: u8) -> Self {
        Self::new()
            .with_idx_lo((idx & 0xFF) as u8)
            .with_idx_hi(((idx >> 8) & 0xF) as u8)
            .with_kind(kind.0 & 0xF)
            .with_payload(payload)
    }
    pub fn read(bytes: &[u8]) -> Self {
        Self::from_bytes([bytes[0], bytes[1], bytes[2]])
    }
    pub fn index(&self) -> usize {
        self.idx_lo() as usize | (self.idx_hi() as usize) << 8
    }
    pub fn record_kind(&self) -> RecordKind {
        RecordKind(self.kind())
    }
    pub fn value(&self) -> u8 {
        self.payload()
    }
}

/// Special records keyed by what they override.
///
/// Records only exist as packed bytes at the edges of the codec; everything in between goes
/// through this map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialRecords(BTreeMap<(RecordKind, u16), u8>);
impl SpecialRecords {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Insert an atom record, failing if the index doesn't fit
    pub fn insert_atom(&mut self, kind: RecordKind, atom: usize, payload: u8) -> Result<(), FormatError> {
        if atom > MAX_RECORD_INDEX {
            return Err(FormatError::new(0, AtomIndexOverflow(atom)));
        }
        self.0.insert((kind, atom as u16), payload);
        Ok(())
    }
    /// Insert a bond record, failing if the bond number doesn't fit
    pub fn insert_bond(&mut self, kind: RecordKind, bond: usize, payload: u8) -> Result<(), FormatError> {
        if bond > MAX_RECORD_INDEX {
            return Err(FormatError::new(0, BondIndexOverflow(bond)));
        }
        self.0.insert((kind, bond as u16), payload);
        Ok(())
    }
    pub fn get(&self, kind: RecordKind, idx: usize) -> Option<u8> {
        u16::try_from(idx)
            .ok()
            .and_then(|idx| self.0.get(&(kind, idx)).copied())
    }
    /// All records as `(kind, index, payload)`, ordered by kind then index
    pub fn iter(&self) -> impl Iterator<Item = (RecordKind, usize, u8)> + '_ {
        self.0.iter().map(|(&(k, i), &p)| (k, i as usize, p))
    }
    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.0
            .range((kind, 0)..=(kind, u16::MAX))
            .map(|(&(_, i), &p)| (i as usize, p))
    }

    /// Parse the special section of a payload with the given header.
    ///
    /// Every record has to point at an atom or bond the header announces.
    pub fn read(section: &[u8], header: &Header) -> Result<Self, FormatError> {
        let base = header.specials_offset();
        let mut out = Self::new();
        for (n, chunk) in section.chunks_exact(Header::SPECIAL_SIZE).enumerate() {
            let offset = base + n * Header::SPECIAL_SIZE;
            let record = SpecialRecord::read(chunk);
            let kind = record.record_kind();
            if !kind.is_known() {
                return Err(FormatError::new(offset, UnsupportedRecordType(kind.0)));
            }
            let idx = record.index();
            if kind == RecordKind::BondStereo {
                if idx >= header.bond_count() {
                    return Err(FormatError::new(offset, BondIndexOutOfRange(idx)));
                }
            } else if idx >= header.atom_count() {
                return Err(FormatError::new(offset, AtomIndexOutOfRange(idx)));
            }
            out.0.insert((kind, idx as u16), record.value());
        }
        Ok(out)
    }
    pub fn write(&self, out: &mut Vec<u8>) {
        for (kind, idx, payload) in self.iter() {
            out.extend_from_slice(&SpecialRecord::pack(kind, idx, payload).into_bytes());
        }
    }
}
