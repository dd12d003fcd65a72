//! Cheap checks run straight on the payload bytes, before committing to a decode

use super::records::*;
use super::*;

fn specials(bytes: &[u8]) -> Result<(Header, SpecialRecords), FormatError> {
    let (header, sections) = Header::split(bytes)?;
    let specials = SpecialRecords::read(sections.specials, &header)?;
    Ok((header, specials))
}

fn has_hydrogen_record(bytes: &[u8], kind: RecordKind) -> Result<bool, FormatError> {
    let (header, specials) = specials(bytes)?;
    let heavy = header.heavy_atoms();
    let found = specials.of_kind(kind).any(|(idx, _)| idx >= heavy);
    Ok(found)
}

/// Whether a compact decode would lose information.
///
/// That is the case with pseudo atoms, with hydrogens that don't have exactly one host, and with
/// charges or isotopes on hydrogens when those attributes are wanted.
pub fn is_extended(bytes: &[u8], with_charges: bool, with_isotopes: bool) -> Result<bool, FormatError> {
    needs_extended_search(bytes, true, with_charges, with_isotopes)
}

/// Like [`is_extended`], but pseudo atoms only count when `with_pseudo_atoms` is set.
///
/// An exact search compares pseudo atoms one to one, so they don't need their hydrogens spelled out.
pub fn needs_extended_search(
    bytes: &[u8],
    with_pseudo_atoms: bool,
    with_charges: bool,
    with_isotopes: bool,
) -> Result<bool, FormatError> {
    let (header, sections) = Header::split(bytes)?;
    if with_pseudo_atoms && sections.atoms.iter().any(|&b| (b as i8) < 0) {
        return Ok(true);
    }
    let heavy = header.heavy_atoms();
    let mut partners = vec![0usize; header.h_atoms];
    for chunk in sections.bonds.chunks_exact(Header::BOND_SIZE) {
        let record = BondRecord::read(chunk);
        for end in [record.x(), record.y()] {
            if let Some(count) = end.checked_sub(heavy).and_then(|h| partners.get_mut(h)) {
                *count += 1;
            }
        }
    }
    for (i, chunk) in sections.hydrogens.chunks_exact(Header::HYDROGEN_SIZE).enumerate() {
        let record = HydrogenRecord::read(chunk);
        if record.is_empty() || record.host() >= heavy {
            return Ok(true);
        }
        partners[i] += 1;
    }
    if partners.iter().any(|&p| p != 1) {
        return Ok(true);
    }
    if !with_charges && !with_isotopes {
        return Ok(false);
    }
    let specials = SpecialRecords::read(sections.specials, &header)?;
    let found = specials.iter().any(|(kind, idx, _)| {
        idx >= heavy
            && ((with_charges && kind == RecordKind::Charge)
                || (with_isotopes && kind == RecordKind::Isotope))
    });
    Ok(found)
}

pub fn has_pseudo_atom(bytes: &[u8]) -> Result<bool, FormatError> {
    let (_, sections) = Header::split(bytes)?;
    Ok(sections.atoms.iter().any(|&b| (b as i8) < 0))
}

/// Whether some hydrogen is bonded to more than one atom.
///
/// Bonds of such hydrogens are written after all heavy bonds, so only the last bond record has to
/// be checked.
pub fn has_multivalent_hydrogen(bytes: &[u8]) -> Result<bool, FormatError> {
    let (header, sections) = Header::split(bytes)?;
    let heavy = header.heavy_atoms();
    Ok(sections
        .bonds
        .chunks_exact(Header::BOND_SIZE)
        .last()
        .map(BondRecord::read)
        .is_some_and(|r| r.x() >= heavy || r.y() >= heavy))
}

pub fn has_charged_hydrogen(bytes: &[u8]) -> Result<bool, FormatError> {
    has_hydrogen_record(bytes, RecordKind::Charge)
}

pub fn has_hydrogen_isotope(bytes: &[u8]) -> Result<bool, FormatError> {
    has_hydrogen_record(bytes, RecordKind::Isotope)
}

pub fn has_hydrogen_radical(bytes: &[u8]) -> Result<bool, FormatError> {
    has_hydrogen_record(bytes, RecordKind::Radical)
}
