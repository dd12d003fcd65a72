use super::records::*;
use super::*;
use crate::core::*;
use crate::molecule::Molecule;
use smallvec::SmallVec;
use tracing::*;

const NO_BOND: u32 = u32::MAX;

/// Which parts of a payload to materialize.
///
/// The default is a compact decode without any attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
    /// Make every hydrogen an atom instead of folding it into its host's count
    pub extended: bool,
    pub charges: bool,
    pub isotopes: bool,
    pub radicals: bool,
    pub stereo: bool,
    /// Don't fold charged hydrogens into their host's count (compact only)
    pub ignore_charged_hydrogens: bool,
    /// Don't fold hydrogen isotopes into their host's count (compact only)
    pub ignore_hydrogen_isotopes: bool,
    /// Don't fold hydrogen radicals into their host's count (compact only)
    pub ignore_hydrogen_radicals: bool,
}
impl DecodeOptions {
    pub fn compact() -> Self {
        Self::default()
    }
    /// Everything, in extended mode
    pub fn full() -> Self {
        Self {
            extended: true,
            charges: true,
            isotopes: true,
            radicals: true,
            stereo: true,
            ..Self::default()
        }
    }
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
    pub fn with_charges(mut self, charges: bool) -> Self {
        self.charges = charges;
        self
    }
    pub fn with_isotopes(mut self, isotopes: bool) -> Self {
        self.isotopes = isotopes;
        self
    }
    pub fn with_radicals(mut self, radicals: bool) -> Self {
        self.radicals = radicals;
        self
    }
    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.stereo = stereo;
        self
    }
    pub fn with_ignore_charged_hydrogens(mut self, ignore: bool) -> Self {
        self.ignore_charged_hydrogens = ignore;
        self
    }
    pub fn with_ignore_hydrogen_isotopes(mut self, ignore: bool) -> Self {
        self.ignore_hydrogen_isotopes = ignore;
        self
    }
    pub fn with_ignore_hydrogen_radicals(mut self, ignore: bool) -> Self {
        self.ignore_hydrogen_radicals = ignore;
        self
    }
    fn ignores_hydrogens(&self) -> bool {
        !self.extended
            && (self.ignore_charged_hydrogens
                || self.ignore_hydrogen_isotopes
                || self.ignore_hydrogen_radicals)
    }
}

/// A decoded payload, queryable through [`Molecule`]
#[derive(Debug, Clone)]
pub struct BinaryMolecule {
    bytes: Vec<u8>,
    options: DecodeOptions,
    header: Header,
    original_atom_count: usize,
    original_bond_count: usize,
    heavy_bond_count: usize,
    hydrogen_bond_count: usize,
    has_pseudo: bool,
    atom_numbers: Vec<i8>,
    hydrogens: Vec<u8>,
    charges: Vec<i8>,
    masses: Vec<u8>,
    radicals: Vec<Radical>,
    atom_stereo: Vec<TetrahedralStereo>,
    bond_types: Vec<BondType>,
    bond_stereo: Vec<BondStereo>,
    bond_atoms: Vec<[usize; 2]>,
    adjacency: Vec<SmallVec<usize, 4>>,
    bond_matrix: Vec<u32>,
    rest_h: Option<Vec<bool>>,
}
impl BinaryMolecule {
    /// Compact decode with no attributes
    pub fn new(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::decode(bytes, &DecodeOptions::compact())
    }

    #[instrument(level = "trace", skip(bytes))]
    pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Self, FormatError> {
        let (header, sections) = Header::split(bytes)?;
        let heavy = header.heavy_atoms();
        let all_atoms = heavy + header.h_atoms;
        let atom_count = if options.extended { all_atoms } else { heavy };

        let mut atom_numbers = Vec::with_capacity(atom_count);
        atom_numbers.extend(sections.atoms.iter().map(|&b| b as i8));
        atom_numbers.resize(heavy, CARBON as i8);
        atom_numbers.resize(atom_count, HYDROGEN as i8);
        let has_pseudo = atom_numbers[..header.x_atoms].iter().any(|&n| n < 0);

        let mut this = Self {
            bytes: bytes.to_vec(),
            options: *options,
            header,
            original_atom_count: all_atoms,
            original_bond_count: header.x_bonds + header.h_atoms,
            heavy_bond_count: header.x_bonds,
            hydrogen_bond_count: header.h_atoms,
            has_pseudo,
            atom_numbers,
            hydrogens: vec![0; atom_count],
            charges: vec![0; atom_count],
            masses: vec![0; atom_count],
            radicals: vec![Radical::None; atom_count],
            atom_stereo: vec![TetrahedralStereo::None; atom_count],
            bond_types: Vec::with_capacity(header.x_bonds + header.h_atoms),
            bond_stereo: Vec::new(),
            bond_atoms: Vec::with_capacity(header.x_bonds + header.h_atoms),
            adjacency: vec![SmallVec::new(); atom_count],
            bond_matrix: vec![NO_BOND; atom_count * atom_count],
            rest_h: None,
        };

        let bonds_offset = header.bonds_offset();
        for (i, chunk) in sections.bonds.chunks_exact(Header::BOND_SIZE).enumerate() {
            let offset = bonds_offset + i * Header::BOND_SIZE;
            let record = BondRecord::read(chunk);
            let (x, y, kind) = (record.x(), record.y(), record.bond_type());
            if x >= all_atoms || y >= all_atoms {
                return Err(FormatError::new(offset, AtomIndexOutOfRange(x.max(y))));
            }
            if x == y {
                return Err(FormatError::new(offset, SelfBond(x)));
            }
            if !kind.is_known() {
                return Err(FormatError::new(offset + 3, UnsupportedBondOrder(kind.0)));
            }
            if x >= heavy && y < atom_count {
                this.hydrogens[y] = this.hydrogens[y].saturating_add(1);
            }
            if y >= heavy && x < atom_count {
                this.hydrogens[x] = this.hydrogens[x].saturating_add(1);
            }
            if x >= heavy || y >= heavy {
                this.heavy_bond_count -= 1;
                this.hydrogen_bond_count += 1;
            }
            if x < atom_count && y < atom_count {
                this.add_bond(x, y, kind);
            }
        }

        let specials = SpecialRecords::read(sections.specials, &header)?;

        let mut ignored = vec![false; header.h_atoms];
        if options.ignores_hydrogens() {
            for (kind, idx, _) in specials.iter() {
                let ignore = match kind {
                    RecordKind::Charge => options.ignore_charged_hydrogens,
                    RecordKind::Isotope => options.ignore_hydrogen_isotopes,
                    RecordKind::Radical => options.ignore_hydrogen_radicals,
                    _ => false,
                };
                if ignore && idx >= heavy && idx < all_atoms {
                    ignored[idx - heavy] = true;
                }
            }
        }

        let hydrogens_offset = header.hydrogens_offset();
        for (i, chunk) in sections.hydrogens.chunks_exact(Header::HYDROGEN_SIZE).enumerate() {
            let offset = hydrogens_offset + i * Header::HYDROGEN_SIZE;
            let record = HydrogenRecord::read(chunk);
            if record.is_empty() {
                this.original_bond_count -= 1;
                this.hydrogen_bond_count -= 1;
                continue;
            }
            let (host, kind) = (record.host(), record.bond_type());
            if host >= all_atoms {
                return Err(FormatError::new(offset, AtomIndexOutOfRange(host)));
            }
            if host == heavy + i {
                return Err(FormatError::new(offset, SelfBond(host)));
            }
            if !kind.is_known() {
                return Err(FormatError::new(offset, UnsupportedBondOrder(kind.0)));
            }
            if host < atom_count && !ignored[i] {
                this.hydrogens[host] = this.hydrogens[host].saturating_add(1);
            }
            if options.extended {
                let h = heavy + i;
                if host >= heavy {
                    this.hydrogens[h] = this.hydrogens[h].saturating_add(1);
                }
                this.add_bond(host, h, kind);
            }
        }

        this.bond_stereo = vec![BondStereo::None; this.bond_types.len()];
        for (kind, idx, payload) in specials.iter() {
            match kind {
                RecordKind::Charge if options.charges && idx < atom_count => {
                    this.charges[idx] = payload as i8
                }
                RecordKind::Isotope if options.isotopes && idx < atom_count => {
                    this.masses[idx] = payload
                }
                RecordKind::Radical if options.radicals && idx < atom_count => {
                    this.radicals[idx] = Radical(payload & 3)
                }
                RecordKind::TetrahedralStereo if options.stereo && idx < atom_count => {
                    this.atom_stereo[idx] = TetrahedralStereo(payload & 3)
                }
                // stereo on hydrogen bonds is never kept
                RecordKind::BondStereo
                    if options.stereo && idx < header.x_bonds && idx < this.bond_types.len() =>
                {
                    this.bond_stereo[idx] = BondStereo(payload & 3)
                }
                _ => {}
            }
        }
        trace!(
            atoms = this.atom_count(),
            bonds = this.bond_count(),
            "decoded molecule"
        );
        Ok(this)
    }

    fn add_bond(&mut self, x: usize, y: usize, kind: BondType) {
        let n = self.atom_numbers.len();
        let idx = self.bond_types.len();
        self.adjacency[x].push(y);
        self.adjacency[y].push(x);
        self.bond_matrix[x * n + y] = idx as u32;
        self.bond_matrix[y * n + x] = idx as u32;
        self.bond_types.push(kind);
        self.bond_atoms.push([x, y]);
    }

    /// Attach rest-hydrogen flags, indexed like the atoms. Missing entries count as unset.
    pub fn with_rest_hydrogen_flags(mut self, flags: &[bool]) -> Self {
        let mut flags = flags.to_vec();
        flags.resize(self.atom_numbers.len(), false);
        self.rest_h = Some(flags);
        self
    }

    /// Decode the same payload again with every hydrogen materialized
    pub fn extend(&self) -> Result<Self, FormatError> {
        let mut out = Self::decode(&self.bytes, &self.options.with_extended(true))?;
        if let Some(flags) = &self.rest_h {
            out = out.with_rest_hydrogen_flags(flags);
        }
        Ok(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
    pub fn header(&self) -> &Header {
        &self.header
    }
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }
    pub fn is_extended(&self) -> bool {
        self.options.extended
    }
    pub fn heavy_atom_count(&self) -> usize {
        self.header.heavy_atoms()
    }
    pub fn hydrogen_atom_count(&self) -> usize {
        self.header.h_atoms
    }
    /// Bonds between two heavy atoms
    pub fn heavy_bond_count(&self) -> usize {
        self.heavy_bond_count
    }
    /// Bonds with a hydrogen on at least one end
    pub fn hydrogen_bond_count(&self) -> usize {
        self.hydrogen_bond_count
    }
}

impl Molecule for BinaryMolecule {
    fn original_atom_count(&self) -> usize {
        self.original_atom_count
    }
    fn original_bond_count(&self) -> usize {
        self.original_bond_count
    }
    fn atom_count(&self) -> usize {
        self.atom_numbers.len()
    }
    fn bond_count(&self) -> usize {
        self.bond_types.len()
    }
    fn has_pseudo_atom(&self) -> bool {
        self.has_pseudo
    }
    fn has_rest_hydrogen_flags(&self) -> bool {
        self.rest_h.is_some()
    }
    fn atom_number(&self, atom: usize) -> i8 {
        self.atom_numbers[atom]
    }
    fn atom_hydrogen_count(&self, atom: usize) -> u8 {
        self.hydrogens[atom]
    }
    fn atom_formal_charge(&self, atom: usize) -> i8 {
        self.charges[atom]
    }
    fn atom_mass(&self, atom: usize) -> u8 {
        self.masses[atom]
    }
    fn atom_radical(&self, atom: usize) -> Radical {
        self.radicals[atom]
    }
    fn atom_stereo(&self, atom: usize) -> TetrahedralStereo {
        self.atom_stereo[atom]
    }
    fn atom_rest_hydrogen_flag(&self, atom: usize) -> bool {
        self.rest_h
            .as_ref()
            .is_some_and(|flags| flags.get(atom).copied().unwrap_or(false))
    }
    fn bond(&self, atom0: usize, atom1: usize) -> Option<usize> {
        let n = self.atom_numbers.len();
        match self.bond_matrix[atom0 * n + atom1] {
            NO_BOND => None,
            b => Some(b as usize),
        }
    }
    fn bond_type(&self, bond: usize) -> BondType {
        self.bond_types[bond]
    }
    fn bond_stereo(&self, bond: usize) -> BondStereo {
        self.bond_stereo[bond]
    }
    fn bond_atom(&self, bond: usize, end: usize) -> usize {
        self.bond_atoms[bond][end]
    }
    fn bonded_atoms(&self, atom: usize) -> &[usize] {
        &self.adjacency[atom]
    }
}
