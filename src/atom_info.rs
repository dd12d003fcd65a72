//! This file is pretty much a periodic table, trimmed down to what matching needs

use ElementClass::*;

/// Coarse classification used by the `M` and `X` wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    /// Matched by the metal wildcard
    Metal,
    /// Matched by the halogen wildcard
    Halogen,
    /// Everything else
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct ElementData {
    pub sym: &'static str,
    pub class: ElementClass,
}
impl ElementData {
    pub const fn new(sym: &'static str, class: ElementClass) -> Self {
        Self { sym, class }
    }
}

/// Look up an element by atomic number, `None` for anything outside the table
#[inline]
pub fn element(number: u8) -> Option<&'static ElementData> {
    if number == 0 {
        None
    } else {
        ELEMENTS.get(number as usize)
    }
}

/// Index by atomic number, entry 0 is a placeholder
#[rustfmt::skip]
pub static ELEMENTS: &[ElementData] = &[
    ElementData::new("?",  Other),
    ElementData::new("H",  Other),   ElementData::new("He", Other),
    ElementData::new("Li", Metal),   ElementData::new("Be", Metal),
    ElementData::new("B",  Other),   ElementData::new("C",  Other),
    ElementData::new("N",  Other),   ElementData::new("O",  Other),
    ElementData::new("F",  Halogen), ElementData::new("Ne", Other),
    ElementData::new("Na", Metal),   ElementData::new("Mg", Metal),
    ElementData::new("Al", Metal),   ElementData::new("Si", Other),
    ElementData::new("P",  Other),   ElementData::new("S",  Other),
    ElementData::new("Cl", Halogen), ElementData::new("Ar", Other),
    ElementData::new("K",  Metal),   ElementData::new("Ca", Metal),
    ElementData::new("Sc", Metal),   ElementData::new("Ti", Metal),
    ElementData::new("V",  Metal),   ElementData::new("Cr", Metal),
    ElementData::new("Mn", Metal),   ElementData::new("Fe", Metal),
    ElementData::new("Co", Metal),   ElementData::new("Ni", Metal),
    ElementData::new("Cu", Metal),   ElementData::new("Zn", Metal),
    ElementData::new("Ga", Metal),   ElementData::new("Ge", Other),
    ElementData::new("As", Other),   ElementData::new("Se", Other),
    ElementData::new("Br", Halogen), ElementData::new("Kr", Other),
    ElementData::new("Rb", Metal),   ElementData::new("Sr", Metal),
    ElementData::new("Y",  Metal),   ElementData::new("Zr", Metal),
    ElementData::new("Nb", Metal),   ElementData::new("Mo", Metal),
    ElementData::new("Tc", Metal),   ElementData::new("Ru", Metal),
    ElementData::new("Rh", Metal),   ElementData::new("Pd", Metal),
    ElementData::new("Ag", Metal),   ElementData::new("Cd", Metal),
    ElementData::new("In", Metal),   ElementData::new("Sn", Metal),
    ElementData::new("Sb", Other),   ElementData::new("Te", Other),
    ElementData::new("I",  Halogen), ElementData::new("Xe", Other),
    ElementData::new("Cs", Metal),   ElementData::new("Ba", Metal),
    ElementData::new("La", Metal),   ElementData::new("Ce", Metal),
    ElementData::new("Pr", Metal),   ElementData::new("Nd", Metal),
    ElementData::new("Pm", Metal),   ElementData::new("Sm", Metal),
    ElementData::new("Eu", Metal),   ElementData::new("Gd", Metal),
    ElementData::new("Tb", Metal),   ElementData::new("Dy", Metal),
    ElementData::new("Ho", Metal),   ElementData::new("Er", Metal),
    ElementData::new("Tm", Metal),   ElementData::new("Yb", Metal),
    ElementData::new("Lu", Metal),   ElementData::new("Hf", Metal),
    ElementData::new("Ta", Metal),   ElementData::new("W",  Metal),
    ElementData::new("Re", Metal),   ElementData::new("Os", Metal),
    ElementData::new("Ir", Metal),   ElementData::new("Pt", Metal),
    ElementData::new("Au", Metal),   ElementData::new("Hg", Metal),
    ElementData::new("Tl", Metal),   ElementData::new("Pb", Metal),
    ElementData::new("Bi", Metal),   ElementData::new("Po", Metal),
    ElementData::new("At", Halogen), ElementData::new("Rn", Other),
    ElementData::new("Fr", Metal),   ElementData::new("Ra", Metal),
    ElementData::new("Ac", Metal),   ElementData::new("Th", Metal),
    ElementData::new("Pa", Metal),   ElementData::new("U",  Metal),
    ElementData::new("Np", Metal),   ElementData::new("Pu", Metal),
    ElementData::new("Am", Metal),   ElementData::new("Cm", Metal),
    ElementData::new("Bk", Metal),   ElementData::new("Cf", Metal),
    ElementData::new("Es", Metal),   ElementData::new("Fm", Metal),
    ElementData::new("Md", Metal),   ElementData::new("No", Metal),
    ElementData::new("Lr", Metal),   ElementData::new("Rf", Metal),
    ElementData::new("Db", Metal),   ElementData::new("Sg", Metal),
    ElementData::new("Bh", Metal),   ElementData::new("Hs", Metal),
    ElementData::new("Mt", Metal),   ElementData::new("Ds", Metal),
    ElementData::new("Rg", Metal),   ElementData::new("Cn", Metal),
    ElementData::new("Nh", Metal),   ElementData::new("Fl", Metal),
    ElementData::new("Mc", Metal),   ElementData::new("Lv", Metal),
    // anything past radon counts as a metal, tennessine included
    ElementData::new("Ts", Metal),   ElementData::new("Og", Metal),
];
