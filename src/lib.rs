#[rustfmt::skip]
pub mod atom_info;
pub mod codec;
pub mod config;
pub mod core;
pub mod fingerprint;
pub mod isomorphism;
pub mod molecule;
pub mod search;
pub mod sort;
pub mod stereo;
pub mod utils;

#[cfg(test)]
mod tests;
