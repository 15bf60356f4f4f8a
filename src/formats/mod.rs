//! Output container formats.

pub mod netcdf;
