//! # SSM/T-2 NetCDF converter
//!
//! A Rust library for converting SSM/T-2 sounder data files (`.T2`) into
//! NetCDF-4, plus a splitter that breaks monthly CFSR reanalysis files into
//! per-day files.
//!
//! ## Features
//!
//! - **Header parsing**: record counts and sizes read from the text header
//! - **Explicit record layout**: the binary record is described by a table of
//!   `(field, primitive, count)` runs instead of hard-coded read calls
//! - **Strict decoding**: truncated inputs and misaligned record boundaries
//!   are reported, never silently accepted
//! - **NetCDF output**: fixed dimension/variable schema, header copied into
//!   global attributes
//!
//! ## Quick Start
//!
//! ```no_run
//! use ssmt2_netcdf::{NetcdfWriter, T2Reader};
//!
//! let reader = T2Reader::from_file("NOAA14.T2")?;
//! let (fields, header) = reader.read_all_with_header()?;
//!
//! println!("Decoded {} records", fields.records);
//!
//! NetcdfWriter::new("NOAA14.nc").write(&header, &fields)?;
//! # Ok::<(), ssmt2_netcdf::Error>(())
//! ```
//!
//! ## File Layout
//!
//! A `.T2` file starts with a text header of `key: value` lines padded with
//! spaces. The header declares `number of header records`, `record bytes`
//! and `number of data records` (or `number of records`, from which the
//! header records are subtracted). Data records follow at
//! `header records × record bytes`, each a fixed sequence of big-endian
//! integers and floats; see [`layout::SSMT2_LAYOUT`].
//!
//! ## Day Splitting
//!
//! ```no_run
//! use ssmt2_netcdf::splitter::{split_by_day, SplitConfig};
//! use std::path::Path;
//!
//! let config = SplitConfig::new("/data/reanalysis_per_day");
//! let stats = split_by_day(Path::new("tmpsfc.cdas1.201301.grb2.nc.bz2"), "T_surf", &config)?;
//! println!("Wrote {} daily files", stats.files.len());
//! # Ok::<(), ssmt2_netcdf::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use ssmt2_netcdf::{Error, T2Reader};
//!
//! match T2Reader::from_file("NOAA14.T2") {
//!     Ok(reader) => {
//!         // Decode the records...
//!     }
//!     Err(Error::Format(err)) => {
//!         eprintln!("Invalid T2 file: {}", err);
//!     }
//!     Err(Error::Io(err)) => {
//!         eprintln!("I/O error: {}", err);
//!     }
//!     Err(err) => {
//!         eprintln!("Error: {}", err);
//!     }
//! }
//! ```

use regex::Regex;
use std::sync::LazyLock;

// Public API modules
pub mod error;
pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use error::{Error, FormatError, Result};
pub use reader::{T2Reader, T2ReaderBuilder};
pub use writer::{NetcdfWriter, NetcdfWriterBuilder, WriteStats};

pub use header::{Header, RecordGeometry};
pub use layout::{RecordLayout, SSMT2_LAYOUT};
pub use models::{ArrayData, DecodedFields, FieldArray};

// Internal modules (public but not part of the high-level API)
pub mod decoder;
pub mod formats;
pub mod header;
pub mod layout;
pub mod models;
pub mod splitter;

static T2_FILE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+.T2").expect("Invalid T2 file name regex"));

/// Whether a file name looks like an SSM/T-2 data file.
///
/// Searches for `\S+.T2` anywhere in the name: some non-whitespace text,
/// any one character, then `T2`.
pub fn is_t2_file_name(name: &str) -> bool {
    T2_FILE_NAME_REGEX.is_match(name)
}
