//! High-level API for reading `.T2` files.

use crate::decoder::RecordDecoder;
use crate::error::Result;
use crate::header::{Header, RecordGeometry};
use crate::layout::{RecordLayout, SSMT2_LAYOUT};
use crate::models::DecodedFields;
use log::info;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A reader for SSM/T-2 `.T2` files.
///
/// The header is parsed as soon as the reader is created, so a file with a
/// missing or malformed header is rejected before any record is decoded.
///
/// # Examples
///
/// ```no_run
/// use ssmt2_netcdf::T2Reader;
///
/// let reader = T2Reader::from_file("orbit.T2")?;
/// println!("{} data records", reader.geometry().data_records);
///
/// let fields = reader.read_all()?;
/// # Ok::<(), ssmt2_netcdf::Error>(())
/// ```
pub struct T2Reader {
    data: Vec<u8>,
    header: Header,
    geometry: RecordGeometry,
    layout: &'static RecordLayout,
}

impl T2Reader {
    /// Create a new reader from a file path.
    ///
    /// The whole file is read into memory and the handle closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its header is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        drop(file);

        Self::with_layout(data, &SSMT2_LAYOUT)
    }

    /// Create a new reader from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::with_layout(data, &SSMT2_LAYOUT)
    }

    fn with_layout(data: Vec<u8>, layout: &'static RecordLayout) -> Result<Self> {
        let header = Header::parse(&data)?;
        let geometry = header.geometry()?;

        info!(
            "header: {} header records, {} data records, {} bytes per record",
            geometry.header_records, geometry.data_records, geometry.record_bytes
        );

        Ok(Self {
            data,
            header,
            geometry,
            layout,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn geometry(&self) -> RecordGeometry {
        self.geometry
    }

    /// Decode every data record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record layout does not match the declared
    /// record size, or the data region is truncated.
    pub fn read_all(self) -> Result<DecodedFields> {
        self.read_all_with_header().map(|(fields, _)| fields)
    }

    /// Decode every data record and hand back the parsed header.
    pub fn read_all_with_header(self) -> Result<(DecodedFields, Header)> {
        let decoder = RecordDecoder::new(self.layout, self.geometry.record_bytes)?;
        let fields = decoder.decode(
            &self.data,
            self.geometry.data_start(),
            self.geometry.data_records,
        )?;
        Ok((fields, self.header))
    }
}

/// Builder for configuring `.T2` parsing options.
///
/// # Examples
///
/// ```no_run
/// use ssmt2_netcdf::{T2ReaderBuilder, SSMT2_LAYOUT};
///
/// let reader = T2ReaderBuilder::new()
///     .layout(&SSMT2_LAYOUT)
///     .from_file("orbit.T2")?;
/// let fields = reader.read_all()?;
/// # Ok::<(), ssmt2_netcdf::Error>(())
/// ```
pub struct T2ReaderBuilder {
    layout: &'static RecordLayout,
}

impl T2ReaderBuilder {
    /// Create a new reader builder using the SSM/T-2 record layout.
    pub fn new() -> Self {
        Self {
            layout: &SSMT2_LAYOUT,
        }
    }

    /// Set the record layout table.
    ///
    /// The layout describes every primitive of one data record in file
    /// order. Its total size must equal the header's `record bytes`, or
    /// decoding fails with `FormatError::RecordSizeMismatch`. Defaults to
    /// [`SSMT2_LAYOUT`].
    ///
    /// # Arguments
    ///
    /// * `layout` - Record layout table used by the decoder
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ssmt2_netcdf::{T2ReaderBuilder, SSMT2_LAYOUT};
    ///
    /// let fields = T2ReaderBuilder::new()
    ///     .layout(&SSMT2_LAYOUT)
    ///     .from_file("orbit.T2")?
    ///     .read_all()?;
    /// # Ok::<(), ssmt2_netcdf::Error>(())
    /// ```
    pub fn layout(mut self, layout: &'static RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Build a reader from a file path.
    pub fn from_file<P: AsRef<Path>>(self, path: P) -> Result<T2Reader> {
        let data = std::fs::read(path.as_ref())?;
        T2Reader::with_layout(data, self.layout)
    }

    /// Build a reader from raw bytes.
    pub fn from_bytes(self, data: Vec<u8>) -> Result<T2Reader> {
        T2Reader::with_layout(data, self.layout)
    }
}

impl Default for T2ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
