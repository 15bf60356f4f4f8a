//! High-level API for writing decoded SSM/T-2 data to NetCDF.

use crate::error::{Error, Result};
use crate::formats::netcdf::{NetcdfFormatter, OutputSchema, SSMT2_SCHEMA};
use crate::header::Header;
use crate::models::DecodedFields;
use std::path::{Path, PathBuf};

/// Writer for outputting decoded records to a single NetCDF-4 file.
///
/// The whole file is defined and written in one call: dimensions, global
/// attributes copied from the header, then one bulk write per variable.
/// An existing file at the output path is replaced.
///
/// # Examples
///
/// ```no_run
/// use ssmt2_netcdf::{NetcdfWriter, T2Reader};
///
/// let reader = T2Reader::from_file("orbit.T2")?;
/// let (fields, header) = reader.read_all_with_header()?;
///
/// NetcdfWriter::new("orbit.nc").write(&header, &fields)?;
/// # Ok::<(), ssmt2_netcdf::Error>(())
/// ```
pub struct NetcdfWriter {
    output_path: PathBuf,
    schema: &'static OutputSchema,
    compression: Option<i32>,
}

impl NetcdfWriter {
    /// Create a writer targeting `output_path` with the SSM/T-2 schema.
    ///
    /// # Arguments
    ///
    /// * `output_path` - NetCDF file to create; an existing file is replaced
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ssmt2_netcdf::NetcdfWriter;
    ///
    /// let writer = NetcdfWriter::new("orbit.nc");
    /// ```
    pub fn new<P: AsRef<Path>>(output_path: P) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            schema: &SSMT2_SCHEMA,
            compression: None,
        }
    }

    /// Enable deflate compression on every variable.
    ///
    /// Output is uncompressed by default. The level is checked when the file
    /// is written; anything outside 1-9 is an `Error::InvalidArgument`.
    ///
    /// # Arguments
    ///
    /// * `level` - Deflate level, 1 (fastest) to 9 (smallest)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ssmt2_netcdf::NetcdfWriter;
    ///
    /// let writer = NetcdfWriter::new("orbit.nc").compression(4);
    /// ```
    pub fn compression(mut self, level: i32) -> Self {
        self.compression = Some(level);
        self
    }

    /// Write header attributes and all decoded arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A schema variable has no matching array, or its shape differs
    /// - The output file cannot be created or written
    pub fn write(self, header: &Header, fields: &DecodedFields) -> Result<()> {
        let compression = match self.compression {
            Some(level) if !(1..=9).contains(&level) => {
                return Err(Error::InvalidArgument(format!(
                    "compression level must be 1-9, got {}",
                    level
                )))
            }
            other => other,
        };

        NetcdfFormatter::new(&self.output_path, self.schema, compression)
            .convert(&header.attributes(), fields)
    }

    /// Write and return statistics about the write operation.
    pub fn write_with_stats(self, header: &Header, fields: &DecodedFields) -> Result<WriteStats> {
        let num_variables = self.schema.variables.len();
        let num_attributes = header.attributes().len();
        let num_records = fields.records;

        self.write(header, fields)?;

        Ok(WriteStats {
            num_records,
            num_variables,
            num_attributes,
        })
    }
}

/// Statistics about a NetCDF write operation.
#[derive(Debug, Clone)]
pub struct WriteStats {
    /// Length of the time dimension
    pub num_records: usize,
    /// Variables written
    pub num_variables: usize,
    /// Global attributes copied from the header
    pub num_attributes: usize,
}

impl WriteStats {
    /// Get a human-readable summary of the write operation.
    pub fn summary(&self) -> String {
        format!(
            "Wrote {} records into {} variables ({} global attributes)",
            self.num_records, self.num_variables, self.num_attributes
        )
    }
}

/// Builder for configuring NetCDF write options.
///
/// # Examples
///
/// ```no_run
/// use ssmt2_netcdf::{NetcdfWriterBuilder, T2Reader};
///
/// let (fields, header) = T2Reader::from_file("orbit.T2")?.read_all_with_header()?;
///
/// NetcdfWriterBuilder::new()
///     .output_path("orbit.nc")
///     .compression(4)
///     .build()?
///     .write(&header, &fields)?;
/// # Ok::<(), ssmt2_netcdf::Error>(())
/// ```
pub struct NetcdfWriterBuilder {
    output_path: Option<PathBuf>,
    schema: &'static OutputSchema,
    compression: Option<i32>,
}

impl NetcdfWriterBuilder {
    pub fn new() -> Self {
        Self {
            output_path: None,
            schema: &SSMT2_SCHEMA,
            compression: None,
        }
    }

    pub fn output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a different output schema.
    ///
    /// The schema decides which dimensions are defined and which decoded
    /// arrays are written. Defaults to [`SSMT2_SCHEMA`].
    ///
    /// # Arguments
    ///
    /// * `schema` - Dimensions and variables of the output file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ssmt2_netcdf::formats::netcdf::SSMT2_SCHEMA;
    /// use ssmt2_netcdf::NetcdfWriterBuilder;
    ///
    /// let writer = NetcdfWriterBuilder::new()
    ///     .output_path("orbit.nc")
    ///     .schema(&SSMT2_SCHEMA)
    ///     .build()?;
    /// # Ok::<(), ssmt2_netcdf::Error>(())
    /// ```
    pub fn schema(mut self, schema: &'static OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Enable deflate compression on every variable.
    ///
    /// # Arguments
    ///
    /// * `level` - Deflate level, 1 (fastest) to 9 (smallest)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ssmt2_netcdf::NetcdfWriterBuilder;
    ///
    /// let writer = NetcdfWriterBuilder::new()
    ///     .output_path("orbit.nc")
    ///     .compression(9)
    ///     .build()?;
    /// # Ok::<(), ssmt2_netcdf::Error>(())
    /// ```
    pub fn compression(mut self, level: i32) -> Self {
        self.compression = Some(level);
        self
    }

    /// Build the NetCDF writer.
    ///
    /// # Errors
    ///
    /// Returns an error if output_path was not set.
    pub fn build(self) -> Result<NetcdfWriter> {
        let output_path = self
            .output_path
            .ok_or_else(|| Error::Other("Output path not set".to_string()))?;

        Ok(NetcdfWriter {
            output_path,
            schema: self.schema,
            compression: self.compression,
        })
    }
}

impl Default for NetcdfWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
