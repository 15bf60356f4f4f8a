use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::{ANCILLARY_VALUES, CALIBRATION_COUNTS, CHANNELS, HOUSEKEEPING_TEMPS, SCAN_POSITIONS};
use crate::models::{ArrayData, DecodedFields, FieldArray};

/// A fixed-size output dimension.
#[derive(Debug, Clone, Copy)]
pub struct DimensionSpec {
    pub name: &'static str,
    pub len: usize,
}

/// An output variable; `dims` excludes the leading time dimension.
#[derive(Debug, Clone, Copy)]
pub struct VariableSchema {
    pub name: &'static str,
    pub dims: &'static [&'static str],
}

/// Dimensions and variables of an output file.
#[derive(Debug, Clone, Copy)]
pub struct OutputSchema {
    pub time_dimension: &'static str,
    pub dimensions: &'static [DimensionSpec],
    pub variables: &'static [VariableSchema],
}

impl OutputSchema {
    fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().find(|d| d.name == name).map(|d| d.len)
    }

    /// Values per record of `variable`.
    pub fn row_len(&self, variable: &VariableSchema) -> Result<usize> {
        variable.dims.iter().try_fold(1usize, |acc, dim| {
            self.dimension_len(dim)
                .map(|len| acc * len)
                .ok_or_else(|| Error::Schema(format!("unknown dimension '{}'", dim)))
        })
    }
}

pub const TIME_DIM: &str = "time_step";
pub const SCAN_DIM: &str = "scan_position";
pub const CHANNEL_DIM: &str = "channel";
pub const HOUSEKEEPING_DIM: &str = "housekeeping";
pub const CALIBRATION_DIM: &str = "calib_number";
pub const ANCILLARY_DIM: &str = "ancil_data:Year_DayofYear_SecondsofDay_SatLat_SatLong_SatAlt_SatHeading_Year_DayofYear_SecondsofDay";

/// Output layout for SSM/T-2 files.
pub static SSMT2_SCHEMA: OutputSchema = OutputSchema {
    time_dimension: TIME_DIM,
    dimensions: &[
        DimensionSpec { name: SCAN_DIM, len: SCAN_POSITIONS },
        DimensionSpec { name: CHANNEL_DIM, len: CHANNELS },
        DimensionSpec { name: HOUSEKEEPING_DIM, len: HOUSEKEEPING_TEMPS },
        DimensionSpec { name: CALIBRATION_DIM, len: CALIBRATION_COUNTS },
        DimensionSpec { name: ANCILLARY_DIM, len: ANCILLARY_VALUES },
    ],
    variables: &[
        VariableSchema { name: "ancil_data", dims: &[ANCILLARY_DIM] },
        VariableSchema { name: "tb", dims: &[SCAN_DIM, CHANNEL_DIM] },
        VariableSchema { name: "lon", dims: &[SCAN_DIM] },
        VariableSchema { name: "lat", dims: &[SCAN_DIM] },
        VariableSchema { name: "channel_quality_flag", dims: &[SCAN_DIM, CHANNEL_DIM] },
        VariableSchema { name: "gain_control", dims: &[CHANNEL_DIM] },
        VariableSchema { name: "counts_to_tb_gain", dims: &[CHANNEL_DIM] },
        VariableSchema { name: "counts_to_tb_offset", dims: &[CHANNEL_DIM] },
        VariableSchema { name: "thermal_reference", dims: &[] },
        VariableSchema { name: "Temperature_misc_housekeeping", dims: &[HOUSEKEEPING_DIM] },
        VariableSchema { name: "warm_counts", dims: &[CHANNEL_DIM, CALIBRATION_DIM] },
        VariableSchema { name: "cold_counts", dims: &[CHANNEL_DIM, CALIBRATION_DIM] },
    ],
};

pub struct NetcdfFormatter {
    output_path: PathBuf,
    schema: &'static OutputSchema,
    compression: Option<i32>,
}

impl NetcdfFormatter {
    pub fn new(output_path: &Path, schema: &'static OutputSchema, compression: Option<i32>) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            schema,
            compression,
        }
    }

    /// Check every schema variable against its decoded array.
    fn resolve<'f>(&self, fields: &'f DecodedFields) -> Result<Vec<(&'static VariableSchema, &'f FieldArray)>> {
        let mut resolved = Vec::with_capacity(self.schema.variables.len());
        for variable in self.schema.variables {
            let array = fields
                .get(variable.name)
                .ok_or_else(|| Error::Schema(format!("no decoded array for '{}'", variable.name)))?;
            let row_len = self.schema.row_len(variable)?;
            if array.row_len != row_len || array.rows != fields.records {
                return Err(Error::Schema(format!(
                    "'{}' is {}x{}, schema expects {}x{}",
                    variable.name, array.rows, array.row_len, fields.records, row_len
                )));
            }
            resolved.push((variable, array));
        }
        Ok(resolved)
    }

    /// Create the output file and write attributes and all arrays.
    pub fn convert(&self, attributes: &[(String, String)], fields: &DecodedFields) -> Result<()> {
        let resolved = self.resolve(fields)?;

        if self.output_path.exists() {
            fs::remove_file(&self.output_path)?;
        }
        let mut file = netcdf::create(&self.output_path)?;

        for (name, value) in attributes {
            if name.is_empty() {
                continue;
            }
            file.add_attribute(name, value.as_str())?;
        }

        file.add_dimension(self.schema.time_dimension, fields.records)?;
        for dim in self.schema.dimensions {
            file.add_dimension(dim.name, dim.len)?;
        }

        for (variable, array) in resolved {
            let mut dims = Vec::with_capacity(variable.dims.len() + 1);
            dims.push(self.schema.time_dimension);
            dims.extend_from_slice(variable.dims);

            debug!("writing variable {} {:?}", variable.name, dims);
            match &array.data {
                ArrayData::F64(values) => self.put(&mut file, variable.name, &dims, values)?,
                ArrayData::F32(values) => self.put(&mut file, variable.name, &dims, values)?,
                ArrayData::U32(values) => self.put(&mut file, variable.name, &dims, values)?,
            }
        }

        info!(
            "Wrote {} variables and {} attributes to {}",
            self.schema.variables.len(),
            attributes.len(),
            self.output_path.display()
        );
        Ok(())
    }

    fn put<T>(&self, file: &mut netcdf::FileMut, name: &str, dims: &[&str], values: &[T]) -> Result<()>
    where
        T: netcdf::NcTypeDescriptor + Copy,
    {
        let mut var = file.add_variable::<T>(name, dims)?;
        if let Some(level) = self.compression {
            var.set_compression(level, true)?;
        }
        if !values.is_empty() {
            var.put_values(values, ..)?;
        }
        Ok(())
    }
}
