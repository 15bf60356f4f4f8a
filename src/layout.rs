//! Record layout table for SSM/T-2 data records.
//!
//! A data record is a flat run of big-endian primitives with no padding or
//! length prefixes. The table below lists them in file order together with
//! the output variable each run is stored into.

/// Primitive types found in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl Primitive {
    /// Encoded width in bytes.
    pub const fn size(self) -> usize {
        match self {
            Primitive::Int32 | Primitive::UInt32 | Primitive::Float32 => 4,
            Primitive::Float64 => 8,
        }
    }
}

/// Element type of a decoded output array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    F64,
    F32,
    U32,
}

impl Storage {
    /// Whether a primitive can be stored without loss.
    pub fn accepts(self, primitive: Primitive) -> bool {
        match self {
            Storage::F64 => true,
            Storage::F32 => primitive == Primitive::Float32,
            Storage::U32 => primitive == Primitive::UInt32,
        }
    }
}

/// How a run of values lands in its variable's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Values are appended to the row in file order.
    Append,
    /// The run holds `channels` consecutive blocks (one per channel) of
    /// scan positions; the row is stored as `[scan][channel]`.
    ChannelMajor { channels: usize },
}

/// Output variable fed by one or more field runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: &'static str,
    pub storage: Storage,
}

/// One run of identical primitives in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub variable: &'static str,
    pub primitive: Primitive,
    pub count: usize,
    pub placement: Placement,
}

impl FieldSpec {
    pub const fn bytes(&self) -> usize {
        self.primitive.size() * self.count
    }
}

const fn field(
    name: &'static str,
    variable: &'static str,
    primitive: Primitive,
    count: usize,
) -> FieldSpec {
    FieldSpec {
        name,
        variable,
        primitive,
        count,
        placement: Placement::Append,
    }
}

const fn channel_major(
    name: &'static str,
    variable: &'static str,
    primitive: Primitive,
    count: usize,
    channels: usize,
) -> FieldSpec {
    FieldSpec {
        name,
        variable,
        primitive,
        count,
        placement: Placement::ChannelMajor { channels },
    }
}

/// Ordered description of one binary data record.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub variables: &'static [VariableSpec],
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Total encoded size of one record.
    pub fn record_bytes(&self) -> usize {
        self.fields.iter().map(FieldSpec::bytes).sum()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Number of values one record contributes to `variable`.
    pub fn row_len(&self, variable: &str) -> usize {
        self.fields
            .iter()
            .filter(|f| f.variable == variable)
            .map(|f| f.count)
            .sum()
    }

    /// Check that every field targets a known variable with a compatible
    /// element type and a well-formed placement.
    pub fn validate(&self) -> Result<(), String> {
        for f in self.fields {
            let var = self
                .variables
                .iter()
                .find(|v| v.name == f.variable)
                .ok_or_else(|| format!("field '{}' targets unknown variable '{}'", f.name, f.variable))?;
            if !var.storage.accepts(f.primitive) {
                return Err(format!(
                    "field '{}' ({:?}) cannot be stored as {:?}",
                    f.name, f.primitive, var.storage
                ));
            }
            if let Placement::ChannelMajor { channels } = f.placement {
                if channels == 0 || f.count % channels != 0 {
                    return Err(format!(
                        "field '{}' count {} is not divisible into {} channels",
                        f.name, f.count, channels
                    ));
                }
                if self.row_len(f.variable) != f.count {
                    return Err(format!(
                        "channel-major field '{}' must be the only run of '{}'",
                        f.name, f.variable
                    ));
                }
            }
        }
        Ok(())
    }
}

pub const SCAN_POSITIONS: usize = 28;
pub const CHANNELS: usize = 5;
pub const HOUSEKEEPING_TEMPS: usize = 18;
pub const CALIBRATION_COUNTS: usize = 4;
pub const ANCILLARY_VALUES: usize = 10;

use Primitive::{Float32, Float64, Int32, UInt32};

const SSMT2_VARIABLES: &[VariableSpec] = &[
    VariableSpec { name: "ancil_data", storage: Storage::F64 },
    VariableSpec { name: "lat", storage: Storage::F32 },
    VariableSpec { name: "lon", storage: Storage::F32 },
    VariableSpec { name: "tb", storage: Storage::F32 },
    VariableSpec { name: "channel_quality_flag", storage: Storage::U32 },
    VariableSpec { name: "gain_control", storage: Storage::U32 },
    VariableSpec { name: "counts_to_tb_gain", storage: Storage::F32 },
    VariableSpec { name: "counts_to_tb_offset", storage: Storage::F32 },
    VariableSpec { name: "thermal_reference", storage: Storage::U32 },
    VariableSpec { name: "Temperature_misc_housekeeping", storage: Storage::U32 },
    VariableSpec { name: "warm_counts", storage: Storage::U32 },
    VariableSpec { name: "cold_counts", storage: Storage::U32 },
];

const SSMT2_FIELDS: &[FieldSpec] = &[
    // year, day of year
    field("scan_date", "ancil_data", Int32, 2),
    field("scan_seconds_of_day", "ancil_data", Float64, 1),
    // satellite lat, lon, altitude, heading
    field("satellite_position", "ancil_data", Float32, 4),
    field("ephemeris_date", "ancil_data", Int32, 2),
    field("ephemeris_seconds_of_day", "ancil_data", Float64, 1),
    field("lat", "lat", Float32, SCAN_POSITIONS),
    field("lon", "lon", Float32, SCAN_POSITIONS),
    channel_major("tb", "tb", Float32, SCAN_POSITIONS * CHANNELS, CHANNELS),
    channel_major(
        "channel_quality_flag",
        "channel_quality_flag",
        UInt32,
        SCAN_POSITIONS * CHANNELS,
        CHANNELS,
    ),
    field("gain_control", "gain_control", UInt32, CHANNELS),
    field("counts_to_tb_gain", "counts_to_tb_gain", Float32, CHANNELS),
    field("counts_to_tb_offset", "counts_to_tb_offset", Float32, CHANNELS),
    field("thermal_reference", "thermal_reference", UInt32, 1),
    field(
        "Temperature_misc_housekeeping",
        "Temperature_misc_housekeeping",
        UInt32,
        HOUSEKEEPING_TEMPS,
    ),
    field("warm_counts", "warm_counts", UInt32, CHANNELS * CALIBRATION_COUNTS),
    field("cold_counts", "cold_counts", UInt32, CHANNELS * CALIBRATION_COUNTS),
];

/// Layout of an SSM/T-2 data record.
pub static SSMT2_LAYOUT: RecordLayout = RecordLayout {
    variables: SSMT2_VARIABLES,
    fields: SSMT2_FIELDS,
};
