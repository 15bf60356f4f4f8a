//! Split a monthly CFSR reanalysis NetCDF file into one file per day.
//!
//! The monthly file arrives compressed (`.gz` or `.bz2`). It is unpacked to
//! a temporary file, every numeric variable is loaded once, and for each
//! calendar day a new file is written holding that day's slice of the
//! `time` axis. Non-time dimensions and all attributes are copied verbatim.

use bzip2::read::BzDecoder;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::{AttributeValue, NcTypeDescriptor};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Where and how per-day files are written.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Root directory of the per-day tree.
    pub output_root: PathBuf,
    /// Directory below the root; `{year}`, `{month}` and `{day}` are replaced.
    pub directory_template: String,
    /// File name; `{var}` is replaced by the variable name.
    pub file_template: String,
    /// Name of the time dimension and coordinate variable.
    pub time_variable: String,
    /// Deflate level applied to every variable.
    pub compression: i32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            directory_template: "{year}/{month}/{day}".to_string(),
            file_template: "{var}.nc".to_string(),
            time_variable: "time".to_string(),
            compression: 4,
        }
    }
}

impl SplitConfig {
    pub fn new<P: AsRef<Path>>(output_root: P) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Output path of `var` for `date`.
    pub fn output_path(&self, date: NaiveDate, var: &str) -> PathBuf {
        let directory = render(&self.directory_template, date, var);
        let file = render(&self.file_template, date, var);
        self.output_root.join(directory).join(file)
    }
}

fn render(template: &str, date: NaiveDate, var: &str) -> String {
    template
        .replace("{year}", &format!("{:04}", date.year()))
        .replace("{month}", &format!("{:02}", date.month()))
        .replace("{day}", &format!("{:02}", date.day()))
        .replace("{var}", var)
}

/// Result of splitting one monthly file.
#[derive(Debug, Clone)]
pub struct SplitStats {
    pub days: usize,
    pub files: Vec<PathBuf>,
}

/// Unpack a `.gz` or `.bz2` file into a temporary file.
pub fn decompress_to_temp(input: &Path) -> Result<NamedTempFile> {
    let name = input.to_string_lossy();
    let source = BufReader::new(File::open(input)?);
    let mut decoder: Box<dyn Read> = if name.ends_with(".gz") {
        Box::new(GzDecoder::new(source))
    } else if name.ends_with(".bz2") {
        Box::new(BzDecoder::new(source))
    } else {
        return Err(Error::InvalidArgument(format!(
            "don't know how to open {}",
            name
        )));
    };

    let mut temp = NamedTempFile::new()?;
    info!("Unpacking {} to {}", name, temp.path().display());
    io::copy(&mut decoder, temp.as_file_mut())?;
    Ok(temp)
}

/// Parsed CF-style `units` of a time coordinate, e.g. `hours since 1979-01-01 00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    seconds_per_unit: f64,
    epoch: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let invalid = || Error::Schema(format!("unsupported time units '{}'", units));

        let (unit, since) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
            "days" | "day" => 86_400.0,
            "hours" | "hour" => 3_600.0,
            "minutes" | "minute" => 60.0,
            "seconds" | "second" => 1.0,
            _ => return Err(invalid()),
        };

        let since = since.trim().trim_end_matches('Z');
        let epoch = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(since, fmt).ok())
            .or_else(|| {
                // tolerate a trailing time zone token after the time
                let mut parts = since.split_whitespace();
                let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
                match parts
                    .next()
                    .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S%.f").ok())
                {
                    Some(time) => Some(date.and_time(time)),
                    None => date.and_hms_opt(0, 0, 0),
                }
            })
            .ok_or_else(invalid)?;

        Ok(Self {
            seconds_per_unit,
            epoch,
        })
    }

    /// Calendar date of a time coordinate value.
    ///
    /// Fill values and other offsets outside chrono's range are an error.
    pub fn date_of(&self, value: f64) -> Result<NaiveDate> {
        let out_of_range = || Error::Schema(format!("time value {} is out of range", value));

        let millis = (value * self.seconds_per_unit * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        let offset = TimeDelta::try_milliseconds(millis as i64).ok_or_else(out_of_range)?;
        self.epoch
            .checked_add_signed(offset)
            .map(|t| t.date())
            .ok_or_else(out_of_range)
    }
}

/// Ranges of consecutive indices falling on the same date.
pub fn day_boundaries(dates: &[NaiveDate]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..dates.len() {
        if dates[i] != dates[i - 1] {
            ranges.push(start..i);
            start = i;
        }
    }
    if !dates.is_empty() {
        ranges.push(start..dates.len());
    }
    ranges
}

/// One `NC_CHAR` element.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NcChar(u8);

// SAFETY: a transparent single byte matches the in-memory layout of NC_CHAR.
unsafe impl NcTypeDescriptor for NcChar {
    fn type_descriptor() -> NcVariableType {
        NcVariableType::Char
    }
}

/// Typed contents of a variable.
#[derive(Debug, Clone, PartialEq)]
enum Values {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Char(Vec<NcChar>),
    Str(Vec<String>),
}

macro_rules! map_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::I8($v) => Values::I8($body),
            Values::U8($v) => Values::U8($body),
            Values::I16($v) => Values::I16($body),
            Values::U16($v) => Values::U16($body),
            Values::I32($v) => Values::I32($body),
            Values::U32($v) => Values::U32($body),
            Values::I64($v) => Values::I64($body),
            Values::U64($v) => Values::U64($body),
            Values::F32($v) => Values::F32($body),
            Values::F64($v) => Values::F64($body),
            Values::Char($v) => Values::Char($body),
            Values::Str($v) => Values::Str($body),
        }
    };
}

impl Values {
    fn read(var: &netcdf::Variable, shape: &[usize]) -> Result<Option<Self>> {
        let values = match var.vartype() {
            NcVariableType::Int(IntType::I8) => Values::I8(var.get_values(..)?),
            NcVariableType::Int(IntType::U8) => Values::U8(var.get_values(..)?),
            NcVariableType::Int(IntType::I16) => Values::I16(var.get_values(..)?),
            NcVariableType::Int(IntType::U16) => Values::U16(var.get_values(..)?),
            NcVariableType::Int(IntType::I32) => Values::I32(var.get_values(..)?),
            NcVariableType::Int(IntType::U32) => Values::U32(var.get_values(..)?),
            NcVariableType::Int(IntType::I64) => Values::I64(var.get_values(..)?),
            NcVariableType::Int(IntType::U64) => Values::U64(var.get_values(..)?),
            NcVariableType::Float(FloatType::F32) => Values::F32(var.get_values(..)?),
            NcVariableType::Float(FloatType::F64) => Values::F64(var.get_values(..)?),
            NcVariableType::Char => Values::Char(var.get_values(..)?),
            NcVariableType::String => {
                let mut strings = Vec::new();
                for index in indices(shape) {
                    strings.push(var.get_string(index)?);
                }
                Values::Str(strings)
            }
            _ => return Ok(None),
        };
        Ok(Some(values))
    }

    fn to_f64(&self) -> Result<Vec<f64>> {
        Ok(match self {
            Values::I8(v) => v.iter().map(|&x| x as f64).collect(),
            Values::U8(v) => v.iter().map(|&x| x as f64).collect(),
            Values::I16(v) => v.iter().map(|&x| x as f64).collect(),
            Values::U16(v) => v.iter().map(|&x| x as f64).collect(),
            Values::I32(v) => v.iter().map(|&x| x as f64).collect(),
            Values::U32(v) => v.iter().map(|&x| x as f64).collect(),
            Values::I64(v) => v.iter().map(|&x| x as f64).collect(),
            Values::U64(v) => v.iter().map(|&x| x as f64).collect(),
            Values::F32(v) => v.iter().map(|&x| x as f64).collect(),
            Values::F64(v) => v.clone(),
            Values::Char(_) | Values::Str(_) => {
                return Err(Error::Schema("time coordinate is not numeric".to_string()))
            }
        })
    }

    fn slice_axis(&self, shape: &[usize], axis: usize, range: &Range<usize>) -> Self {
        map_values!(self, v => slice_axis(v, shape, axis, range))
    }
}

/// Copy `range` along `axis` out of a row-major array of `shape`.
fn slice_axis<T: Clone>(data: &[T], shape: &[usize], axis: usize, range: &Range<usize>) -> Vec<T> {
    let outer: usize = shape[..axis].iter().product();
    let axis_len = shape[axis];
    let inner: usize = shape[axis + 1..].iter().product();

    let mut out = Vec::with_capacity(outer * range.len() * inner);
    for o in 0..outer {
        let base = o * axis_len * inner;
        out.extend_from_slice(&data[base + range.start * inner..base + range.end * inner]);
    }
    out
}

/// Every index of a row-major array of `shape`, in storage order.
fn indices(shape: &[usize]) -> Vec<Vec<usize>> {
    let total: usize = shape.iter().product();
    let mut all = Vec::with_capacity(total);
    let mut index = vec![0usize; shape.len()];
    for _ in 0..total {
        all.push(index.clone());
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    all
}

struct SourceVariable {
    name: String,
    dims: Vec<String>,
    shape: Vec<usize>,
    time_axis: Option<usize>,
    attributes: Vec<(String, AttributeValue)>,
    values: Values,
}

impl SourceVariable {
    fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

fn copied_attribute(name: &str) -> bool {
    // reserved attributes are managed by the library, except the fill value
    !name.starts_with('_') || name == "_FillValue"
}

fn load_variables(file: &netcdf::File, time_dim: &str) -> Result<Vec<SourceVariable>> {
    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let Some(values) = Values::read(&var, &shape)? else {
            warn!("skipping variable {} with unsupported type {:?}", name, var.vartype());
            continue;
        };
        let time_axis = dims.iter().position(|d| d == time_dim);

        let mut attributes = Vec::new();
        for attr in var.attributes() {
            if copied_attribute(attr.name()) {
                attributes.push((attr.name().to_string(), attr.value()?));
            }
        }

        variables.push(SourceVariable {
            name,
            dims,
            shape,
            time_axis,
            attributes,
            values,
        });
    }
    Ok(variables)
}

fn write_variable<T>(
    file: &mut netcdf::FileMut,
    source: &SourceVariable,
    values: &[T],
    compression: i32,
) -> Result<()>
where
    T: NcTypeDescriptor + Copy,
{
    let dims: Vec<&str> = source.dims.iter().map(String::as_str).collect();
    let mut var = file.add_variable::<T>(&source.name, &dims)?;
    if !dims.is_empty() {
        var.set_compression(compression, false)?;
    }
    for (name, value) in &source.attributes {
        var.put_attribute(name, value.clone())?;
    }
    if !values.is_empty() {
        var.put_values(values, ..)?;
    }
    Ok(())
}

/// Variable-length strings are written element by element and never deflated.
fn write_strings(
    file: &mut netcdf::FileMut,
    source: &SourceVariable,
    values: &[String],
    shape: &[usize],
) -> Result<()> {
    let dims: Vec<&str> = source.dims.iter().map(String::as_str).collect();
    let mut var = file.add_string_variable(&source.name, &dims)?;
    for (name, value) in &source.attributes {
        var.put_attribute(name, value.clone())?;
    }
    for (value, index) in values.iter().zip(indices(shape)) {
        var.put_string(value, index)?;
    }
    Ok(())
}

fn write_values(
    file: &mut netcdf::FileMut,
    source: &SourceVariable,
    values: &Values,
    shape: &[usize],
    compression: i32,
) -> Result<()> {
    match values {
        Values::I8(v) => write_variable(file, source, v, compression),
        Values::U8(v) => write_variable(file, source, v, compression),
        Values::I16(v) => write_variable(file, source, v, compression),
        Values::U16(v) => write_variable(file, source, v, compression),
        Values::I32(v) => write_variable(file, source, v, compression),
        Values::U32(v) => write_variable(file, source, v, compression),
        Values::I64(v) => write_variable(file, source, v, compression),
        Values::U64(v) => write_variable(file, source, v, compression),
        Values::F32(v) => write_variable(file, source, v, compression),
        Values::F64(v) => write_variable(file, source, v, compression),
        Values::Char(v) => write_variable(file, source, v, compression),
        Values::Str(v) => write_strings(file, source, v, shape),
    }
}

/// Split `input` into one file per calendar day.
///
/// `var` names the output files (it replaces `{var}` in the file template);
/// every variable of the input is copied into each daily file.
pub fn split_by_day(input: &Path, var: &str, config: &SplitConfig) -> Result<SplitStats> {
    let temp = decompress_to_temp(input)?;
    info!("Opening {}", temp.path().display());
    let source = netcdf::open(temp.path())?;

    let time_dim = config.time_variable.as_str();
    let mut global_attributes = Vec::new();
    for attr in source.attributes() {
        global_attributes.push((attr.name().to_string(), attr.value()?));
    }
    let dimensions: Vec<(String, usize)> = source
        .dimensions()
        .filter(|d| d.name() != time_dim)
        .map(|d| (d.name(), d.len()))
        .collect();
    let variables = load_variables(&source, time_dim)?;

    let time = variables
        .iter()
        .find(|v| v.name == time_dim)
        .ok_or_else(|| Error::Schema(format!("no '{}' variable in {}", time_dim, input.display())))?;
    let units = match time.attribute("units") {
        Some(AttributeValue::Str(units)) => TimeUnits::parse(units)?,
        _ => return Err(Error::Schema(format!("'{}' has no units attribute", time_dim))),
    };
    let dates = time
        .values
        .to_f64()?
        .iter()
        .map(|&t| units.date_of(t))
        .collect::<Result<Vec<NaiveDate>>>()?;

    let days = day_boundaries(&dates);
    let mut files = Vec::with_capacity(days.len());

    for range in &days {
        let path = config.output_path(dates[range.start], var);
        info!("Creating {} ({} time steps)", path.display(), range.len());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }

        let mut out = netcdf::create(&path)?;
        for (name, value) in &global_attributes {
            out.add_attribute(name, value.clone())?;
        }
        for (name, len) in &dimensions {
            out.add_dimension(name, *len)?;
        }
        out.add_dimension(time_dim, range.len())?;

        for variable in &variables {
            debug!("Writing {}", variable.name);
            let mut shape = variable.shape.clone();
            let values = match variable.time_axis {
                Some(axis) => {
                    shape[axis] = range.len();
                    variable.values.slice_axis(&variable.shape, axis, range)
                }
                None => variable.values.clone(),
            };
            write_values(&mut out, variable, &values, &shape, config.compression)?;
        }

        files.push(path);
    }

    Ok(SplitStats {
        days: days.len(),
        files,
    })
}
