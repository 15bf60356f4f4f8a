use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, warn};
use std::io::{self, Cursor};

use crate::error::{Error, FormatError, Result};
use crate::layout::{FieldSpec, Placement, Primitive, RecordLayout};
use crate::models::{ArrayData, DecodedFields};

/// A field run resolved against the output arrays.
#[derive(Debug, Clone, Copy)]
struct Step {
    field: &'static FieldSpec,
    array: usize,
    offset: usize,
}

/// Decodes the fixed-layout binary data records of a `.T2` file.
pub struct RecordDecoder<'a> {
    layout: &'a RecordLayout,
    record_bytes: usize,
    steps: Vec<Step>,
}

impl<'a> RecordDecoder<'a> {
    /// Create a decoder for records of `record_bytes` bytes.
    ///
    /// Fails if the layout does not describe exactly that many bytes.
    pub fn new(layout: &'a RecordLayout, record_bytes: usize) -> Result<Self> {
        layout.validate().map_err(Error::Schema)?;

        let layout_bytes = layout.record_bytes();
        if layout_bytes != record_bytes {
            return Err(FormatError::RecordSizeMismatch {
                layout: layout_bytes,
                header: record_bytes,
            }
            .into());
        }

        let mut filled = vec![0usize; layout.variables.len()];
        let mut steps = Vec::with_capacity(layout.fields.len());
        for field in layout.fields {
            let array = layout
                .variable_index(field.variable)
                .ok_or_else(|| Error::Schema(format!("unknown variable '{}'", field.variable)))?;
            steps.push(Step {
                field,
                array,
                offset: filled[array],
            });
            filled[array] += field.count;
        }

        Ok(Self {
            layout,
            record_bytes,
            steps,
        })
    }

    pub fn record_bytes(&self) -> usize {
        self.record_bytes
    }

    /// Decode `data_records` records starting at `data_start`.
    pub fn decode(&self, data: &[u8], data_start: usize, data_records: usize) -> Result<DecodedFields> {
        let data_end = data_records
            .checked_mul(self.record_bytes)
            .and_then(|bytes| bytes.checked_add(data_start))
            .ok_or(FormatError::Truncated {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data_end > data.len() {
            return Err(FormatError::Truncated {
                expected: data_end,
                actual: data.len(),
            }
            .into());
        }
        if data_end < data.len() {
            warn!(
                "ignoring {} trailing bytes after the last data record",
                data.len() - data_end
            );
        }

        let mut fields = DecodedFields::allocate(self.layout, data_records);
        let mut cursor = Cursor::new(&data[data_start..data_end]);

        for record in 0..data_records {
            for step in &self.steps {
                let row_len = fields.arrays[step.array].row_len;
                let base = record * row_len + step.offset;
                read_step(&mut cursor, step, &mut fields.arrays[step.array].data, base)
                    .map_err(|_| FormatError::ShortRead {
                        record,
                        field: step.field.name,
                    })?;
            }
        }

        // ShortRead and MisalignedEnd only fire if `steps` disagrees with `record_bytes`
        let position = data_start + cursor.position() as usize;
        if position != data_end {
            return Err(FormatError::MisalignedEnd {
                position,
                expected: data_end,
            }
            .into());
        }

        debug!(
            "decoded {} records of {} bytes from offset {}",
            data_records, self.record_bytes, data_start
        );
        Ok(fields)
    }
}

fn read_value(cursor: &mut Cursor<&[u8]>, primitive: Primitive) -> io::Result<f64> {
    Ok(match primitive {
        Primitive::Int32 => f64::from(cursor.read_i32::<BigEndian>()?),
        Primitive::UInt32 => f64::from(cursor.read_u32::<BigEndian>()?),
        Primitive::Float32 => f64::from(cursor.read_f32::<BigEndian>()?),
        Primitive::Float64 => cursor.read_f64::<BigEndian>()?,
    })
}

/// Destination index of the `k`-th value of a run.
fn target_index(placement: Placement, count: usize, base: usize, k: usize) -> usize {
    match placement {
        Placement::Append => base + k,
        Placement::ChannelMajor { channels } => {
            let positions = count / channels;
            let (channel, position) = (k / positions, k % positions);
            base + position * channels + channel
        }
    }
}

fn read_step(
    cursor: &mut Cursor<&[u8]>,
    step: &Step,
    data: &mut ArrayData,
    base: usize,
) -> io::Result<()> {
    let field = step.field;

    match (data, field.placement) {
        (ArrayData::F32(values), Placement::Append) => {
            cursor.read_f32_into::<BigEndian>(&mut values[base..base + field.count])
        }
        (ArrayData::U32(values), Placement::Append) => {
            cursor.read_u32_into::<BigEndian>(&mut values[base..base + field.count])
        }
        (ArrayData::F32(values), placement) => {
            for k in 0..field.count {
                values[target_index(placement, field.count, base, k)] =
                    cursor.read_f32::<BigEndian>()?;
            }
            Ok(())
        }
        (ArrayData::U32(values), placement) => {
            for k in 0..field.count {
                values[target_index(placement, field.count, base, k)] =
                    cursor.read_u32::<BigEndian>()?;
            }
            Ok(())
        }
        (ArrayData::F64(values), placement) => {
            for k in 0..field.count {
                values[target_index(placement, field.count, base, k)] =
                    read_value(cursor, field.primitive)?;
            }
            Ok(())
        }
    }
}
