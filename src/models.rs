use crate::layout::{RecordLayout, Storage};

/// Row-major values of one decoded variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    U32(Vec<u32>),
}

impl ArrayData {
    pub fn zeros(storage: Storage, len: usize) -> Self {
        match storage {
            Storage::F64 => ArrayData::F64(vec![0.0; len]),
            Storage::F32 => ArrayData::F32(vec![0.0; len]),
            Storage::U32 => ArrayData::U32(vec![0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::F64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn storage(&self) -> Storage {
        match self {
            ArrayData::F64(_) => Storage::F64,
            ArrayData::F32(_) => Storage::F32,
            ArrayData::U32(_) => Storage::U32,
        }
    }
}

/// A `(records, row_len)` array for one output variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    pub name: String,
    pub rows: usize,
    pub row_len: usize,
    pub data: ArrayData,
}

impl FieldArray {
    pub fn zeros(name: &str, storage: Storage, rows: usize, row_len: usize) -> Self {
        Self {
            name: name.to_string(),
            rows,
            row_len,
            data: ArrayData::zeros(storage, rows * row_len),
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            ArrayData::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match &self.data {
            ArrayData::U32(v) => Some(v),
            _ => None,
        }
    }
}

/// All arrays decoded from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFields {
    pub records: usize,
    pub arrays: Vec<FieldArray>,
}

impl DecodedFields {
    /// Zero-filled arrays for every variable of `layout`.
    pub fn allocate(layout: &RecordLayout, records: usize) -> Self {
        let arrays = layout
            .variables
            .iter()
            .map(|v| FieldArray::zeros(v.name, v.storage, records, layout.row_len(v.name)))
            .collect();
        Self { records, arrays }
    }

    pub fn get(&self, name: &str) -> Option<&FieldArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}
