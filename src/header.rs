//! Text header of a `.T2` file and the record geometry derived from it.
//!
//! The header is a block of `key: value` lines padded with spaces up to the
//! first data record. Its end is found by scanning for three consecutive
//! spaces following some header text.

use log::warn;

use crate::error::FormatError;

const HEADER_RECORDS_KEY: &str = "number of header records";
const RECORD_BYTES_KEY: &str = "record bytes";
const DATA_RECORDS_KEY: &str = "number of data records";
const TOTAL_RECORDS_KEY: &str = "number of records";

/// Bytes dropped between the sentinel's first space and the header end.
pub const SENTINEL_ADJUSTMENT: usize = 2;

/// Locate the end of the header text.
///
/// Returns `i - 2` for the first `i` where `data[i-1..=i+1]` are all spaces
/// and at least one non-whitespace byte precedes them.
pub fn find_header_end(data: &[u8]) -> Result<usize, FormatError> {
    let mut saw_text = false;

    for i in 1..data.len().saturating_sub(1) {
        if !data[i - 1].is_ascii_whitespace() {
            saw_text = true;
            continue;
        }
        if saw_text && data[i - 1] == b' ' && data[i] == b' ' && data[i + 1] == b' ' {
            // saw_text guarantees i - 1 >= 1
            return Ok(i - SENTINEL_ADJUSTMENT);
        }
    }

    Err(FormatError::SentinelNotFound)
}

/// A `key: value` pair taken from one header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    /// Attribute name for NetCDF output: spaces and slashes become underscores.
    pub fn attribute_name(&self) -> String {
        self.key.replace([' ', '/'], "_")
    }
}

/// Classification of a single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// Free text without a key.
    Text(String),
    /// A well-formed `key: value` pair.
    Entry(HeaderEntry),
    /// A line with more than one plausible key/value split.
    Ambiguous(String),
}

fn trim_field(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == ':' || c == '\t' || c == '\r')
}

/// Parse one header line.
///
/// The line is split at its first colon. If the value still contains a
/// `": "` separator the split point is not unique and the line is reported
/// as ambiguous. Colons inside values (`12:30:00`) are fine.
pub fn parse_line(line: &str) -> HeaderLine {
    let Some((raw_key, raw_value)) = line.split_once(':') else {
        return HeaderLine::Text(line.to_string());
    };

    let key = trim_field(raw_key);
    if key.is_empty() || raw_value.contains(": ") {
        return HeaderLine::Ambiguous(line.to_string());
    }

    HeaderLine::Entry(HeaderEntry {
        key: key.to_string(),
        value: trim_field(raw_value).to_string(),
    })
}

/// Where the data record count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCountSource {
    /// Read from `number of data records`.
    Direct,
    /// Derived as `number of records - number of header records`.
    Derived { total_records: usize },
}

/// Record counts and sizes declared by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordGeometry {
    pub header_records: usize,
    pub data_records: usize,
    pub record_bytes: usize,
    pub count_source: RecordCountSource,
}

impl RecordGeometry {
    /// Build a geometry whose byte offsets all fit in `usize`.
    pub fn checked(
        header_records: usize,
        data_records: usize,
        record_bytes: usize,
        count_source: RecordCountSource,
    ) -> Result<Self, FormatError> {
        let overflow = |field: &'static str, count: usize| FormatError::InvalidField {
            field,
            value: count.to_string(),
        };

        let data_start = header_records
            .checked_mul(record_bytes)
            .ok_or_else(|| overflow(HEADER_RECORDS_KEY, header_records))?;
        data_records
            .checked_mul(record_bytes)
            .and_then(|bytes| bytes.checked_add(data_start))
            .ok_or_else(|| overflow(DATA_RECORDS_KEY, data_records))?;
        header_records
            .checked_add(data_records)
            .ok_or_else(|| overflow(DATA_RECORDS_KEY, data_records))?;

        Ok(Self {
            header_records,
            data_records,
            record_bytes,
            count_source,
        })
    }

    pub fn total_records(&self) -> usize {
        self.header_records + self.data_records
    }

    /// Byte offset of the first data record.
    pub fn data_start(&self) -> usize {
        self.header_records * self.record_bytes
    }

    /// Size of the data region in bytes.
    pub fn data_bytes(&self) -> usize {
        self.data_records * self.record_bytes
    }

    /// Byte offset one past the last data record.
    pub fn data_end(&self) -> usize {
        self.data_start() + self.data_bytes()
    }
}

/// Parsed header of a `.T2` file.
#[derive(Debug, Clone)]
pub struct Header {
    lines: Vec<HeaderLine>,
}

impl Header {
    /// Parse the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let end = find_header_end(data)?;
        let text = String::from_utf8_lossy(&data[..end]);

        let lines: Vec<HeaderLine> = text.split('\n').map(parse_line).collect();
        let has_content = lines.iter().any(|line| match line {
            HeaderLine::Text(t) => !t.trim().is_empty(),
            _ => true,
        });
        if !has_content {
            return Err(FormatError::EmptyHeader);
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[HeaderLine] {
        &self.lines
    }

    pub fn entries(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.lines.iter().filter_map(|line| match line {
            HeaderLine::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// Value of the first entry whose key contains `marker`.
    ///
    /// An ambiguous line mentioning the marker is an error rather than a miss.
    pub fn find(&self, marker: &'static str) -> Result<Option<&str>, FormatError> {
        for line in &self.lines {
            match line {
                HeaderLine::Entry(entry) if entry.key.contains(marker) => {
                    return Ok(Some(entry.value.as_str()));
                }
                HeaderLine::Ambiguous(raw) if raw.contains(marker) => {
                    return Err(FormatError::AmbiguousLine(raw.clone()));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn require_count(&self, marker: &'static str) -> Result<usize, FormatError> {
        let value = self.find(marker)?.ok_or(FormatError::MissingField(marker))?;
        parse_count(marker, value)
    }

    /// Derive record counts and sizes.
    ///
    /// Falls back to `number of records - number of header records` when the
    /// data record count is absent, logging a warning.
    pub fn geometry(&self) -> Result<RecordGeometry, FormatError> {
        let header_records = self.require_count(HEADER_RECORDS_KEY)?;
        let record_bytes = self.require_count(RECORD_BYTES_KEY)?;

        let (data_records, count_source) = match self.find(DATA_RECORDS_KEY)? {
            Some(value) => (parse_count(DATA_RECORDS_KEY, value)?, RecordCountSource::Direct),
            None => {
                let value = self
                    .find(TOTAL_RECORDS_KEY)?
                    .ok_or(FormatError::MissingField(DATA_RECORDS_KEY))?;
                let total_records = parse_count(TOTAL_RECORDS_KEY, value)?;
                let data_records = total_records.checked_sub(header_records).ok_or_else(|| {
                    FormatError::InvalidField {
                        field: TOTAL_RECORDS_KEY,
                        value: value.to_string(),
                    }
                })?;

                warn!(
                    "didn't find number of data records directly, using number of records - \
                     number of header records ({} - {}) instead",
                    total_records, header_records
                );
                (data_records, RecordCountSource::Derived { total_records })
            }
        };

        RecordGeometry::checked(header_records, data_records, record_bytes, count_source)
    }

    /// Global attributes for the output file, in header order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attributes = Vec::new();
        for line in &self.lines {
            match line {
                HeaderLine::Entry(entry) => {
                    attributes.push((entry.attribute_name(), entry.value.clone()));
                }
                HeaderLine::Ambiguous(raw) => {
                    warn!("skipping ambiguous header line as attribute: {:?}", raw);
                }
                HeaderLine::Text(_) => {}
            }
        }
        attributes
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<usize, FormatError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| FormatError::InvalidField {
            field,
            value: value.to_string(),
        })
}
