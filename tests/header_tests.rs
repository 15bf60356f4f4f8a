mod common;

use common::{logs, T2Builder};
use log::Level;
use ssmt2_netcdf::header::{Header, HeaderLine, RecordCountSource};
use ssmt2_netcdf::{Error, FormatError, T2Reader};

// ============================================================================
// GEOMETRY TESTS
// ============================================================================

#[test]
fn test_geometry_direct_counts() {
    let data = T2Builder::new(2, 64).data_records(3).build();
    let geometry = Header::parse(&data).unwrap().geometry().unwrap();

    assert_eq!(geometry.header_records, 2);
    assert_eq!(geometry.data_records, 3);
    assert_eq!(geometry.record_bytes, 64);
    assert_eq!(geometry.count_source, RecordCountSource::Direct);
    assert_eq!(geometry.total_records(), geometry.header_records + geometry.data_records);
    assert_eq!(geometry.data_start(), 128);
    assert_eq!(geometry.data_end(), 128 + 3 * 64);
}

#[test]
fn test_geometry_scenario_offsets() {
    // header records 2, record bytes 16, 3 data records
    let header = Header::parse(
        b"number of header records: 2\nrecord bytes: 16\nnumber of data records: 3\n     ",
    )
    .unwrap();
    let geometry = header.geometry().unwrap();

    assert_eq!(geometry.data_start(), 32);
    assert_eq!(geometry.data_bytes(), 48);
    assert_eq!(geometry.total_records(), 5);
}

#[test]
fn test_fallback_to_number_of_records() {
    let data = T2Builder::new(4, 64).line("number of records: 100").build();
    let header = Header::parse(&data).unwrap();
    let (geometry, records) = logs::capture(|| header.geometry().unwrap());

    let warnings: Vec<&String> = records
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("(100 - 4)"), "{}", warnings[0]);

    assert_eq!(geometry.data_records, 96);
    assert_eq!(geometry.total_records(), 100);
    assert_eq!(
        geometry.count_source,
        RecordCountSource::Derived { total_records: 100 }
    );
}

#[test]
fn test_direct_count_does_not_warn() {
    let data = T2Builder::new(4, 64).data_records(96).build();
    let header = Header::parse(&data).unwrap();
    let (_, records) = logs::capture(|| header.geometry().unwrap());
    assert!(records.iter().all(|(level, _)| *level != Level::Warn));
}

#[test]
fn test_fallback_underflow() {
    let data = T2Builder::new(4, 64).line("number of records: 3").build();
    let err = Header::parse(&data).unwrap().geometry().unwrap_err();
    assert!(matches!(err, FormatError::InvalidField { field: "number of records", .. }));
}

#[test]
fn test_oversized_header_records() {
    let data = format!(
        "number of header records: {}\nrecord bytes: 1688\nnumber of data records: 1\n   ",
        usize::MAX / 2
    );
    let err = Header::parse(data.as_bytes()).unwrap().geometry().unwrap_err();
    assert!(matches!(
        err,
        FormatError::InvalidField { field: "number of header records", .. }
    ));

    match T2Reader::from_bytes(data.into_bytes()) {
        Err(Error::Format(FormatError::InvalidField { .. })) => {}
        other => panic!("expected InvalidField, got {:?}", other.err()),
    }
}

#[test]
fn test_oversized_data_records() {
    let data = format!(
        "number of header records: 4\nrecord bytes: 1688\nnumber of data records: {}\n   ",
        usize::MAX / 1000
    );
    let err = Header::parse(data.as_bytes()).unwrap().geometry().unwrap_err();
    assert!(matches!(
        err,
        FormatError::InvalidField { field: "number of data records", .. }
    ));
}

#[test]
fn test_missing_record_counts() {
    let data = T2Builder::new(4, 64).build();
    let err = Header::parse(&data).unwrap().geometry().unwrap_err();
    assert_eq!(err, FormatError::MissingField("number of data records"));
}

#[test]
fn test_missing_counts_fail_before_decoding() {
    // no data bytes at all: only the header check can fail here
    let data = T2Builder::new(4, 64).build();
    match T2Reader::from_bytes(data) {
        Err(Error::Format(FormatError::MissingField(_))) => {}
        other => panic!("expected MissingField, got {:?}", other.err()),
    }
}

#[test]
fn test_missing_header_records() {
    let header = Header::parse(b"record bytes: 16\nnumber of data records: 3\n   ").unwrap();
    assert_eq!(
        header.geometry().unwrap_err(),
        FormatError::MissingField("number of header records")
    );
}

#[test]
fn test_unparseable_count() {
    let data = T2Builder::new(4, 64).line("number of data records: many").build();
    let err = Header::parse(&data).unwrap().geometry().unwrap_err();
    assert_eq!(
        err,
        FormatError::InvalidField {
            field: "number of data records",
            value: "many".to_string(),
        }
    );
}

#[test]
fn test_ambiguous_required_line() {
    let data = T2Builder::new(4, 64).line("number of data records: 3: 4").build();
    let err = Header::parse(&data).unwrap().geometry().unwrap_err();
    assert!(matches!(err, FormatError::AmbiguousLine(_)));
}

// ============================================================================
// SENTINEL TESTS
// ============================================================================

#[test]
fn test_no_sentinel() {
    let err = Header::parse(b"number of header records: 2\nrecord bytes: 16").unwrap_err();
    assert_eq!(err, FormatError::SentinelNotFound);
}

#[test]
fn test_empty_header() {
    assert_eq!(Header::parse(b"x   ").unwrap_err(), FormatError::EmptyHeader);
}

#[test]
fn test_header_lines() {
    let data = T2Builder::new(2, 64)
        .line("SSM/T-2 satellite: F14")
        .line("free text")
        .build();
    let header = Header::parse(&data).unwrap();

    assert_eq!(header.entries().count(), 3);
    assert!(header
        .lines()
        .iter()
        .any(|l| *l == HeaderLine::Text("free text".to_string())));
}

// ============================================================================
// ATTRIBUTE TESTS
// ============================================================================

#[test]
fn test_attributes_are_sanitized() {
    let data = T2Builder::new(2, 64)
        .data_records(0)
        .line("SSM/T-2 satellite: F14 ")
        .line("start time: 1999-04-10 01:00:00")
        .build();
    let attributes = Header::parse(&data).unwrap().attributes();

    assert_eq!(
        attributes,
        vec![
            ("number_of_header_records".to_string(), "2".to_string()),
            ("record_bytes".to_string(), "64".to_string()),
            ("number_of_data_records".to_string(), "0".to_string()),
            ("SSM_T-2_satellite".to_string(), "F14".to_string()),
            ("start_time".to_string(), "1999-04-10 01:00:00".to_string()),
        ]
    );
}

#[test]
fn test_ambiguous_lines_are_not_attributes() {
    let data = T2Builder::new(2, 64).line("12:30 pass: 7").build();
    let attributes = Header::parse(&data).unwrap().attributes();
    assert_eq!(attributes.len(), 2);
}
