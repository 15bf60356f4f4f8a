//! Test utilities for building `.T2` files
#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};

/// Builder for creating `.T2` test files
pub struct T2Builder {
    lines: Vec<String>,
    header_records: usize,
    record_bytes: usize,
    records: Vec<Vec<u8>>,
}

impl T2Builder {
    /// Create a builder whose header declares `header_records` and `record_bytes`
    pub fn new(header_records: usize, record_bytes: usize) -> Self {
        Self {
            lines: vec![
                format!("number of header records: {}", header_records),
                format!("record bytes: {}", record_bytes),
            ],
            header_records,
            record_bytes,
            records: Vec::new(),
        }
    }

    /// Builder for SSM/T-2 files (1688-byte records, 4 header records)
    pub fn ssmt2() -> Self {
        Self::new(4, 1688)
    }

    /// Add an arbitrary header line
    pub fn line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Declare the number of data records
    pub fn data_records(self, count: usize) -> Self {
        self.line(&format!("number of data records: {}", count))
    }

    /// Add one encoded data record
    pub fn record(mut self, bytes: Vec<u8>) -> Self {
        assert_eq!(bytes.len(), self.record_bytes, "record size");
        self.records.push(bytes);
        self
    }

    /// Header text followed by space padding up to the first data record
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut data = self.lines.join("\n").into_bytes();
        data.push(b'\n');

        let header_len = self.header_records * self.record_bytes;
        assert!(
            data.len() + 3 <= header_len,
            "header text does not fit into {} header bytes",
            header_len
        );
        data.resize(header_len, b' ');
        data
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.header_bytes();
        for record in &self.records {
            data.extend_from_slice(record);
        }
        data
    }
}

/// Field values of one SSM/T-2 data record, in file order
#[derive(Debug, Clone)]
pub struct Ssmt2Record {
    pub scan_date: [i32; 2],
    pub scan_seconds: f64,
    pub satellite: [f32; 4],
    pub ephemeris_date: [i32; 2],
    pub ephemeris_seconds: f64,
    pub lat: Vec<f32>,
    pub lon: Vec<f32>,
    /// `[channel][scan position]`
    pub tb: Vec<Vec<f32>>,
    /// `[channel][scan position]`
    pub quality: Vec<Vec<u32>>,
    pub gain_control: Vec<u32>,
    pub gain: Vec<f32>,
    pub offset: Vec<f32>,
    pub thermal_reference: u32,
    pub housekeeping: Vec<u32>,
    /// `[channel][calibration]`
    pub warm_counts: Vec<Vec<u32>>,
    /// `[channel][calibration]`
    pub cold_counts: Vec<Vec<u32>>,
}

impl Ssmt2Record {
    /// Deterministic, distinct values derived from `seed`
    pub fn sample(seed: u32) -> Self {
        let s = seed as f32;
        Self {
            scan_date: [1999, 100 + seed as i32],
            scan_seconds: 3600.25 + seed as f64,
            satellite: [-45.5 + s, 120.25, 850.0, 12.5 - s],
            ephemeris_date: [1999, 101 + seed as i32],
            ephemeris_seconds: 7200.5 + seed as f64,
            lat: (0..28).map(|p| -60.0 + p as f32 * 0.5 + s).collect(),
            lon: (0..28).map(|p| 10.0 + p as f32 * 0.25 - s).collect(),
            tb: (0..5)
                .map(|c| (0..28).map(|p| 200.0 + c as f32 * 10.0 + p as f32 * 0.1 + s).collect())
                .collect(),
            quality: (0..5)
                .map(|c| (0..28).map(|p| seed * 1000 + c * 100 + p).collect())
                .collect(),
            gain_control: (0..5).map(|c| 40 + c + seed).collect(),
            gain: (0..5).map(|c| 0.01 * (c + 1) as f32).collect(),
            offset: (0..5).map(|c| -1.5 * c as f32).collect(),
            thermal_reference: 17_000 + seed,
            housekeeping: (0..18).map(|k| 500 + k + seed).collect(),
            warm_counts: (0..5).map(|c| (0..4).map(|k| 30_000 + c * 10 + k + seed).collect()).collect(),
            cold_counts: (0..5).map(|c| (0..4).map(|k| 10_000 + c * 10 + k + seed).collect()).collect(),
        }
    }

    /// The ten ancillary values as stored in `ancil_data`
    pub fn ancillary(&self) -> Vec<f64> {
        let mut row = vec![self.scan_date[0] as f64, self.scan_date[1] as f64, self.scan_seconds];
        row.extend(self.satellite.iter().map(|&v| v as f64));
        row.extend([
            self.ephemeris_date[0] as f64,
            self.ephemeris_date[1] as f64,
            self.ephemeris_seconds,
        ]);
        row
    }

    /// Encode as a 1688-byte big-endian record
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1688);
        for &v in &self.scan_date {
            out.write_i32::<BigEndian>(v).unwrap();
        }
        out.write_f64::<BigEndian>(self.scan_seconds).unwrap();
        for &v in &self.satellite {
            out.write_f32::<BigEndian>(v).unwrap();
        }
        for &v in &self.ephemeris_date {
            out.write_i32::<BigEndian>(v).unwrap();
        }
        out.write_f64::<BigEndian>(self.ephemeris_seconds).unwrap();
        for &v in self.lat.iter().chain(&self.lon) {
            out.write_f32::<BigEndian>(v).unwrap();
        }
        for &v in self.tb.iter().flatten() {
            out.write_f32::<BigEndian>(v).unwrap();
        }
        for &v in self.quality.iter().flatten() {
            out.write_u32::<BigEndian>(v).unwrap();
        }
        for &v in &self.gain_control {
            out.write_u32::<BigEndian>(v).unwrap();
        }
        for &v in self.gain.iter().chain(&self.offset) {
            out.write_f32::<BigEndian>(v).unwrap();
        }
        out.write_u32::<BigEndian>(self.thermal_reference).unwrap();
        for &v in &self.housekeeping {
            out.write_u32::<BigEndian>(v).unwrap();
        }
        for &v in self.warm_counts.iter().flatten().chain(self.cold_counts.iter().flatten()) {
            out.write_u32::<BigEndian>(v).unwrap();
        }
        assert_eq!(out.len(), 1688);
        out
    }
}

/// An SSM/T-2 file with `count` sample records
pub fn ssmt2_file(count: u32) -> (Vec<u8>, Vec<Ssmt2Record>) {
    let records: Vec<Ssmt2Record> = (0..count).map(Ssmt2Record::sample).collect();
    let mut builder = T2Builder::ssmt2()
        .line("SSM/T-2 satellite: F14")
        .line("start time: 1999-04-10 01:00:00")
        .data_records(count as usize);
    for record in &records {
        builder = builder.record(record.encode());
    }
    (builder.build(), records)
}

/// Per-thread capture of `log` records emitted by the library
pub mod logs {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;
    static INIT: Once = Once::new();

    /// Run `f` and return its result with every record it logged on this thread
    pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
        INIT.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(LevelFilter::Trace);
        });
        RECORDS.with(|r| r.borrow_mut().clear());
        let result = f();
        let records = RECORDS.with(|r| r.borrow_mut().drain(..).collect());
        (result, records)
    }
}
