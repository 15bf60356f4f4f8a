//! Command-line interface for the SSM/T-2 converter.
//!
//! Converts one `.T2` file into one NetCDF-4 file.

use anyhow::Result;
use clap::Parser;
use log::{info, LevelFilter};
use ssmt2_netcdf::{is_t2_file_name, Error, NetcdfWriter, T2Reader};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert SSM/T-2 .T2 files to NetCDF",
    long_about = "Parses the text header and big-endian data records of an SSM/T-2 .T2 file \
                  and writes every field into a single NetCDF-4 file.\n\n\
                  Header key/value pairs are copied into global attributes."
)]
struct Args {
    /// Input .T2 file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output NetCDF file (overwritten if present)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Deflate level (1-9) for all variables; uncompressed if omitted
    #[arg(long, value_name = "LEVEL")]
    compression: Option<i32>,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let input_name = args.input.to_string_lossy();
    if !is_t2_file_name(&input_name) {
        return Err(Error::InvalidArgument(format!("input data file '{}' is not *.T2", input_name)).into());
    }

    info!("📄 Processing: {}", input_name);
    let start_time = Instant::now();

    let reader = T2Reader::from_file(&args.input)?;
    let geometry = reader.geometry();
    info!(
        "   ├─ {} header records, {} data records, {} bytes per record",
        geometry.header_records, geometry.data_records, geometry.record_bytes
    );

    let t0 = Instant::now();
    let (fields, header) = reader.read_all_with_header()?;
    info!("   ├─ Decoded {} records in {:.2?}", fields.records, t0.elapsed());

    let t1 = Instant::now();
    let mut writer = NetcdfWriter::new(&args.output);
    if let Some(level) = args.compression {
        writer = writer.compression(level);
    }
    let stats = writer.write_with_stats(&header, &fields)?;

    info!("   ├─ Wrote {} in {:.2?}", args.output.display(), t1.elapsed());
    info!("   ├─ {}", stats.summary());
    info!("   └─ ✓ Total time: {:.2?}", start_time.elapsed());

    Ok(())
}
