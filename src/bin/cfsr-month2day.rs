//! Split monthly CFSR reanalysis NetCDF files into per-day files.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use ssmt2_netcdf::splitter::{split_by_day, SplitConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Split monthly CFSR NetCDF files into one file per day",
    long_about = "Unpacks each compressed (.gz or .bz2) monthly file and writes one NetCDF-4 file \
                  per calendar day under OUT_ROOT/<dir-template>/<file-template>.\n\n\
                  Dimensions and attributes are copied verbatim; only the time axis is cut."
)]
struct Args {
    /// Compressed monthly NetCDF files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Variable name used for the output file names
    #[arg(short, long)]
    variable: String,

    /// Root output directory
    #[arg(short, long, value_name = "OUT_ROOT")]
    out_root: PathBuf,

    /// Per-day directory below OUT_ROOT
    #[arg(long, default_value = "{year}/{month}/{day}")]
    dir_template: String,

    /// Output file name
    #[arg(long, default_value = "{var}.nc")]
    file_template: String,

    /// Name of the time dimension/variable
    #[arg(long, default_value = "time")]
    time_variable: String,

    /// Deflate level for all variables
    #[arg(long, default_value = "4")]
    compression: i32,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = SplitConfig {
        output_root: args.out_root,
        directory_template: args.dir_template,
        file_template: args.file_template,
        time_variable: args.time_variable,
        compression: args.compression,
    };

    let total_start = Instant::now();
    for (idx, input) in args.inputs.iter().enumerate() {
        info!("[{}/{}] {}", idx + 1, args.inputs.len(), input.display());
        let stats = split_by_day(input, &args.variable, &config)
            .with_context(|| format!("splitting {}", input.display()))?;
        info!("Wrote {} daily files", stats.days);
    }
    info!("🏁 All files processed in {:.2?}", total_start.elapsed());

    Ok(())
}
