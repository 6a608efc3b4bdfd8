//! nearest-tide CLI
//!
//! Usage:
//!   nearest-tide LAT LON
//!
//! Prints the result array on stdout. Usage and environment errors print
//! {"error": ..} to stderr and exit 1. Unreadable databases are skipped.
//! Set RUST_LOG=nearest_tide=debug for per-station diagnostics.

use std::io::{self, Write};
use std::process;

use nearest_tide::config::Paths;
use nearest_tide::locate::{self, Coordinate};
use nearest_tide::station::StationRecord;
use nearest_tide::tcd::Tcd;
use nearest_tide::Error;
use tracing_subscriber::EnvFilter;

fn parse_coord(arg: &str) -> Result<f64, Error> {
    arg.trim().parse().map_err(|_| Error::NotNumeric)
}

/// Positional arguments, program name excluded.
fn parse_args(args: &[String]) -> Result<Coordinate, Error> {
    if args.len() != 2 {
        return Err(Error::Usage);
    }
    Ok(Coordinate {
        lat: parse_coord(&args[0])?,
        lon: parse_coord(&args[1])?,
    })
}

fn emit(results: &[StationRecord]) -> Result<(), Error> {
    let json = serde_json::to_string(results).map_err(|e| Error::Output(e.to_string()))?;

    let mut out = io::stdout().lock();
    writeln!(out, "{}", json)
        .and_then(|_| out.flush())
        .map_err(|e| Error::Output(e.to_string()))
}

fn run(args: &[String]) -> Result<(), Error> {
    let query = parse_args(args)?;
    let paths = Paths::init()?;

    let mut db = Tcd::new(paths.libtcd);
    let results = locate::nearest_stations(&mut db, query, &paths.databases);

    emit(&results)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    if let Err(e) = run(&args) {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        process::exit(1);
    }
}
