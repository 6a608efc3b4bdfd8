//! Nearest-station search across several harmonic databases.
//!
//! Each file is opened, asked for its single nearest station and closed
//! before the next one is touched. Results are merged, stable-sorted by
//! rounded distance and cut to MAX_RESULTS.

use std::path::PathBuf;
use tracing::debug;

use crate::station::StationRecord;
use crate::tcd::{Session, TideDb};
use crate::MAX_RESULTS;

/// Query point in degrees. Not range-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

pub fn nearest_stations<D: TideDb>(
    db: &mut D,
    query: Coordinate,
    databases: &[PathBuf],
) -> Vec<StationRecord> {
    let mut results = Vec::new();

    for path in databases {
        let mut session = Session::open(db, path);
        if !session.is_open() {
            eprintln!("Failed to open database");
            continue;
        }

        if let Some(station) = session.nearest(query.lat, query.lon) {
            debug!(
                file = %path.display(),
                record = station.record_number,
                reference = station.reference_station,
                tzfile = station.tzfile,
                name = %station.name,
                "nearest station"
            );
            results.push(StationRecord::new(&station, query.lat, query.lon, path));
        }
    }

    rank(&mut results);
    results
}

/// Stable ascending sort by distance, then truncate.
pub fn rank(results: &mut Vec<StationRecord>) {
    results.sort_by(|a, b| a.dist.total_cmp(&b.dist));
    results.truncate(MAX_RESULTS);
}
