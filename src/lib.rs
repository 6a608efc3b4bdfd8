//! nearest-tide - nearest tide stations from libtcd harmonic databases
//!
//! Database files come from $HFILE_PATH (colon-separated, `~` allowed).
//! Each file is asked for its nearest station; the closest MAX_RESULTS
//! across all files are returned, ascending by distance:
//!   [{"name": .., "lat": .., "lon": .., "dist": .., "file": ..}]
//!
//! Two front ends share this library: the `nearest-tide` CLI and, with the
//! `server` feature, the `nearest-tide-server` HTTP service.

pub mod config;
pub mod locate;
#[cfg(feature = "server")]
pub mod server;
pub mod station;
pub mod tcd;

use std::fmt;

/// Database list variable
pub const HFILE_ENV: &str = "HFILE_PATH";

/// Optional explicit libtcd location
pub const LIBTCD_ENV: &str = "LIBTCD_PATH";

/// Fallback libtcd locations, tried in order
pub const LIBTCD_DEFAULTS: &[&str] = &["/usr/lib64/libtcd.so", "libtcd.so.0", "libtcd.so"];

/// Result list bound
pub const MAX_RESULTS: usize = 10;

/// Spherical Earth radius for haversine (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fatal errors. Display text is the `"error"` string on stderr.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Usage,
    NotNumeric,
    PathNotSet,
    Output(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage => write!(f, "need lat lon"),
            Error::NotNumeric => write!(f, "lat lon must be numbers"),
            Error::PathNotSet => write!(f, "{} not set", HFILE_ENV),
            Error::Output(msg) => write!(f, "failed to write results: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
