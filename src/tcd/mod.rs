//! Tide constituent database access.
//!
//! libtcd keeps a single process-global "current database", so access goes
//! through a [`Session`]: it borrows the backend mutably for as long as a
//! database is open and always calls close when dropped.
//!
//! Library search order:
//!   1. $LIBTCD_PATH
//!   2. /usr/lib64/libtcd.so
//!   3. libtcd.so.0 / libtcd.so via the dynamic loader path

pub mod ffi;

use crate::station::Station;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Error type for libtcd loading
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Load(String),
    Symbol(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Load(msg) => write!(f, "Failed to load libtcd: {}", msg),
            Error::Symbol(name) => write!(f, "libtcd is missing symbol {}", name),
        }
    }
}

impl std::error::Error for Error {}

/// The native database capability: one open database at a time.
pub trait TideDb {
    /// Open a database file. Returns false on failure.
    fn open(&mut self, path: &Path) -> bool;

    /// Release the current database. Must tolerate a preceding failed open.
    fn close(&mut self);

    /// Nearest station to (lat, lon) in the open database, or None when the
    /// lookup returns a negative index.
    fn nearest(&mut self, lat: f64, lon: f64) -> Option<Station>;
}

/// Scoped open/close of a single database file.
pub struct Session<'a, D: TideDb> {
    db: &'a mut D,
    opened: bool,
}

impl<'a, D: TideDb> Session<'a, D> {
    pub fn open(db: &'a mut D, path: &Path) -> Self {
        let opened = db.open(path);
        Self { db, opened }
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn nearest(&mut self, lat: f64, lon: f64) -> Option<Station> {
        if !self.opened {
            return None;
        }
        self.db.nearest(lat, lon)
    }
}

impl<D: TideDb> Drop for Session<'_, D> {
    fn drop(&mut self) {
        // Unconditional: libtcd's close is a no-op without an open file.
        self.db.close();
    }
}

enum Backend {
    Unloaded,
    Loaded(ffi::Libtcd),
    Unavailable,
}

/// libtcd backend, loaded on the first open.
pub struct Tcd {
    candidates: Vec<PathBuf>,
    backend: Backend,
}

impl Tcd {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            backend: Backend::Unloaded,
        }
    }

    fn load(&self) -> Result<ffi::Libtcd, Error> {
        let mut last_err = Error::Load("no library candidates".to_string());
        for candidate in &self.candidates {
            match ffi::Libtcd::load(candidate) {
                Ok(lib) => return Ok(lib),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn lib(&mut self) -> Option<&mut ffi::Libtcd> {
        if let Backend::Unloaded = self.backend {
            self.backend = match self.load() {
                Ok(lib) => Backend::Loaded(lib),
                Err(e) => {
                    eprintln!("[tcd] {}", e);
                    Backend::Unavailable
                }
            };
        }
        match &mut self.backend {
            Backend::Loaded(lib) => Some(lib),
            _ => None,
        }
    }
}

impl TideDb for Tcd {
    fn open(&mut self, path: &Path) -> bool {
        match self.lib() {
            Some(lib) => lib.open(path),
            None => false,
        }
    }

    fn close(&mut self) {
        if let Backend::Loaded(lib) = &mut self.backend {
            lib.close();
        }
    }

    fn nearest(&mut self, lat: f64, lon: f64) -> Option<Station> {
        match &mut self.backend {
            Backend::Loaded(lib) => lib.nearest(lat, lon).map(|(index, header)| {
                trace!(
                    index,
                    record_size = header.record_size,
                    record_type = header.record_type,
                    "nearest partial record"
                );
                Station::from_header(&header)
            }),
            _ => None,
        }
    }
}
