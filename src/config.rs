//! Environment and path resolution.
//!
//! HFILE_PATH lists harmonic database files separated by ':'. Each entry is
//! trimmed and `~` / `~user` expanded; anything that is not an existing
//! regular file is dropped without comment. Entries are handled as raw
//! bytes, so non-UTF-8 paths survive.

use nix::unistd::{getuid, User};
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;

use crate::{Error, HFILE_ENV, LIBTCD_DEFAULTS, LIBTCD_ENV};

/// Resolved filesystem paths
pub struct Paths {
    pub databases: Vec<PathBuf>,
    pub libtcd: Vec<PathBuf>,
}

impl Paths {
    pub fn init() -> Result<Self, Error> {
        Ok(Self {
            databases: databases(std::env::var_os(HFILE_ENV).as_deref())?,
            libtcd: library_candidates(std::env::var_os(LIBTCD_ENV).map(PathBuf::from)),
        })
    }
}

/// Existing database files from a HFILE_PATH value; unset or empty is an error.
pub fn databases(raw: Option<&OsStr>) -> Result<Vec<PathBuf>, Error> {
    match raw {
        Some(raw) if !raw.is_empty() => Ok(database_paths(raw)),
        _ => Err(Error::PathNotSet),
    }
}

/// Split a HFILE_PATH value into existing database files, in list order.
pub fn database_paths(raw: &OsStr) -> Vec<PathBuf> {
    raw.as_bytes()
        .split(|&b| b == b':')
        .map(|entry| expand_home(entry.trim_ascii()))
        .filter(|path| path.is_file())
        .collect()
}

/// libtcd locations to try, an explicit override first.
pub fn library_candidates(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    explicit
        .filter(|p| !p.as_os_str().is_empty())
        .into_iter()
        .chain(LIBTCD_DEFAULTS.iter().map(PathBuf::from))
        .collect()
}

pub fn expand_home(path: &[u8]) -> PathBuf {
    expand_with(path, home_dir)
}

/// Home directory for `user`, or for the current user when empty.
/// $HOME wins for the current user; otherwise the passwd entry.
fn home_dir(user: &str) -> Option<Vec<u8>> {
    let entry = if user.is_empty() {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(home.into_vec());
        }
        User::from_uid(getuid())
    } else {
        User::from_name(user)
    };

    entry
        .ok()
        .flatten()
        .map(|u| u.dir.into_os_string().into_vec())
}

fn expand_with(path: &[u8], lookup: impl Fn(&str) -> Option<Vec<u8>>) -> PathBuf {
    let unchanged = || PathBuf::from(OsStr::from_bytes(path));

    let rest = match path.strip_prefix(b"~") {
        Some(rest) => rest,
        None => return unchanged(),
    };

    let (user, tail) = match rest.iter().position(|&b| b == b'/') {
        Some(i) => rest.split_at(i),
        None => (rest, &[][..]),
    };

    // Unknown (or non-UTF-8) user: leave the path untouched
    let home = match std::str::from_utf8(user).ok().and_then(&lookup) {
        Some(home) => home,
        None => return unchanged(),
    };

    let mut expanded = home;
    while expanded.last() == Some(&b'/') {
        expanded.pop();
    }
    expanded.extend_from_slice(tail);
    if expanded.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(OsString::from_vec(expanded))
    }
}
