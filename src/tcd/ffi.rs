//! Raw libtcd binding.
//!
//! The shared object is dlopen'd at runtime -- no link-time dependency on
//! libtcd. Only the three entry points needed for a nearest-station lookup
//! are resolved.

use super::Error;
use libc::{c_char, c_int, c_void};
use std::ffi::{CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// ONELINER_LENGTH in tcd.h
pub const NAME_LEN: usize = 90;

/// TIDE_STATION_HEADER
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TideStationHeader {
    pub record_number: i32,
    pub record_size: u32,
    pub record_type: u8,
    pub latitude: f64,
    pub longitude: f64,
    pub reference_station: i32,
    pub tzfile: i16,
    pub name: [c_char; NAME_LEN],
}

impl Default for TideStationHeader {
    fn default() -> Self {
        Self {
            record_number: 0,
            record_size: 0,
            record_type: 0,
            latitude: 0.0,
            longitude: 0.0,
            reference_station: -1,
            tzfile: 0,
            name: [0; NAME_LEN],
        }
    }
}

impl TideStationHeader {
    /// Name bytes up to the first NUL (or the whole buffer if unterminated).
    pub fn name_bytes(&self) -> Vec<u8> {
        self.name
            .iter()
            .map(|&c| c as u8)
            .take_while(|&b| b != 0)
            .collect()
    }
}

// NV_BOOL open_tide_db (const NV_CHAR *file);
type OpenFn = unsafe extern "C" fn(*const c_char) -> u8;
// void close_tide_db ();
type CloseFn = unsafe extern "C" fn();
// NV_INT32 get_nearest_partial_tide_record (NV_FLOAT64 lat, NV_FLOAT64 lon,
//                                           TIDE_STATION_HEADER *rec);
type NearestFn = unsafe extern "C" fn(f64, f64, *mut TideStationHeader) -> i32;

/// A loaded libtcd with its resolved entry points.
pub struct Libtcd {
    handle: *mut c_void,
    open_tide_db: OpenFn,
    close_tide_db: CloseFn,
    get_nearest_partial_tide_record: NearestFn,
}

fn last_dl_error() -> String {
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return "unknown dynamic loader error".to_string();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

fn resolve(handle: *mut c_void, name: &CStr) -> Result<*mut c_void, Error> {
    let sym = unsafe { libc::dlsym(handle, name.as_ptr()) };
    if sym.is_null() {
        Err(Error::Symbol(name.to_string_lossy().into_owned()))
    } else {
        Ok(sym)
    }
}

impl Libtcd {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::Load(format!("{}: path contains NUL", path.display())))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(Error::Load(last_dl_error()));
        }

        let syms = resolve(handle, c"open_tide_db").and_then(|open| {
            Ok((
                open,
                resolve(handle, c"close_tide_db")?,
                resolve(handle, c"get_nearest_partial_tide_record")?,
            ))
        });

        let (open, close, nearest) = match syms {
            Ok(s) => s,
            Err(e) => {
                unsafe { libc::dlclose(handle) };
                return Err(e);
            }
        };

        // Signatures match tcd.h; the symbols stay valid until dlclose in Drop.
        unsafe {
            Ok(Self {
                handle,
                open_tide_db: std::mem::transmute::<*mut c_void, OpenFn>(open),
                close_tide_db: std::mem::transmute::<*mut c_void, CloseFn>(close),
                get_nearest_partial_tide_record: std::mem::transmute::<*mut c_void, NearestFn>(
                    nearest,
                ),
            })
        }
    }

    pub fn open(&mut self, path: &Path) -> bool {
        let c_path = match CString::new(path.as_os_str().as_bytes()) {
            Ok(p) => p,
            Err(_) => return false,
        };
        unsafe { (self.open_tide_db)(c_path.as_ptr()) != 0 }
    }

    pub fn close(&mut self) {
        unsafe { (self.close_tide_db)() }
    }

    /// Returns the record index and header, or None on a negative index.
    pub fn nearest(&mut self, lat: f64, lon: f64) -> Option<(i32, TideStationHeader)> {
        let mut header = TideStationHeader::default();
        let index = unsafe { (self.get_nearest_partial_tide_record)(lat, lon, &mut header) };
        if index < 0 {
            None
        } else {
            Some((index, header))
        }
    }
}

// The handle and entry points are process-wide; callers serialise access
// to libtcd's global database state (Session / the server's Mutex).
unsafe impl Send for Libtcd {}

impl Drop for Libtcd {
    fn drop(&mut self) {
        let rc: c_int = unsafe { libc::dlclose(self.handle) };
        if rc != 0 {
            eprintln!("[tcd] dlclose: {}", last_dl_error());
        }
    }
}
