//! Round trips through a C stand-in for libtcd, compiled with the system C
//! compiler at test time. Skipped when no compiler is available.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use nearest_tide::station::Station;
use nearest_tide::tcd::ffi::Libtcd;

const STUB_SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tcd_stub.c");

fn build_stub(dir: &Path) -> Option<PathBuf> {
    let out = dir.join("libtcd_stub.so");
    let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
    let status = Command::new(cc)
        .args(["-shared", "-fPIC", "-o"])
        .arg(&out)
        .arg(STUB_SOURCE)
        .status()
        .ok()?;
    status.success().then_some(out)
}

macro_rules! stub_or_skip {
    ($dir:expr) => {
        match build_stub($dir) {
            Some(lib) => lib,
            None => {
                eprintln!("skipping: no C compiler to build the libtcd stub");
                return;
            }
        }
    };
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"stub database").unwrap();
    path
}

fn run_cli(lib: &Path, hfile: &str, log: &Path, rust_log: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nearest-tide"));
    cmd.args(["38.0", "-122.0"])
        .env("LIBTCD_PATH", lib)
        .env("HFILE_PATH", hfile)
        .env("TCD_STUB_LOG", log)
        .env_remove("RUST_LOG");
    if let Some(filter) = rust_log {
        cmd.env("RUST_LOG", filter);
    }
    cmd.output().expect("failed to run nearest-tide")
}

#[test]
fn binding_reads_header_fields() {
    let dir = tempfile::tempdir().unwrap();
    let stub = stub_or_skip!(dir.path());

    let mut lib = Libtcd::load(&stub).expect("stub exports the libtcd entry points");

    assert!(lib.open(Path::new("/data/b.tcd")));
    let (index, header) = lib.nearest(38.0, -122.0).expect("b.tcd has a station");
    lib.close();

    assert_eq!(index, 12);
    assert_eq!(header.record_number, 12);
    assert_eq!(header.record_size, 128);
    assert_eq!(header.record_type, 1);
    assert_eq!(header.latitude, 38.1234567);
    assert_eq!(header.longitude, -122.0);
    assert_eq!(header.reference_station, 7);

    let station = Station::from_header(&header);
    assert_eq!(station.name, "Caf\u{FFFD} Pier");

    assert!(lib.open(Path::new("/data/empty.tcd")));
    assert!(lib.nearest(38.0, -122.0).is_none());
    lib.close();

    assert!(!lib.open(Path::new("/data/unknown.tcd")));
    lib.close();
}

#[test]
fn cli_merges_stub_databases() {
    let dir = tempfile::tempdir().unwrap();
    let stub = stub_or_skip!(dir.path());
    let a = touch(dir.path(), "a.tcd");
    let b = touch(dir.path(), "b.tcd");
    let bad = touch(dir.path(), "bad.tcd");
    let empty = touch(dir.path(), "empty.tcd");
    let log = dir.path().join("calls.log");

    let hfile = format!(
        "{}:{}: {} :{}",
        b.display(),
        bad.display(),
        empty.display(),
        a.display()
    );
    let out = run_cli(&stub, &hfile, &log, None);

    assert_eq!(out.status.code(), Some(0));
    let results: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(
        results,
        serde_json::json!([
            {"name": "Test Station", "lat": 38.0, "lon": -122.0, "dist": 0.0, "file": "a.tcd"},
            {"name": "Caf\u{FFFD} Pier", "lat": 38.123457, "lon": -122.0, "dist": 13.7, "file": "b.tcd"}
        ])
    );

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("Failed to open database").count(), 1, "{stderr}");

    // One close per attempted open, including the failed one
    let calls = fs::read_to_string(&log).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(
        calls,
        vec![
            "open b.tcd",
            "close b.tcd",
            "open-fail bad.tcd",
            "close -",
            "open empty.tcd",
            "close empty.tcd",
            "open a.tcd",
            "close a.tcd",
        ]
    );
}

#[test]
fn cli_debug_logging_names_station_records() {
    let dir = tempfile::tempdir().unwrap();
    let stub = stub_or_skip!(dir.path());
    let a = touch(dir.path(), "a.tcd");
    let log = dir.path().join("calls.log");

    let out = run_cli(
        &stub,
        &a.display().to_string(),
        &log,
        Some("nearest_tide=debug"),
    );

    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("nearest station"), "{stderr}");
    assert!(stderr.contains("record=7"), "{stderr}");
    assert!(stderr.contains("tzfile=3"), "{stderr}");
}
