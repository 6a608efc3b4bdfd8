//! Station records and great-circle distance.

use serde::Serialize;
use std::path::Path;

use crate::tcd::ffi::TideStationHeader;
use crate::EARTH_RADIUS_KM;

/// Decoded station header
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub record_number: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reference_station: i32,
    pub tzfile: i16,
}

impl Station {
    #[cfg(test)]
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            record_number: 0,
            name: name.to_string(),
            latitude,
            longitude,
            reference_station: -1,
            tzfile: 0,
        }
    }

    pub fn from_header(header: &TideStationHeader) -> Self {
        Self {
            record_number: header.record_number,
            name: decode_name(&header.name_bytes()),
            latitude: header.latitude,
            longitude: header.longitude,
            reference_station: header.reference_station,
            tzfile: header.tzfile,
        }
    }
}

/// Lossy UTF-8 with surrounding whitespace removed
pub fn decode_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Haversine distance in km on a sphere of radius EARTH_RADIUS_KM
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub dist: f64,
    pub file: String,
}

impl StationRecord {
    pub fn new(station: &Station, query_lat: f64, query_lon: f64, db_path: &Path) -> Self {
        let dist = haversine(query_lat, query_lon, station.latitude, station.longitude);
        let file = db_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            name: station.name.clone(),
            lat: round_to(station.latitude, 6),
            lon: round_to(station.longitude, 6),
            dist: round_to(dist, 1),
            file,
        }
    }
}
