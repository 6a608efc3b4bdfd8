//! HTTP front end.
//!
//! POST /api/nearest with a JSON body carrying `lat` | `latitude` and
//! `lng` | `lon` | `longitude` as numbers. Responds with the same array the
//! CLI prints.
//!   400 {"error": "Invalid coordinates", "received": <body>}
//!   500 {"error": "Lookup failed", "details": ..}
//! Everything else is served from the static directory.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::config;
use crate::locate::{self, Coordinate};
use crate::station::StationRecord;
use crate::tcd::TideDb;

/// Upper bound on one lookup, library load included
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Shared application state.
///
/// The database backend sits behind a mutex: libtcd has one global
/// "current database", so lookups from concurrent requests run one at a time.
pub struct AppState<D> {
    db: Arc<Mutex<D>>,
    hfile: Option<OsString>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            hfile: self.hfile.clone(),
        }
    }
}

impl<D: TideDb + Send + 'static> AppState<D> {
    /// `hfile` is the raw HFILE_PATH value; it is re-resolved per request.
    pub fn new(db: D, hfile: Option<OsString>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            hfile,
        }
    }
}

/// Create the application router.
pub fn create_router<D: TideDb + Send + 'static>(state: AppState<D>, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/nearest", post(nearest::<D>))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Lookup failures surfaced as 500s.
#[derive(Debug)]
pub enum LookupError {
    Config(crate::Error),
    Timeout,
    Task(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Config(e) => write!(f, "{}", e),
            LookupError::Timeout => {
                write!(f, "lookup timed out after {}s", LOOKUP_TIMEOUT.as_secs())
            }
            LookupError::Task(msg) => write!(f, "lookup task failed: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

pub enum ApiError {
    InvalidCoordinates { received: Value },
    Lookup(LookupError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidCoordinates { received } => {
                warn!(%received, "bad coordinates");
                let body = json!({ "error": "Invalid coordinates", "received": received });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Lookup(e) => {
                error!(error = %e, "lookup failed");
                let body = json!({ "error": "Lookup failed", "details": e.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// First present, non-null field among `names`.
fn field<'a>(body: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| body.get(*name).filter(|v| !v.is_null()))
}

/// Coordinates from a request body. Both must be JSON numbers.
pub fn coordinates(body: &Value) -> Option<Coordinate> {
    let lat = field(body, &["lat", "latitude"])?.as_f64()?;
    let lon = field(body, &["lng", "lon", "longitude"])?.as_f64()?;
    Some(Coordinate { lat, lon })
}

async fn lookup<D: TideDb + Send + 'static>(
    state: &AppState<D>,
    query: Coordinate,
) -> Result<Vec<StationRecord>, LookupError> {
    let db = Arc::clone(&state.db);
    let hfile = state.hfile.clone();

    let task = tokio::task::spawn_blocking(move || {
        let databases = config::databases(hfile.as_deref()).map_err(LookupError::Config)?;
        let mut db = db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(locate::nearest_stations(&mut *db, query, &databases))
    });

    match tokio::time::timeout(LOOKUP_TIMEOUT, task).await {
        Err(_) => Err(LookupError::Timeout),
        Ok(Err(e)) => Err(LookupError::Task(e.to_string())),
        Ok(Ok(result)) => result,
    }
}

/// POST /api/nearest
async fn nearest<D: TideDb + Send + 'static>(
    State(state): State<AppState<D>>,
    body: Bytes,
) -> Result<Json<Vec<StationRecord>>, ApiError> {
    let received: Value =
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::Object(Map::new()));
    info!(body = %received, "POST /api/nearest");

    let query = match coordinates(&received) {
        Some(query) => query,
        None => return Err(ApiError::InvalidCoordinates { received }),
    };

    let results = lookup(&state, query).await.map_err(ApiError::Lookup)?;
    info!(
        lat = query.lat,
        lon = query.lon,
        count = results.len(),
        best = results.first().map(|r| r.name.as_str()).unwrap_or("-"),
        "nearest stations"
    );
    Ok(Json(results))
}
