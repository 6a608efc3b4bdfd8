//! nearest-tide HTTP service
//!
//! Environment:
//!   PORT         listen port (default 3000)
//!   PUBLIC_DIR   static files served for every other path (default ./public)
//!   HFILE_PATH   database list, as for the CLI
//!   LIBTCD_PATH  optional explicit libtcd location
//!   RUST_LOG     log filter (default info)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use nearest_tide::config;
use nearest_tide::server::{create_router, AppState};
use nearest_tide::tcd::Tcd;
use nearest_tide::{HFILE_ENV, LIBTCD_ENV};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::var("PORT") {
        Ok(p) => match p.parse::<u16>() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("Invalid PORT: {}", p);
                process::exit(1);
            }
        },
        Err(_) => DEFAULT_PORT,
    };

    let static_dir = std::env::var_os("PUBLIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("public"));

    let hfile = std::env::var_os(HFILE_ENV);
    if hfile.as_ref().map_or(true, |v| v.is_empty()) {
        warn!("{} not set; lookups will fail", HFILE_ENV);
    }

    let libtcd = config::library_candidates(std::env::var_os(LIBTCD_ENV).map(PathBuf::from));
    let state = AppState::new(Tcd::new(libtcd), hfile);
    let app = create_router(state, &static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("bind {addr}: {e}");
            process::exit(1);
        }
    };

    info!("nearest-tide listening on http://{addr}");
    info!("  POST /api/nearest  {{\"lat\": .., \"lng\": ..}}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        process::exit(1);
    }
}
