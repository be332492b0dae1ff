//! # Happy Hour Map
//!
//! Directory of restaurant happy-hour deals around Los Angeles, shown as pins
//! on a map next to a sidebar list that can be filtered by neighborhood.
//!
//!
//!
//! # General Flow
//! - Load the deals CSV, trying each [`loader::DataSource`] in order
//! - Merge rows into places keyed by restaurant name
//! - Fill missing coordinates from a frozen snapshot, then optionally from the
//!   places provider
//! - Hand everything to a [`map::MapController`], which owns the markers, the
//!   listing rows, the active highlight, the filter and the map view
//!
//! Nothing here aborts the page. A missing file, a broken row or a failed
//! geocoding call is logged and the place lands at the default city center.
//!
//!
//!
//! # Notes
//!
//! ## Coordinates
//! The sheet went through several exports that disagree on where coordinates
//! live. The order used everywhere is: combined `coordinates` column, separate
//! `latitude`/`longitude` columns, geocoding, default center. See [`merge`].
//!
//! ## Billing
//! Every places lookup is billed. The `process` binary geocodes once and
//! writes a snapshot CSV, later loads read the snapshot instead of calling the
//! provider again.
//!
//! ## 10/19/26
//! - Companion address lookup only knows one restaurant, coordinates are
//!   never returned by it
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run the address lookup service.
//! ```sh
//! RUST_LOG=info cargo run -p backend
//! ```
//!
//! Freeze coordinates for a sheet.
//! ```sh
//! PLACES_API_KEY=... cargo run -p process -- main.csv --snapshot coordinates.csv
//! ```
use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod geocode;
pub mod loader;
pub mod map;
pub mod merge;
pub mod place;
pub mod snapshot;
pub mod view;

use config::MapConfig;
use geocode::{Geocoder, PlaceProvider};
use loader::{DataSource, load_first};
use map::MapController;
use merge::{Directory, resolve_missing};
use snapshot::SnapshotRow;

/// Loads and merges the first usable source. `None` when every source failed.
pub async fn load_directory(
    client: &Client,
    sources: &[DataSource],
    snapshot: &[SnapshotRow],
) -> Option<Directory> {
    let records = load_first(client, sources).await?;
    let mut directory = Directory::from_records(&records);

    if !snapshot.is_empty() {
        let resolved = directory.apply_snapshot(snapshot);
        info!("Snapshot resolved {resolved} places");
    }

    Some(directory)
}

/// fetch, parse, merge, render
pub async fn initialize(
    client: &Client,
    sources: &[DataSource],
    snapshot: &[SnapshotRow],
    config: MapConfig,
) -> Option<MapController> {
    let Some(directory) = load_directory(client, sources, snapshot).await else {
        error!("Could not load data from CSV files");
        return None;
    };

    Some(MapController::new(config, directory))
}

/// Same as [`initialize`], geocoding places still missing coordinates before
/// any marker is built.
pub async fn initialize_geocoded<P: PlaceProvider>(
    client: &Client,
    sources: &[DataSource],
    snapshot: &[SnapshotRow],
    config: MapConfig,
    geocoder: &mut Geocoder<P>,
    delay: Duration,
) -> Option<MapController> {
    let Some(mut directory) = load_directory(client, sources, snapshot).await else {
        error!("Could not load data from CSV files");
        return None;
    };

    resolve_missing(&mut directory, geocoder, delay).await;

    Some(MapController::new(config, directory))
}
