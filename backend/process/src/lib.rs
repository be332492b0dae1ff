//! # Coordinate Freezing
//!
//! Every places lookup is billed, so the page should not geocode on every
//! load. This crate does it once, offline.
//!
//! ## Flow
//! 1. Load the deals sheet through the usual source chain (the given CSV, then
//!    the spreadsheet export).
//! 2. Reuse coordinates from an earlier snapshot at the output path, unless
//!    `--fresh` is passed.
//! 3. Geocode the rest one at a time with a fixed pause between calls.
//! 4. Write `restaurant_key,map_url,address,latitude,longitude` for every
//!    place. Unresolved places keep empty coordinates so the next run retries
//!    them.
//!
//! Without an API key step 3 is skipped and the snapshot only carries what the
//! sheet already had.
use std::{
    fs::File,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use happyhour::{
    geocode::{Geocoder, PlaceProvider},
    loader::{DataSource, load_first},
    merge::{Directory, resolve_missing_with},
    snapshot::{read_snapshot, snapshot_rows, write_snapshot_file},
};
use reqwest::Client;
use tracing::{info, warn};

pub mod utils;

use utils::progress_bar;

pub const SNAPSHOT_PATH: &str = "coordinates.csv";

#[derive(Clone, Debug)]
pub struct Options {
    pub sources: Vec<DataSource>,
    pub snapshot: PathBuf,
    pub delay: Duration,
    pub fresh: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub places: usize,
    pub from_snapshot: usize,
    pub geocoded: usize,
    pub unresolved: usize,
}

pub async fn freeze_coordinates<P: PlaceProvider>(
    client: &Client,
    options: &Options,
    geocoder: Option<Geocoder<P>>,
) -> anyhow::Result<Summary> {
    let records = load_first(client, &options.sources)
        .await
        .context("Could not load data from CSV files")?;

    let mut directory = Directory::from_records(&records);
    println!("Loaded Places: {}", directory.len());

    let from_snapshot = if options.fresh {
        0
    } else {
        reuse_snapshot(&mut directory, &options.snapshot)
    };

    let geocoded = match geocoder {
        Some(mut geocoder) => geocode_all(&mut directory, &mut geocoder, options.delay).await,
        None => 0,
    };

    write_snapshot_file(&options.snapshot, &snapshot_rows(&directory))
        .with_context(|| format!("Failed to write {}", options.snapshot.display()))?;

    let summary = Summary {
        places: directory.len(),
        from_snapshot,
        geocoded,
        unresolved: directory.unresolved().count(),
    };

    println!("Reused From Snapshot: {}", summary.from_snapshot);
    println!("Geocoded: {}", summary.geocoded);
    println!("Unresolved: {}\n", summary.unresolved);
    println!("Snapshot written to {}", options.snapshot.display());

    Ok(summary)
}

/// Coordinates from an earlier run. A missing or unreadable file reuses nothing.
fn reuse_snapshot(directory: &mut Directory, path: &Path) -> usize {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("Cannot open snapshot {}: {e}", path.display());
            return 0;
        }
    };

    match read_snapshot(file) {
        Ok(rows) => {
            let reused = directory.apply_snapshot(&rows);
            info!("Reused {reused} coordinates from {}", path.display());
            reused
        }
        Err(e) => {
            warn!("Ignoring unreadable snapshot {}: {e}", path.display());
            0
        }
    }
}

/// Sequential lookups for every place still missing coordinates.
pub async fn geocode_all<P: PlaceProvider>(
    directory: &mut Directory,
    geocoder: &mut Geocoder<P>,
    delay: Duration,
) -> usize {
    let pb = progress_bar(directory.unresolved().count());

    let geocoded = resolve_missing_with(directory, geocoder, delay, |name, found| {
        let message = if found {
            format!("Resolved {name}")
        } else {
            format!("No location for {name}")
        };

        #[cfg(feature = "verbose")]
        println!("{message}");

        pb.set_message(message);
        pb.inc(1);
    })
    .await;

    pb.finish_with_message("Done");
    geocoded
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs};

    use happyhour::{
        error::GeocodeError,
        geocode::{LatLng, PlaceDetails},
        loader::Location,
        place::Coordinates,
    };

    use super::*;

    /// Query to coordinates, ids are the queries themselves.
    #[derive(Default)]
    struct Table {
        places: HashMap<String, (f64, f64)>,
    }

    impl Table {
        fn with(mut self, query: &str, lat: f64, lng: f64) -> Self {
            self.places.insert(query.to_string(), (lat, lng));
            self
        }
    }

    impl PlaceProvider for Table {
        async fn search_text(&self, query: &str) -> Result<String, GeocodeError> {
            if self.places.contains_key(query) {
                Ok(query.to_string())
            } else {
                Err(GeocodeError::NoResults(query.to_string()))
            }
        }

        async fn place_details(&self, id: &str) -> Result<PlaceDetails, GeocodeError> {
            let (latitude, longitude) = self.places[id];

            Ok(PlaceDetails {
                id: id.to_string(),
                formatted_address: Some(format!("{id} address")),
                location: Some(LatLng { latitude, longitude }),
                ..Default::default()
            })
        }
    }

    struct Workspace {
        csv: PathBuf,
        snapshot: PathBuf,
    }

    impl Workspace {
        fn new(label: &str, csv: &str) -> Self {
            let name = format!("happyhour-process-{}-{label}", std::process::id());
            let dir = std::env::temp_dir().join(name);
            fs::create_dir_all(&dir).unwrap();

            let workspace = Self {
                csv: dir.join("main.csv"),
                snapshot: dir.join(SNAPSHOT_PATH),
            };
            fs::write(&workspace.csv, csv).unwrap();
            let _ = fs::remove_file(&workspace.snapshot);

            workspace
        }

        fn options(&self, fresh: bool) -> Options {
            Options {
                sources: vec![DataSource::main(Location::File(self.csv.clone()))],
                snapshot: self.snapshot.clone(),
                delay: Duration::ZERO,
                fresh,
            }
        }

        fn rows(&self) -> Vec<happyhour::snapshot::SnapshotRow> {
            read_snapshot(File::open(&self.snapshot).unwrap()).unwrap()
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            if let Some(dir) = self.csv.parent() {
                let _ = fs::remove_dir_all(dir);
            }
        }
    }

    const SHEET: &str = "Name,address,coordinates\n\
                         Akuma,,\"34.09,-118.38\"\n\
                         Badmaash,,\n\
                         Nowhere,,\n";

    #[tokio::test]
    async fn test_freeze_coordinates() {
        let workspace = Workspace::new("freeze", SHEET);
        let table = Table::default().with("Badmaash, Los Angeles", 34.05, -118.25);
        let geocoder = Geocoder::new(table, "Los Angeles");

        let summary = freeze_coordinates(&Client::new(), &workspace.options(false), Some(geocoder))
            .await
            .unwrap();

        assert_eq!(
            summary,
            Summary {
                places: 3,
                from_snapshot: 0,
                geocoded: 1,
                unresolved: 1,
            }
        );

        let rows = workspace.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].coordinates(), Coordinates::new(34.09, -118.38));
        assert_eq!(rows[1].coordinates(), Coordinates::new(34.05, -118.25));
        assert_eq!(rows[1].address, "Badmaash, Los Angeles address");
        assert_eq!(rows[2].restaurant_key, "Nowhere");
        assert_eq!(rows[2].latitude, None);
    }

    #[tokio::test]
    async fn test_second_run_reuses_snapshot() {
        let workspace = Workspace::new("reuse", SHEET);
        let table = Table::default().with("Badmaash, Los Angeles", 34.05, -118.25);
        let geocoder = Some(Geocoder::new(table, "Los Angeles"));
        freeze_coordinates(&Client::new(), &workspace.options(false), geocoder)
            .await
            .unwrap();

        let mut geocoder = Geocoder::new(Table::default(), "Los Angeles");
        let records = load_first(&Client::new(), &workspace.options(false).sources).await.unwrap();
        let mut directory = Directory::from_records(&records);

        assert_eq!(reuse_snapshot(&mut directory, &workspace.snapshot), 1);
        assert_eq!(geocode_all(&mut directory, &mut geocoder, Duration::ZERO).await, 0);
        assert_eq!(directory.unresolved().count(), 1);
    }

    #[tokio::test]
    async fn test_fresh_ignores_snapshot() {
        let workspace = Workspace::new("fresh", SHEET);
        fs::write(
            &workspace.snapshot,
            "restaurant_key,map_url,address,latitude,longitude\nBadmaash,,,34.05,-118.25\n",
        )
        .unwrap();

        let summary = freeze_coordinates::<Table>(&Client::new(), &workspace.options(true), None)
            .await
            .unwrap();

        assert_eq!(summary.from_snapshot, 0);
        assert_eq!(summary.unresolved, 2);
        assert_eq!(workspace.rows()[1].latitude, None);
    }

    #[tokio::test]
    async fn test_without_geocoder_keeps_sheet_coordinates() {
        let workspace = Workspace::new("offline", SHEET);

        let summary = freeze_coordinates::<Table>(&Client::new(), &workspace.options(false), None)
            .await
            .unwrap();

        assert_eq!(summary.geocoded, 0);
        assert_eq!(summary.unresolved, 2);
        assert_eq!(workspace.rows()[0].coordinates(), Coordinates::new(34.09, -118.38));
    }

    #[tokio::test]
    async fn test_missing_sheet_fails() {
        let options = Options {
            sources: vec![DataSource::main("/nonexistent/happyhour/main.csv")],
            snapshot: std::env::temp_dir().join("happyhour-process-never-written.csv"),
            delay: Duration::ZERO,
            fresh: true,
        };

        assert!(freeze_coordinates::<Table>(&Client::new(), &options, None).await.is_err());
        assert!(!options.snapshot.exists());
    }

    #[tokio::test]
    async fn test_failed_lookups_are_not_cached() {
        let workspace = Workspace::new("retry", SHEET);
        let records = load_first(&Client::new(), &workspace.options(false).sources).await.unwrap();
        let mut directory = Directory::from_records(&records);
        let table = Table::default().with("Badmaash, Los Angeles", 34.05, -118.25);
        let mut geocoder = Geocoder::new(table, "Los Angeles");

        assert_eq!(geocode_all(&mut directory, &mut geocoder, Duration::ZERO).await, 1);
        assert_eq!(geocode_all(&mut directory, &mut geocoder, Duration::ZERO).await, 0);

        assert_eq!(geocoder.cache_len(), 1);
        assert!(geocoder.cached("Nowhere").is_none());
    }
}
