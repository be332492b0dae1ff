//! # Data Merge
//!
//! Builds [`Place`]s from loaded records, keyed by restaurant name.
//!
//! ## Coordinate precedence
//!
//! 1. The combined `coordinates` column (`"lat,lng"`).
//! 2. Separate `latitude`/`longitude` columns, as written by the snapshot.
//! 3. The geocoding provider, through [`resolve_missing`], only for places
//!    still missing coordinates.
//! 4. Nothing: the place keeps `None` and is drawn at the default center.
//!
//! A later row with the same name replaces the earlier place outright.
use std::{collections::HashMap, time::Duration};

use chrono::Weekday;
use tracing::{info, warn};

use crate::{
    geocode::{Geocoder, PlaceDetails, PlaceProvider},
    loader::{Record, columns},
    place::{Coordinates, Place, normalize_label},
    snapshot::SnapshotRow,
};

const WEEKDAY_COLUMNS: [(Weekday, &[&str]); 7] = [
    (Weekday::Mon, columns::MONDAY),
    (Weekday::Tue, columns::TUESDAY),
    (Weekday::Wed, columns::WEDNESDAY),
    (Weekday::Thu, columns::THURSDAY),
    (Weekday::Fri, columns::FRIDAY),
    (Weekday::Sat, columns::SATURDAY),
    (Weekday::Sun, columns::SUNDAY),
];

/// Places in load order with a name index.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    places: Vec<Place>,
    index: HashMap<String, usize>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[Record]) -> Self {
        let mut directory = Self::new();

        for record in records {
            directory.merge(record);
        }

        info!("Merged {} places from {} records", directory.len(), records.len());
        directory
    }

    /// Builds a place from `record` and stores it. Rows without a name are
    /// skipped.
    pub fn merge(&mut self, record: &Record) -> Option<&Place> {
        let place = place_from_record(record)?;

        Some(self.insert(place))
    }

    /// Last write wins on a name collision.
    pub fn insert(&mut self, place: Place) -> &Place {
        let slot = match self.index.get(&place.name) {
            Some(&slot) => {
                warn!("Duplicate restaurant {}, replacing earlier row", place.name);
                self.places[slot] = place;
                slot
            }
            None => {
                self.index.insert(place.name.clone(), self.places.len());
                self.places.push(place);
                self.places.len() - 1
            }
        };

        &self.places[slot]
    }

    pub fn get(&self, name: &str) -> Option<&Place> {
        self.index.get(name).map(|&slot| &self.places[slot])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Place> {
        self.index.get(name).map(|&slot| &mut self.places[slot])
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn into_places(self) -> Vec<Place> {
        self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Place> {
        self.places.iter().filter(|place| place.coordinates.is_none())
    }

    /// Fills coordinates, address and map link from a frozen snapshot. Returns
    /// how many places gained coordinates.
    pub fn apply_snapshot(&mut self, rows: &[SnapshotRow]) -> usize {
        let mut resolved = 0;

        for row in rows {
            let Some(place) = self.get_mut(&normalize_label(&row.restaurant_key)) else {
                warn!("Snapshot row {} matches no restaurant", row.restaurant_key);
                continue;
            };

            if place.coordinates.is_none() {
                if let Some(coordinates) = row.coordinates() {
                    place.coordinates = Some(coordinates);
                    resolved += 1;
                }
            }

            if place.address.is_empty() {
                place.address = row.address.clone();
            }

            if place.map_uri.is_empty() {
                place.map_uri = row.map_url.clone();
            }
        }

        resolved
    }
}

pub fn place_from_record(record: &Record) -> Option<Place> {
    let mut place = Place::new(record.first(columns::NAME)?);

    place.address = record.first(columns::ADDRESS).unwrap_or_default().to_string();
    place.neighborhood = normalize_label(record.first(columns::NEIGHBORHOOD).unwrap_or_default());
    place.map_uri = record.first(columns::MAP_URL).unwrap_or_default().to_string();
    place.games = record.first(columns::GAMES).unwrap_or_default().to_string();
    place.haunted = record.first(columns::HAUNTED).unwrap_or_default().to_string();
    place.coordinates = record_coordinates(record);

    for (day, aliases) in WEEKDAY_COLUMNS {
        if let Some(deal) = record.first(aliases) {
            place.happy_hours.set(day, deal.to_string());
        }
    }

    Some(place)
}

fn record_coordinates(record: &Record) -> Option<Coordinates> {
    if let Some(raw) = record.first(columns::COORDINATES) {
        match Coordinates::parse_pair(raw) {
            Some(coordinates) => return Some(coordinates),
            None => warn!("Unusable coordinates {raw:?}, expected \"lat,lng\""),
        }
    }

    Coordinates::parse_parts(
        record.first(columns::LATITUDE)?,
        record.first(columns::LONGITUDE)?,
    )
}

/// Geocodes every place without coordinates, one call at a time with `delay`
/// between calls. Returns how many places were resolved.
pub async fn resolve_missing<P: PlaceProvider>(
    directory: &mut Directory,
    geocoder: &mut Geocoder<P>,
    delay: Duration,
) -> usize {
    resolve_missing_with(directory, geocoder, delay, |_, _| {}).await
}

/// [`resolve_missing`], calling `on_place` with each name and whether it was
/// resolved.
pub async fn resolve_missing_with<P, F>(
    directory: &mut Directory,
    geocoder: &mut Geocoder<P>,
    delay: Duration,
    mut on_place: F,
) -> usize
where
    P: PlaceProvider,
    F: FnMut(&str, bool),
{
    let pending: Vec<String> = directory.unresolved().map(|place| place.name.clone()).collect();
    let mut resolved = 0;

    for (i, name) in pending.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let found = resolve_place(directory, geocoder, name).await;
        if found {
            resolved += 1;
        }

        on_place(name, found);
    }

    info!("Geocoded {resolved} of {} places", pending.len());
    resolved
}

/// Geocodes the place called `name`. True when it ended up with coordinates.
pub async fn resolve_place<P: PlaceProvider>(
    directory: &mut Directory,
    geocoder: &mut Geocoder<P>,
    name: &str,
) -> bool {
    let Some(place) = directory.get_mut(name) else {
        return false;
    };

    let Some(details) = geocoder.lookup(name, &place.address).await else {
        return false;
    };

    apply_details(place, details)
}

/// Copies provider details onto the place. True when coordinates were set.
pub fn apply_details(place: &mut Place, details: PlaceDetails) -> bool {
    let coordinates = details.coordinates();

    if place.address.is_empty() {
        place.address = details.formatted_address.clone().unwrap_or_default();
    }

    if place.map_uri.is_empty() {
        place.map_uri = details.google_maps_uri.clone().unwrap_or_default();
    }

    place.details = Some(details);

    match coordinates {
        Some(coordinates) => {
            place.coordinates = Some(coordinates);
            true
        }
        None => {
            warn!("Provider returned no location for {}", place.name);
            false
        }
    }
}
