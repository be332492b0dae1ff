//! # Coordinate Snapshot
//!
//! Geocoding results frozen to CSV so the next load never queries the
//! provider again. Columns: `restaurant_key,map_url,address,latitude,longitude`.
//! Unresolved places are written with empty coordinates.
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};

use crate::{error::SnapshotError, merge::Directory, place::{Coordinates, Place}};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub restaurant_key: String,
    pub map_url: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SnapshotRow {
    pub fn from_place(place: &Place) -> Self {
        Self {
            restaurant_key: place.name.clone(),
            map_url: place.map_uri.clone(),
            address: place.address.clone(),
            latitude: place.coordinates.map(|c| c.lat),
            longitude: place.coordinates.map(|c| c.lng),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
    }
}

pub fn snapshot_rows(directory: &Directory) -> Vec<SnapshotRow> {
    directory.places().iter().map(SnapshotRow::from_place).collect()
}

pub fn write_snapshot<W: Write>(writer: W, rows: &[SnapshotRow]) -> Result<(), SnapshotError> {
    let mut writer = Writer::from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_snapshot_file(path: &Path, rows: &[SnapshotRow]) -> Result<(), SnapshotError> {
    write_snapshot(File::create(path)?, rows)
}

/// The snapshot as a downloadable CSV document.
pub fn to_csv_string(rows: &[SnapshotRow]) -> Result<String, SnapshotError> {
    let mut buffer = Vec::new();
    write_snapshot(&mut buffer, rows)?;

    String::from_utf8(buffer).map_err(|e| SnapshotError::Flush(e.to_string()))
}

pub fn read_snapshot<R: Read>(reader: R) -> Result<Vec<SnapshotRow>, SnapshotError> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    reader
        .deserialize()
        .map(|row| row.map_err(SnapshotError::from))
        .collect()
}
