//! # CSV Loader
//!
//! Turns a CSV resource into plain records.
//!
//! ## Sources
//!
//! The deals sheet has been exported in two shapes over time:
//! - `main.csv`: a clean header row, one restaurant per row.
//! - `data/restaurants.csv`: a spreadsheet export with three banner lines
//!   (title, notes, a broken header) before the data. Those lines are dropped
//!   by fixed offset and a known-good header is put in their place.
//!
//! Each shape is a [`DataSource`]. [`load_first`] walks an ordered list of
//! them and returns the first one that yields rows. Every failure is logged and
//! swallowed, callers only see `None`.
//!
//! ## Records
//!
//! A [`Record`] maps lowercased column names to trimmed cell values. Columns
//! were renamed between exports, so lookups go through alias lists in
//! [`columns`].
use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use csv::{ReaderBuilder, Trim};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::error::LoadError;

pub const MAIN_CSV_PATH: &str = "main.csv";
pub const BANNER_CSV_PATH: &str = "data/restaurants.csv";
pub const BANNER_LINES: usize = 3;
pub const BANNER_HEADER: &str =
    "Name,URL,Monday,Tuesday,Wednesday,Thursday,Friday,Saturday,Sunday,GAMES?!,HAUNTED?!";

pub mod columns {
    pub const NAME: &[&str] = &["name", "restaurant_key"];
    pub const MAP_URL: &[&str] = &["restaurant google map url", "map_url", "url"];
    pub const ADDRESS: &[&str] = &["address", "formatted_address"];
    pub const COORDINATES: &[&str] = &["coordinates"];
    pub const LATITUDE: &[&str] = &["latitude", "lat"];
    pub const LONGITUDE: &[&str] = &["longitude", "lng", "lon"];
    pub const NEIGHBORHOOD: &[&str] = &["neighborhood"];
    pub const GAMES: &[&str] = &["games?!", "details_games"];
    pub const HAUNTED: &[&str] = &["haunted?!", "details_haunted"];

    pub const MONDAY: &[&str] = &["monday", "details_monday"];
    pub const TUESDAY: &[&str] = &["tuesday", "details_tuesday"];
    pub const WEDNESDAY: &[&str] = &["wednesday", "details_wednesday"];
    pub const THURSDAY: &[&str] = &["thursday", "details_thursday"];
    pub const FRIDAY: &[&str] = &["friday", "details_friday"];
    pub const SATURDAY: &[&str] = &["saturday", "details_saturday"];
    pub const SUNDAY: &[&str] = &["sunday", "details_sunday"];
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.as_ref().trim().to_string()))
            .collect();

        Self { fields }
    }

    /// Non-empty value of `column`, case-insensitive.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(&column.to_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// First non-empty value among `aliases`.
    pub fn first(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    File(PathBuf),
    Url(String),
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Location::Url(raw.to_string())
        } else {
            Location::File(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowFilter {
    /// Rows with a name. Area sub-headings in the sheet have none.
    Named,
    /// Rows with a name and a map link.
    NamedWithLink,
}

impl RowFilter {
    pub fn keep(self, record: &Record) -> bool {
        let named = record.first(columns::NAME).is_some();

        match self {
            RowFilter::Named => named,
            RowFilter::NamedWithLink => named && record.first(columns::MAP_URL).is_some(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DataSource {
    pub name: String,
    pub location: Location,
    pub skip_lines: usize,
    pub header: Option<String>,
    pub rows: RowFilter,
}

impl DataSource {
    /// A CSV carrying its own header row.
    pub fn main(location: impl Into<Location>) -> Self {
        Self {
            name: "Main Data".to_string(),
            location: location.into(),
            skip_lines: 0,
            header: None,
            rows: RowFilter::Named,
        }
    }

    /// A spreadsheet export with banner lines above the data.
    pub fn banner(location: impl Into<Location>) -> Self {
        Self {
            name: "Spreadsheet Export".to_string(),
            location: location.into(),
            skip_lines: BANNER_LINES,
            header: Some(BANNER_HEADER.to_string()),
            rows: RowFilter::NamedWithLink,
        }
    }

    pub async fn load(&self, client: &Client) -> Result<Vec<Record>, LoadError> {
        let text = fetch_text(client, &self.location).await?;
        let repaired = repair(&text, self.skip_lines, self.header.as_deref());

        let records: Vec<Record> = parse_records(&repaired)?
            .into_iter()
            .filter(|record| self.rows.keep(record))
            .collect();

        if records.is_empty() {
            return Err(LoadError::Empty(self.location.to_string()));
        }

        Ok(records)
    }
}

/// The deals CSV first, then the spreadsheet export.
pub fn source_chain(main: &str, banner: &str) -> Vec<DataSource> {
    vec![DataSource::main(main), DataSource::banner(banner)]
}

/// Tries each source in order and returns the first non-empty record set.
pub async fn load_first(client: &Client, sources: &[DataSource]) -> Option<Vec<Record>> {
    for source in sources {
        info!("Attempting to load data from: {} ({})", source.location, source.name);

        match source.load(client).await {
            Ok(records) => {
                info!("Loaded {} records from {}", records.len(), source.location);
                return Some(records);
            }
            Err(e) => warn!("Failed to load {}: {e}. Trying next source.", source.location),
        }
    }

    error!("All attempts to load data from CSV sources failed");
    None
}

pub async fn fetch_text(client: &Client, location: &Location) -> Result<String, LoadError> {
    match location {
        Location::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                LoadError::NotFound(path.clone())
            } else {
                LoadError::Io(e)
            }
        }),
        Location::Url(url) => {
            let response = client.get(url).send().await?;
            let status = response.status();

            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status,
                });
            }

            Ok(response.text().await?)
        }
    }
}

/// Drops `skip_lines` leading lines and puts `header` on top.
pub fn repair(text: &str, skip_lines: usize, header: Option<&str>) -> String {
    header
        .into_iter()
        .chain(text.lines().skip(skip_lines))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_records(text: &str) -> Result<Vec<Record>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        records.push(Record::from_pairs(headers.iter().zip(row.iter())));
    }

    Ok(records)
}
