//! # Places
//!
//! One restaurant in the directory, keyed by name.
//!
//! Coordinates stay `None` until something resolves them: the CSV itself, a
//! frozen snapshot or the geocoding provider. Rendering code falls back to the
//! configured city center for unresolved places, the place itself never
//! pretends to be somewhere it is not.
use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geocode::PlaceDetails;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Only finite values inside the WGS84 ranges are accepted.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        valid.then_some(Self { lat, lng })
    }

    /// Parses the combined `"lat,lng"` column.
    pub fn parse_pair(raw: &str) -> Option<Self> {
        let mut halves = raw.split(',');
        let (lat, lng) = (halves.next()?, halves.next()?);

        if halves.next().is_some() {
            return None;
        }

        Self::parse_parts(lat, lng)
    }

    pub fn parse_parts(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;

        Self::new(lat, lng)
    }

    pub fn centroid<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinates>,
    {
        let (count, lat, lng) = points
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, lat, lng), p| (n + 1, lat + p.lat, lng + p.lng));

        (count > 0).then(|| Self {
            lat: lat / count as f64,
            lng: lng / count as f64,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HappyHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl HappyHours {
    pub fn get(&self, day: Weekday) -> &str {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn set(&mut self, day: Weekday, deal: String) {
        let slot = match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };

        *slot = deal;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Place {
    pub name: String,
    pub address: String,
    pub neighborhood: String,
    pub coordinates: Option<Coordinates>,
    pub map_uri: String,
    pub happy_hours: HappyHours,
    pub games: String,
    pub haunted: String,
    pub details: Option<PlaceDetails>,
}

impl Place {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_label(name),
            ..Default::default()
        }
    }

    pub fn deal(&self, day: Weekday) -> &str {
        self.happy_hours.get(day)
    }

    pub fn in_neighborhood(&self, neighborhood: &str) -> bool {
        self.neighborhood == neighborhood
    }
}

/// Trims and collapses inner whitespace so `"West  Hollywood "` and
/// `"West Hollywood"` land in the same neighborhood.
pub fn normalize_label(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}
