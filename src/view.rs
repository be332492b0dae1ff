//! # View Models
//!
//! What the sidebar row, the marker popup and the details panel show for a
//! place, independent of how a frontend draws it.
use chrono::Weekday;
use serde::Serialize;

use crate::{
    geocode::{OpeningHours, PlaceDetails},
    place::Place,
};

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_NEIGHBORHOOD_LABEL: &str = "LA Area";
pub const NO_RATING: &str = "—";

const MAPS_PROXY_PREFIX: &str = "http://googleusercontent.com/maps.google.com/";
const ALWAYS_OPEN: &str = "Open 24 hours";

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn todays_deal(place: &Place, day: Weekday) -> &str {
    match place.deal(day) {
        "" => NOT_AVAILABLE,
        deal => deal,
    }
}

/// Drops the proxy prefix some exports put in front of map links.
pub fn clean_map_link(uri: &str) -> Option<String> {
    let uri = uri.trim();
    let cleaned = uri.strip_prefix(MAPS_PROXY_PREFIX).unwrap_or(uri);

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingView {
    pub number: usize,
    pub name: String,
    pub neighborhood: String,
    pub day: &'static str,
    pub deal: String,
}

impl ListingView {
    pub fn new(index: usize, place: &Place, day: Weekday) -> Self {
        let neighborhood = match place.neighborhood.as_str() {
            "" => DEFAULT_NEIGHBORHOOD_LABEL,
            neighborhood => neighborhood,
        };

        Self {
            number: index + 1,
            name: place.name.clone(),
            neighborhood: neighborhood.to_string(),
            day: day_name(day),
            deal: todays_deal(place, day).to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopupView {
    pub title: String,
    pub day: &'static str,
    pub deal: String,
    pub map_link: Option<String>,
    pub games: String,
    pub haunted: String,
}

impl PopupView {
    pub fn new(place: &Place, day: Weekday) -> Self {
        Self {
            title: place.name.clone(),
            day: day_name(day),
            deal: todays_deal(place, day).to_string(),
            map_link: clean_map_link(&place.map_uri),
            games: or_label(&place.games, "None"),
            haunted: or_label(&place.haunted, "No"),
        }
    }
}

fn or_label(value: &str, label: &str) -> String {
    let shown = if value.is_empty() { label } else { value };
    shown.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HoursRow {
    pub day: String,
    pub time: String,
    pub today: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum OpeningHoursView {
    Unavailable,
    AlwaysOpen,
    Table(Vec<HoursRow>),
}

impl OpeningHoursView {
    pub fn new(hours: Option<&OpeningHours>, today: Weekday) -> Self {
        let descriptions = match hours {
            Some(hours) if !hours.weekday_descriptions.is_empty() => &hours.weekday_descriptions,
            _ => return OpeningHoursView::Unavailable,
        };

        let rows: Vec<HoursRow> = descriptions
            .iter()
            .map(|description| {
                let (day, time) = description.split_once(':').unwrap_or((description.as_str(), ""));

                HoursRow {
                    day: day.trim().to_string(),
                    time: time.trim().to_string(),
                    today: day.trim() == day_name(today),
                }
            })
            .collect();

        if rows.iter().all(|row| row.time == ALWAYS_OPEN) {
            return OpeningHoursView::AlwaysOpen;
        }

        OpeningHoursView::Table(rows)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingView {
    pub value: String,
    pub stars: usize,
    pub reviews: u32,
}

impl RatingView {
    pub fn new(details: &PlaceDetails) -> Self {
        let (value, stars) = match details.rating {
            Some(rating) => (format!("{rating:.1}"), rating.round().clamp(0.0, 5.0) as usize),
            None => (NO_RATING.to_string(), 0),
        };

        Self {
            value,
            stars,
            reviews: details.user_rating_count.unwrap_or(0),
        }
    }
}
