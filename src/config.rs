use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

use crate::place::Coordinates;

pub const LA_CENTER: Coordinates = Coordinates {
    lat: 34.0522,
    lng: -118.2437,
};

#[derive(Clone, Debug)]
pub struct MapConfig {
    pub center: Coordinates,
    pub city: String,
    pub starting_zoom: u8,
    pub neighborhood_zoom: u8,
    pub focus_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LA_CENTER,
            city: "Los Angeles".to_string(),
            starting_zoom: 12,
            neighborhood_zoom: 13,
            focus_zoom: 16,
        }
    }
}

impl MapConfig {
    pub fn load() -> Self {
        let defaults = Self::default();

        let center = Coordinates::new(
            try_load("MAP_CENTER_LAT", defaults.center.lat),
            try_load("MAP_CENTER_LNG", defaults.center.lng),
        )
        .unwrap_or_else(|| {
            warn!("MAP_CENTER_LAT/MAP_CENTER_LNG out of range, using default center");
            defaults.center
        });

        Self {
            center,
            city: try_load("MAP_CITY", defaults.city),
            ..defaults
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("{key} not set, using default");
    })
}

/// Reads `key` from the environment, keeping `default` when it is unset or
/// does not parse.
pub fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = var(key) else {
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}, using default: {default}");
        default
    })
}

/// Secrets mounted under `/run/secrets`, with the environment as a fallback
/// for local runs.
pub fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .or_else(|_| var(secret_name))
        .ok()
        .filter(|secret| !secret.is_empty())
}
