use std::{env, fmt::Display, str::FromStr};

use axum::http::HeaderValue;
use tracing::{info, warn};

pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_CLIENT_ORIGIN: &str = "http://127.0.0.1:5500";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Only origin allowed through CORS.
    pub client_origin: HeaderValue,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            port: try_load("RUST_PORT", DEFAULT_PORT)?,
            client_origin: try_load("CLIENT_ORIGIN", DEFAULT_CLIENT_ORIGIN)?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("Environment misconfigured: {key}={raw} ({e})")
    })
}
