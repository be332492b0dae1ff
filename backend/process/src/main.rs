use std::{path::PathBuf, time::Duration};

use clap::Parser;
use happyhour::{
    config::{MapConfig, read_secret, try_load},
    geocode::{Geocoder, PLACES_BASE_URL, PlacesClient},
    loader::{BANNER_CSV_PATH, MAIN_CSV_PATH, source_chain},
};
use process::Options;
use reqwest::Client;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Deals CSV with a header row, path or URL
    #[arg(default_value = MAIN_CSV_PATH)]
    csv: String,

    /// Spreadsheet export tried when the deals CSV is unusable
    #[arg(long, default_value = BANNER_CSV_PATH)]
    banner: String,

    /// Where the coordinate snapshot is written
    #[arg(long, default_value = process::SNAPSHOT_PATH)]
    snapshot: PathBuf,

    /// Pause between provider calls
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,

    /// City appended to name-only queries
    #[arg(long)]
    city: Option<String>,

    /// Ignore coordinates already in the snapshot file
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let client = Client::new();
    let city = args.city.unwrap_or_else(|| MapConfig::load().city);

    let geocoder = match read_secret("PLACES_API_KEY") {
        Some(api_key) => {
            let base_url = try_load("PLACES_BASE_URL", PLACES_BASE_URL.to_string());
            Some(Geocoder::new(PlacesClient::new(client.clone(), &base_url, &api_key), &city))
        }
        None => {
            warn!("PLACES_API_KEY not set, only coordinates already in the sheet are kept");
            None
        }
    };

    let options = Options {
        sources: source_chain(&args.csv, &args.banner),
        snapshot: args.snapshot,
        delay: Duration::from_millis(args.delay_ms),
        fresh: args.fresh,
    };

    process::freeze_coordinates(&client, &options, geocoder).await?;
    Ok(())
}
