use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: StatusCode },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error("No valid rows in {0}")]
    Empty(String),
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned HTTP {0}")]
    Status(StatusCode),

    #[error("No results for {0}")]
    NoResults(String),

    #[error("Malformed provider response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot writer failed: {0}")]
    Flush(String),
}
