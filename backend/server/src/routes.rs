use std::sync::Arc;

use axum::{
    Json,
    extract::{self, Query},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    lookup::{follow_redirects, known_address},
    state::State,
};

#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    pub url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub address: String,
    pub url: String,
}

pub async fn resolve_handler(
    extract::State(state): extract::State<Arc<State>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ResolvedAddress>, AppError> {
    let (Some(short_url), Some(name)) = (present(params.url), present(params.name)) else {
        return Err(AppError::MissingParams);
    };

    info!("Received request for URL: {short_url}, Name: {name}");

    let long_url = follow_redirects(&state.client, &short_url).await?;

    let Some(address) = known_address(&name) else {
        warn!("Cannot find address for {name}");

        return Err(AppError::AddressNotFound {
            name,
            resolved_url: long_url,
        });
    };

    #[cfg(feature = "verbose")]
    info!("Found address {address} for {name}");

    Ok(Json(ResolvedAddress {
        address: address.to_string(),
        url: long_url,
    }))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
