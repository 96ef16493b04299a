use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// A named point of interest. `longitude` drifts every frame while the
/// globe turns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch locations: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed locations list: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_locations(json: &str) -> Result<Vec<Location>, LoadError> {
    Ok(serde_json::from_str(json)?)
}

/// Load the locations list from a file path or an http(s) URL.
pub async fn load_locations(source: &str) -> Result<Vec<Location>, LoadError> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|source_err| LoadError::Io {
                path: PathBuf::from(source),
                source: source_err,
            })?
    };
    let locations = parse_locations(&body)?;
    tracing::info!(count = locations.len(), source, "loaded locations");
    Ok(locations)
}
