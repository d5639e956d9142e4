//! Dataset loading.
//!
//! Reads the user-selected JSON file and extracts its `nodes` array.
//! Loading always completes before any aggregation starts.

use crate::error::LoadError;
use crate::models::{Dataset, Record};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct NodesDocument {
    #[serde(default)]
    nodes: Option<Vec<Record>>,
}

/// Read and parse a dataset file.
pub async fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    debug!("Reading dataset from {}", path.display());

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let dataset = parse_dataset(&content, path)?;
    info!("Loaded {} records from {}", dataset.len(), path.display());

    Ok(dataset)
}

/// Parse the `{ "nodes": [...] }` document.
pub fn parse_dataset(content: &str, path: &Path) -> Result<Dataset, LoadError> {
    let document: NodesDocument =
        serde_json::from_str(content).map_err(|source| LoadError::InputParse {
            path: path.to_path_buf(),
            source,
        })?;

    document.nodes.ok_or_else(|| LoadError::MissingNodes {
        path: path.to_path_buf(),
    })
}
