//! Error types for loading and aggregation.

use crate::models::Field;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while aggregating an in-memory dataset.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("no data to summarize")]
    EmptyInput,
    #[error("record #{index} is missing field '{field}'")]
    MissingField { index: usize, field: Field },
}

/// Failure while reading the input file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("input file {path} is not a valid dataset: {source}")]
    InputParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("input file {path} has no 'nodes' array")]
    MissingNodes { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = AggregateError::MissingField {
            index: 4,
            field: Field::Weight,
        };
        assert_eq!(err.to_string(), "record #4 is missing field 'weight'");
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InputParse {
            path: PathBuf::from("nodes.json"),
            source,
        };
        assert!(err.to_string().starts_with("input file nodes.json is not a valid dataset"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
