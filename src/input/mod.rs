use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::landmark::UnknownLandmark;

pub mod bundle;
pub mod ground_truth;
pub mod predictions;
pub mod reader;

pub use bundle::load_metrics_bundle;
pub use ground_truth::{GroundTruth, load_ground_truth};
pub use predictions::{Predictions, discover_team_predictions, load_predictions};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {source}")]
    UnknownClass {
        context: String,
        #[source]
        source: UnknownLandmark,
    },
    #[error("invalid row in {} at line {line}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl InputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
