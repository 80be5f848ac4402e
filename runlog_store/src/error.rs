use thiserror::Error;

use crate::filename::FilenameError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The caller handed over an item without its partition key.
    #[error("item has no string {0}")]
    MissingKey(String),

    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn storage<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        StoreError::Storage {
            operation,
            source: source.into(),
        }
    }
}

/// Failure of one ingest or enrichment step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] FilenameError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage fault: {0}")]
    Storage(#[source] StoreError),

    #[error("cannot render map: {0}")]
    Render(String),

    #[error("invalid item: {0}")]
    InvalidItem(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => PipelineError::NotFound(what),
            StoreError::MissingKey(key) => PipelineError::InvalidItem(format!("no string {}", key)),
            other => PipelineError::Storage(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),
}
