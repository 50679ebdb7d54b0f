//! Error types shared by every pipeline stage.

use thiserror::Error;

/// Failures that stop the pipeline.
///
/// Row-level problems (missing coordinates, out-of-range values, terminated
/// postcodes) never show up here; they are filtered or counted instead.
#[derive(Debug, Error)]
pub enum AirlockError {
    /// A required column is absent from an input table
    #[error("{dataset} dataset missing required columns: {missing:?}")]
    Schema {
        dataset: String,
        missing: Vec<String>,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("coordinate transform failed: {0}")]
    Transform(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AirlockError {
    pub fn schema(dataset: impl Into<String>, missing: Vec<String>) -> Self {
        AirlockError::Schema {
            dataset: dataset.into(),
            missing,
        }
    }
}

pub type Result<T> = std::result::Result<T, AirlockError>;
