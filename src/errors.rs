use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemoError {
    /// The classifier artifact is missing, unreadable or malformed.
    #[error("failed to load classifier artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },
    /// A feature row does not match the layout the pipeline was trained on.
    #[error("feature row does not match model schema: {0}")]
    SchemaMismatch(String),
    #[error("classifier returned a probability outside [0, 1]: {0}")]
    InvalidProbability(f64),
    #[error("random source unavailable: {0}")]
    RandomSource(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DemoError>;
