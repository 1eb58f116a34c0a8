//! Error handling for the Estimo pipeline engine
//!
//! Ordering errors reject a whole run before any stage executes. Unknown
//! stages and stage execution failures are recorded per stage and never stop
//! the remaining stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A submitted sequence violates a stage's position constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OrderingError {
    #[error("stage '{code}' cannot be the first stage")]
    NotFirstEligible { code: String },

    #[error("stage '{code}' at position {position} requires '{required}' earlier in the sequence")]
    MissingPredecessor { code: String, required: String, position: usize },
}

impl OrderingError {
    pub fn stage_code(&self) -> &str {
        match self {
            OrderingError::NotFirstEligible { code }
            | OrderingError::MissingPredecessor { code, .. } => code,
        }
    }
}

/// Error raised while running a pipeline for one target item.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error("unknown stage '{code}'")]
    UnknownStage { code: String },

    #[error("stage '{code}' failed: {message}")]
    StageExecution { code: String, message: String },
}

impl PipelineError {
    pub fn kind(&self) -> StageErrorKind {
        match self {
            PipelineError::Ordering(_) => StageErrorKind::Ordering,
            PipelineError::UnknownStage { .. } => StageErrorKind::UnknownStage,
            PipelineError::StageExecution { .. } => StageErrorKind::StageExecution,
        }
    }

    pub fn stage_code(&self) -> &str {
        match self {
            PipelineError::Ordering(err) => err.stage_code(),
            PipelineError::UnknownStage { code } | PipelineError::StageExecution { code, .. } => code,
        }
    }
}

/// Category of a recorded error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    Ordering,
    UnknownStage,
    StageExecution,
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageErrorKind::Ordering => write!(f, "ORDERING"),
            StageErrorKind::UnknownStage => write!(f, "UNKNOWN_STAGE"),
            StageErrorKind::StageExecution => write!(f, "STAGE_EXECUTION"),
        }
    }
}

/// An error as it appears in a pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageErrorRecord {
    pub stage_code: Option<String>,
    pub kind: StageErrorKind,
    pub message: String,
}

impl From<&PipelineError> for StageErrorRecord {
    fn from(err: &PipelineError) -> Self {
        Self {
            stage_code: Some(err.stage_code().to_string()),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Failures of the catalog collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("target '{target_id}' not found")]
    NotFound { target_id: String },

    #[error("catalog storage error: {message}")]
    Storage { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
