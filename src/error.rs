//! Error types for armory operations.
//!
//! This module defines [`ArmoryError`], the error type used across the crate,
//! and a [`Result`] alias.
//!
//! # Propagation
//!
//! Step-level problems ([`ArmoryError::PreconditionUnknown`],
//! [`ArmoryError::ActionFailed`], [`ArmoryError::UnknownStep`]) are folded
//! into a [`StepResult`](crate::steps::StepResult) by the runner and never
//! escape a batch. Only [`ArmoryError::FatalEnvironment`] aborts a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for armory operations.
#[derive(Debug, Error)]
pub enum ArmoryError {
    /// Catalog file not found at the expected location.
    #[error("Catalog not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a catalog file.
    #[error("Failed to parse catalog at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Catalog structure or values are invalid.
    #[error("Invalid catalog: {message}")]
    ConfigValidationError { message: String },

    /// Two steps were registered under the same id.
    #[error("Duplicate step id '{id}' in catalog")]
    DuplicateStep { id: String },

    /// Two steps claim the same menu key.
    #[error("Menu key '{key}' is used by both '{first}' and '{second}'")]
    DuplicateKey {
        key: char,
        first: String,
        second: String,
    },

    /// Requested step id is not in the catalog.
    #[error("Unknown step: {id}")]
    UnknownStep { id: String },

    /// A probe could not decide whether its target is present.
    #[error("Could not evaluate precondition '{probe}': {message}")]
    PreconditionUnknown { probe: String, message: String },

    /// An action ran and exited non-zero.
    #[error(
        "Action for '{step}' failed{}",
        .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default()
    )]
    ActionFailed { step: String, code: Option<i32> },

    /// The environment can no longer support provisioning (privilege lost,
    /// interrupted, shell unavailable). Aborts the remaining batch.
    #[error("Fatal environment error: {message}")]
    FatalEnvironment { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArmoryError {
    /// Whether this error must abort the batch it occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArmoryError::FatalEnvironment { .. })
    }
}

/// Result type alias for armory operations.
pub type Result<T> = std::result::Result<T, ArmoryError>;
