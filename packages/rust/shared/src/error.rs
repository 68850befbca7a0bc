//! Error types for ContentAgent.
//!
//! Library crates use [`ContentAgentError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Stage;

/// Top-level error type for all ContentAgent operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentAgentError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The response contained no opening `{` / `[` to anchor a payload on.
    #[error("no structural delimiter found in response")]
    NoStructuralDelimiter,

    /// Every repair pass was applied and the payload still failed to decode.
    #[error("unrecoverable decode error: {0}")]
    UnrecoverableDecode(Box<DecodeDiagnostics>),

    /// The decoded value is missing a required top-level field.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// The decoded value has the wrong structural kind or element count.
    #[error("unexpected shape: {message}")]
    UnexpectedShape { message: String },

    /// The text-generation call failed or returned nothing usable.
    #[error("gateway failure: {0}")]
    GatewayFailure(String),

    /// An input artifact from an earlier stage does not exist yet.
    #[error("prior artifact missing at {path:?}: {hint}")]
    PriorArtifactMissing { path: PathBuf, hint: String },

    /// Operator selected something that does not exist (e.g. calendar index).
    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON (de)serialization of an artifact failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentAgentError>;

impl ContentAgentError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a shape error from any displayable message.
    pub fn unexpected_shape(msg: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            message: msg.into(),
        }
    }

    /// Create a selection error from any displayable message.
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: msg.into(),
        }
    }

    /// Create a gateway error from any displayable message.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::GatewayFailure(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable snake_case name of the failure kind, used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::NoStructuralDelimiter => "no_structural_delimiter",
            Self::UnrecoverableDecode(_) => "unrecoverable_decode_error",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::UnexpectedShape { .. } => "unexpected_shape",
            Self::GatewayFailure(_) => "gateway_failure",
            Self::PriorArtifactMissing { .. } => "prior_artifact_missing",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::Io { .. } => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Decode diagnostics, when this is an [`ContentAgentError::UnrecoverableDecode`].
    pub fn diagnostics(&self) -> Option<&DecodeDiagnostics> {
        match self {
            Self::UnrecoverableDecode(diag) => Some(diag),
            _ => None,
        }
    }

    /// Tag this error with the pipeline stage it happened in.
    pub fn at(self, stage: Stage) -> StageError {
        StageError {
            stage,
            source: self,
        }
    }
}

impl From<serde_json::Error> for ContentAgentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Decode diagnostics
// ---------------------------------------------------------------------------

/// What the recovery parser knows about its last failed decode attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeDiagnostics {
    /// Decoder error message from the final attempt.
    pub message: String,
    /// 1-based line reported by the decoder.
    pub line: usize,
    /// 1-based column reported by the decoder.
    pub column: usize,
    /// Byte offset into the repaired text.
    pub offset: usize,
    /// Up to 50 characters either side of `offset`.
    pub context: String,
    /// Length in bytes of the raw backend response.
    pub raw_len: usize,
}

impl fmt::Display for DecodeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, column {}, raw length {}) near `{}`",
            self.message, self.line, self.column, self.raw_len, self.context
        )
    }
}

// ---------------------------------------------------------------------------
// StageError
// ---------------------------------------------------------------------------

/// A [`ContentAgentError`] tagged with the pipeline stage that failed.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: ContentAgentError,
}
