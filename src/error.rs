// 🚨 Error Taxonomy
// Validation failures are user-correctable; unknown codes are defects; export failures are I/O.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A single rejected input
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// ValidationError - every failed input of one submission
///
/// `context` names the form/variant that was submitted (e.g. "Scope 1 / Fuel").
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub context: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(context: impl Into<String>) -> Self {
        ValidationError {
            context: context.into(),
            errors: Vec::new(),
        }
    }

    /// Shortcut for a submission with exactly one bad input
    pub fn single(context: impl Into<String>, field: &str, message: impl Into<String>) -> Self {
        let mut err = ValidationError::new(context);
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Ok when nothing was pushed, the error itself otherwise
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}] {}", self.context, details.join("; "))
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ENGINE ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("unknown activity code: {code}")]
    UnknownActivity { code: String },

    #[error("export failed ({target}): {source}")]
    Export {
        target: String,
        #[source]
        source: ExportFailure,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed activity row {row}: {source}")]
    MalformedRow {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Underlying cause of an export failure
#[derive(Debug, Error)]
pub enum ExportFailure {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn export(target: impl Into<String>, source: impl Into<ExportFailure>) -> Self {
        EngineError::Export {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_unknown_activity(&self) -> bool {
        matches!(self, EngineError::UnknownActivity { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, EngineError::Config(_))
    }

    /// The field-level details when this is a validation failure
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            EngineError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
