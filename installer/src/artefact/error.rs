//! Error types for artefact coordinates and naming policies.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// A coordinate component is empty or contains only whitespace.
    #[error("artefact {field} must not be empty")]
    EmptyField {
        /// The name of the rejected component (`group`, `artifact`, ...).
        field: &'static str,
    },

    /// A coordinate component contains a path separator or traversal.
    #[error("artefact {field} \"{value}\" contains an illegal path segment")]
    IllegalPathSegment {
        /// The name of the rejected component.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A naming-variant pattern failed to compile.
    #[error("invalid naming variant pattern \"{pattern}\": {reason}")]
    InvalidVariantPattern {
        /// The rejected regular expression.
        pattern: String,
        /// Description of the compilation failure.
        reason: String,
    },

    /// A naming-variant policy was configured without candidates.
    #[error("naming variant policy requires at least one candidate suffix")]
    NoVariantCandidates,
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
