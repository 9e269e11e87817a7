//! Error types for the service installer.
//!
//! [`InstallerError`] gathers the failures of every stage of an install so
//! callers can match on the stage that failed, and the binary can report a
//! single message with its source chain.

use crate::artefact::error::ArtefactError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::fetch::FetchError;
use crate::artefact::resolver::ResolveError;
use crate::config::ConfigError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or installing a service.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The requested coordinate is malformed.
    #[error(transparent)]
    InvalidCoordinate(#[from] ArtefactError),

    /// Configuration could not be loaded or is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No naming variant of the artefact exists in the repository.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The archive could not be downloaded or failed verification.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The archive could not be unpacked.
    #[error("extraction into {output_dir} failed: {source}")]
    Extraction {
        /// The directory being extracted into.
        output_dir: Utf8PathBuf,
        /// The underlying extraction error.
        #[source]
        source: ExtractionError,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {path}")]
    OutputDir {
        /// The output directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A temporary staging directory could not be created.
    #[error("failed to create a staging directory")]
    StagingDir {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::verification::ChecksumAlgorithm;

    #[test]
    fn resolve_error_names_requested_artefact() {
        let err = InstallerError::from(ResolveError::NotFound {
            group: "uk.gov.hmrc".to_owned(),
            artifact: "auth_2.12".to_owned(),
            tried: vec!["auth_3".to_owned()],
        });
        let msg = err.to_string();
        assert!(msg.contains("uk.gov.hmrc:auth_2.12"));
        assert!(msg.contains("auth_3"));
    }

    #[test]
    fn checksum_mismatch_includes_both_digests() {
        let err = InstallerError::from(FetchError::ChecksumMismatch {
            url: "https://repo.test/a.tgz".to_owned(),
            algorithm: ChecksumAlgorithm::Md5,
            expected: "aaaa".to_owned(),
            actual: "bbbb".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("aaaa"));
        assert!(msg.contains("bbbb"));
        assert!(msg.contains("md5"));
    }

    #[test]
    fn output_dir_error_preserves_source() {
        let err = InstallerError::OutputDir {
            path: Utf8PathBuf::from("/srv/auth"),
            source: std::io::Error::other("permission denied"),
        };
        assert!(err.to_string().contains("/srv/auth"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn extraction_error_names_output_dir() {
        let err = InstallerError::Extraction {
            output_dir: Utf8PathBuf::from("/srv/auth"),
            source: ExtractionError::PathTraversal {
                path: "../etc/passwd".to_owned(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("/srv/auth"));
        assert!(msg.contains("../etc/passwd"));
    }
}
