//! HTTP transport for repository metadata and service archives.
//!
//! Provides a trait-based abstraction over the repository so that the
//! resolver and the install flow can be exercised without network access,
//! and a `ureq` implementation that sends the identifying `User-Agent`,
//! applies deadlines and surfaces declared checksums.

use super::metadata::VersionMetadata;
use super::metadata_parser::{MetadataParseError, parse_metadata};
use super::verification::{ExpectedChecksum, MD5_HEADER, SHA256_HEADER};
use std::fmt;
use std::io::{self, BufReader, Read};
use std::sync::OnceLock;
use std::time::Duration;

/// Name reported in the `User-Agent` header.
pub const TOOL_NAME: &str = "sm2-installer";

/// Deadline for archive downloads when the caller does not supply one.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Deadline for metadata requests.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for talking to the artefact repository.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::download::HttpDownloader;
///
/// let downloader = HttpDownloader::default();
/// // Use downloader.fetch_metadata(url) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download and parse the version metadata document at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the document cannot be parsed.
    fn fetch_metadata(&self, url: &str) -> Result<VersionMetadata, DownloadError>;

    /// Start downloading the archive at `url`, bounded by `timeout`.
    ///
    /// The deadline covers the whole exchange, including reading the
    /// returned body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out, or the server
    /// answers with a non-success status.
    fn fetch_archive(&self, url: &str, timeout: Duration)
    -> Result<ArchiveResponse, DownloadError>;
}

/// Errors arising from repository requests.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The request could not be constructed, e.g. the URL is invalid.
    #[error("invalid request for {url}: {reason}")]
    RequestBuild {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// A transport-level failure: DNS, connection, TLS or protocol.
    #[error("network error for {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("http GET {url} failed with status {status}, expected 200")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The deadline elapsed before the exchange completed.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// The URL that was requested.
        url: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The metadata document could not be parsed.
    #[error("invalid metadata at {url}")]
    Metadata {
        /// The URL the document was read from.
        url: String,
        /// The underlying parse failure.
        #[source]
        source: MetadataParseError,
    },
}

impl DownloadError {
    /// Map an I/O error raised while reading a response body.
    #[must_use]
    pub fn from_body_error(url: &str, timeout: Duration, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::TimedOut {
            Self::Timeout {
                url: url.to_owned(),
                timeout,
            }
        } else {
            Self::Network {
                url: url.to_owned(),
                reason: err.to_string(),
            }
        }
    }
}

/// An in-flight archive download.
///
/// The body has not been read yet; the caller streams it exactly once.
pub struct ArchiveResponse {
    body: Box<dyn Read>,
    content_length: Option<u64>,
    expected_checksum: Option<ExpectedChecksum>,
}

impl ArchiveResponse {
    /// Wrap a response body with its declared length and checksum.
    pub fn new(
        body: impl Read + 'static,
        content_length: Option<u64>,
        expected_checksum: Option<ExpectedChecksum>,
    ) -> Self {
        Self {
            body: Box::new(body),
            content_length,
            expected_checksum,
        }
    }

    /// The length declared by the server, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The checksum declared by the server, if any.
    #[must_use]
    pub fn expected_checksum(&self) -> Option<&ExpectedChecksum> {
        self.expected_checksum.as_ref()
    }

    /// Split the response into its body and declared checksum.
    #[must_use]
    pub fn into_parts(self) -> (Box<dyn Read>, Option<u64>, Option<ExpectedChecksum>) {
        (self.body, self.content_length, self.expected_checksum)
    }
}

impl fmt::Debug for ArchiveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveResponse")
            .field("content_length", &self.content_length)
            .field("expected_checksum", &self.expected_checksum)
            .finish_non_exhaustive()
    }
}

/// Identifying client string: tool name, version, OS and architecture.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::download::user_agent;
///
/// assert!(user_agent().starts_with("sm2-installer/"));
/// ```
#[must_use]
pub fn user_agent() -> &'static str {
    static USER_AGENT: OnceLock<String> = OnceLock::new();
    USER_AGENT.get_or_init(|| {
        format!(
            "{TOOL_NAME}/{} ({} {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    })
}

/// HTTP-based downloader using `ureq`.
///
/// The agent is cheap to clone and may be shared between independent
/// resolve and fetch calls.
#[derive(Clone)]
pub struct HttpDownloader {
    agent: ureq::Agent,
    metadata_timeout: Duration,
}

impl fmt::Debug for HttpDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDownloader")
            .field("metadata_timeout", &self.metadata_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpDownloader {
    /// Create a downloader whose metadata requests use `metadata_timeout`.
    #[must_use]
    pub fn new(metadata_timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(metadata_timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            metadata_timeout,
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_TIMEOUT)
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn fetch_metadata(&self, url: &str) -> Result<VersionMetadata, DownloadError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", user_agent())
            .call()
            .map_err(|e| map_ureq_error(url, self.metadata_timeout, &e))?;
        let reader = BufReader::new(response.into_body().into_reader());
        parse_metadata(reader).map_err(|source| DownloadError::Metadata {
            url: url.to_owned(),
            source,
        })
    }

    fn fetch_archive(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ArchiveResponse, DownloadError> {
        let response = self
            .agent
            .get(url)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .header("User-Agent", user_agent())
            .call()
            .map_err(|e| map_ureq_error(url, timeout, &e))?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        let sha256 = header(SHA256_HEADER);
        let md5 = header(MD5_HEADER);
        let expected = ExpectedChecksum::from_declared(sha256.as_deref(), md5.as_deref());
        let content_length = response.body().content_length();

        Ok(ArchiveResponse::new(
            response.into_body().into_reader(),
            content_length,
            expected,
        ))
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, timeout: Duration, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => DownloadError::HttpStatus {
            url: url.to_owned(),
            status: *status,
        },
        ureq::Error::Timeout(_) => DownloadError::Timeout {
            url: url.to_owned(),
            timeout,
        },
        ureq::Error::Io(io_err) => DownloadError::from_body_error(url, timeout, io_err),
        ureq::Error::BadUri(reason) => DownloadError::RequestBuild {
            url: url.to_owned(),
            reason: reason.clone(),
        },
        ureq::Error::Http(http_err) => DownloadError::RequestBuild {
            url: url.to_owned(),
            reason: http_err.to_string(),
        },
        other => DownloadError::Network {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
