//! Streaming archive download with progress and checksum taps.
//!
//! The response body flows through two non-buffering readers chained in
//! series, a [`ProgressTap`] reporting bytes read against the declared
//! length and a [`ChecksumTap`] feeding every byte into an incremental
//! digest, and is written to a temporary staging file. The digest is
//! compared with the server's declared checksum once the body is fully
//! consumed, so a corrupted download is rejected before a single file is
//! extracted.

use super::download::{ArchiveResponse, ArtefactDownloader, DownloadError};
use super::verification::{
    ChecksumAlgorithm, ChecksumOutcome, Checksummer, ExpectedChecksum, VerificationPolicy,
};
use log::{debug, warn};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Size of the buffer used to move bytes from the network to disk.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Receives download progress after every read.
///
/// Implemented for closures so callers can plug in a progress bar or a
/// counter without a dedicated type.
pub trait ProgressSink {
    /// Report `bytes_read` so far out of the declared `content_length`.
    fn update(&mut self, bytes_read: u64, content_length: Option<u64>);
}

impl<F: FnMut(u64, Option<u64>)> ProgressSink for F {
    fn update(&mut self, bytes_read: u64, content_length: Option<u64>) {
        self(bytes_read, content_length);
    }
}

/// A sink that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _bytes_read: u64, _content_length: Option<u64>) {}
}

/// Reader adaptor that counts bytes and reports them to a [`ProgressSink`].
pub struct ProgressTap<'s, R> {
    inner: R,
    bytes_read: u64,
    content_length: Option<u64>,
    sink: &'s mut dyn ProgressSink,
}

impl<'s, R: Read> ProgressTap<'s, R> {
    /// Wrap `inner`, reporting against the declared `content_length`.
    pub fn new(inner: R, content_length: Option<u64>, sink: &'s mut dyn ProgressSink) -> Self {
        Self {
            inner,
            bytes_read: 0,
            content_length,
            sink,
        }
    }

    /// Bytes read through the tap so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressTap<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.bytes_read += read as u64;
        self.sink.update(self.bytes_read, self.content_length);
        Ok(read)
    }
}

/// Reader adaptor that feeds every byte into an incremental digest.
pub struct ChecksumTap<R> {
    inner: R,
    checksummer: Checksummer,
}

impl<R: Read> ChecksumTap<R> {
    /// Wrap `inner`, hashing with `checksummer`.
    pub fn new(inner: R, checksummer: Checksummer) -> Self {
        Self { inner, checksummer }
    }

    /// Return the wrapped reader and the digest state.
    pub fn into_parts(self) -> (R, Checksummer) {
        (self.inner, self.checksummer)
    }
}

impl<R: Read> Read for ChecksumTap<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.checksummer.update(&buf[..read]);
        Ok(read)
    }
}

/// Errors arising while fetching and staging an archive.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request or the body transfer failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The computed digest differs from the declared one.
    #[error("{algorithm} did not match for {url}, {actual} != {expected}")]
    ChecksumMismatch {
        /// The archive URL.
        url: String,
        /// The digest algorithm compared.
        algorithm: ChecksumAlgorithm,
        /// The digest declared by the server.
        expected: String,
        /// The digest of the bytes actually received.
        actual: String,
    },

    /// The policy requires a checksum but the server declared none.
    #[error("{url} was served without a checksum header")]
    MissingChecksum {
        /// The archive URL.
        url: String,
    },

    /// The body ended before the declared content length was reached.
    #[error("download of {url} ended after {received} of {expected} bytes")]
    Truncated {
        /// The archive URL.
        url: String,
        /// The declared content length.
        expected: u64,
        /// The bytes actually received.
        received: u64,
    },

    /// The staging file could not be created or written.
    #[error("failed to stage download at {path}")]
    Staging {
        /// The staging file or directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Per-call record of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSession {
    content_length: Option<u64>,
    bytes_read: u64,
    outcome: ChecksumOutcome,
}

impl DownloadSession {
    /// The length declared by the server, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The number of bytes received.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether, and how, the payload was verified.
    #[must_use]
    pub fn outcome(&self) -> &ChecksumOutcome {
        &self.outcome
    }
}

/// A fully downloaded archive held in a temporary file.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct StagedArchive {
    file: NamedTempFile,
    session: DownloadSession,
}

impl StagedArchive {
    /// Path of the staged archive.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The record of the download that produced this archive.
    #[must_use]
    pub fn session(&self) -> &DownloadSession {
        &self.session
    }
}

/// Fetches archives through an [`ArtefactDownloader`] into staging files.
pub struct ArchiveFetcher<'a> {
    downloader: &'a dyn ArtefactDownloader,
    timeout: Duration,
    policy: VerificationPolicy,
}

impl<'a> ArchiveFetcher<'a> {
    /// Create a fetcher applying `timeout` to each download.
    #[must_use]
    pub fn new(
        downloader: &'a dyn ArtefactDownloader,
        timeout: Duration,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            downloader,
            timeout,
            policy,
        }
    }

    /// Download `url` into a temporary file under `staging_dir` and verify
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails or times out, the
    /// staging file cannot be written, or the payload fails verification.
    pub fn fetch(
        &self,
        url: &str,
        staging_dir: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<StagedArchive, FetchError> {
        let response = self.downloader.fetch_archive(url, self.timeout)?;
        stage_archive(
            &StageRequest {
                url,
                timeout: self.timeout,
                policy: self.policy,
                staging_dir,
            },
            response,
            sink,
        )
    }
}

/// Inputs to [`stage_archive`] besides the response itself.
#[derive(Debug, Clone, Copy)]
pub struct StageRequest<'a> {
    /// The archive URL, for error reporting.
    pub url: &'a str,
    /// The deadline the response was requested with, for error reporting.
    pub timeout: Duration,
    /// The verification policy to enforce.
    pub policy: VerificationPolicy,
    /// Directory that receives the temporary file.
    pub staging_dir: &'a Path,
}

/// Stream `response` through the progress and checksum taps into a staging
/// file, then verify it.
///
/// # Errors
///
/// See [`ArchiveFetcher::fetch`].
pub fn stage_archive(
    request: &StageRequest<'_>,
    response: ArchiveResponse,
    sink: &mut dyn ProgressSink,
) -> Result<StagedArchive, FetchError> {
    let url = request.url;
    let (body, content_length, expected) = response.into_parts();

    if expected.is_none() && request.policy.require_checksum() {
        return Err(FetchError::MissingChecksum {
            url: url.to_owned(),
        });
    }

    let mut file =
        NamedTempFile::new_in(request.staging_dir).map_err(|source| FetchError::Staging {
            path: request.staging_dir.to_path_buf(),
            source,
        })?;

    let algorithm = expected
        .as_ref()
        .map_or(ChecksumAlgorithm::Md5, ExpectedChecksum::algorithm);
    let progress = ProgressTap::new(body, content_length, sink);
    let mut tapped = ChecksumTap::new(progress, Checksummer::new(algorithm));

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match tapped.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DownloadError::from_body_error(url, request.timeout, &e).into()),
        };
        file.write_all(&buffer[..read])
            .map_err(|source| FetchError::Staging {
                path: file.path().to_path_buf(),
                source,
            })?;
    }
    file.flush().map_err(|source| FetchError::Staging {
        path: file.path().to_path_buf(),
        source,
    })?;

    let (progress, checksummer) = tapped.into_parts();
    let bytes_read = progress.bytes_read();
    if let Some(declared) = content_length.filter(|&declared| declared > bytes_read) {
        return Err(FetchError::Truncated {
            url: url.to_owned(),
            expected: declared,
            received: bytes_read,
        });
    }

    let outcome = verify(url, expected.as_ref(), checksummer)?;
    debug!("staged {bytes_read} bytes from {url} at {}", file.path().display());

    Ok(StagedArchive {
        file,
        session: DownloadSession {
            content_length,
            bytes_read,
            outcome,
        },
    })
}

fn verify(
    url: &str,
    expected: Option<&ExpectedChecksum>,
    checksummer: Checksummer,
) -> Result<ChecksumOutcome, FetchError> {
    let algorithm = checksummer.algorithm();
    let actual = checksummer.finalize_hex();
    match expected {
        Some(declared) if declared.matches(&actual) => Ok(ChecksumOutcome::Verified {
            algorithm,
            digest: actual,
        }),
        Some(declared) => Err(FetchError::ChecksumMismatch {
            url: url.to_owned(),
            algorithm,
            expected: declared.hex().to_owned(),
            actual,
        }),
        None => {
            warn!("{url} declared no checksum; {algorithm} {actual} is unverified");
            Ok(ChecksumOutcome::Unverified {
                algorithm,
                digest: actual,
            })
        }
    }
}
