//! Install orchestrator: resolve, fetch, verify, extract, infer.
//!
//! Resolves the latest version of a coordinate, builds the archive URL from
//! the resolved artefact name, downloads the archive into a temporary
//! staging file while hashing it, and only when the checksum passes unpacks
//! it into the output directory and infers the service root.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::io::Write;
use std::time::Duration;

use crate::artefact::coordinate::{ArtefactCoordinate, RepositoryLayout};
use crate::artefact::download::{ArtefactDownloader, HttpDownloader};
use crate::artefact::extraction::{ArtefactExtractor, TarGzExtractor};
use crate::artefact::fetch::{ArchiveFetcher, ProgressSink};
use crate::artefact::metadata::VersionMetadata;
use crate::artefact::naming::NamingVariantPolicy;
use crate::artefact::resolver::VersionResolver;
use crate::artefact::service_dir::{TopLevelDirectories, infer_service_dir};
use crate::artefact::verification::{ChecksumOutcome, VerificationPolicy};
use crate::error::{InstallerError, Result};
use crate::output::write_stderr_line;

/// Everything needed to install one service.
#[derive(Debug)]
pub struct InstallRequest<'a> {
    /// The artefact to install.
    pub coordinate: &'a ArtefactCoordinate,
    /// Where the repository keeps its metadata and archives.
    pub layout: &'a RepositoryLayout,
    /// Naming-variant fallback applied during resolution.
    pub naming: &'a NamingVariantPolicy,
    /// Directory the archive is unpacked into.
    pub output_dir: &'a Utf8Path,
    /// Deadline for the archive download.
    pub download_timeout: Duration,
    /// How strictly the archive is verified.
    pub verification: VerificationPolicy,
    /// Top-level directory to prefer as the service root, if present.
    pub preferred_service_dir: Option<&'a str>,
    /// When true, suppress progress output.
    pub quiet: bool,
}

/// The result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledService {
    metadata: VersionMetadata,
    version: String,
    archive_url: String,
    service_root: Utf8PathBuf,
    top_level_dirs: TopLevelDirectories,
    checksum: ChecksumOutcome,
}

impl InstalledService {
    /// The metadata the version was resolved from.
    #[must_use]
    pub fn metadata(&self) -> &VersionMetadata {
        &self.metadata
    }

    /// The installed version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The URL the archive was downloaded from.
    #[must_use]
    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    /// The inferred root directory of the extracted service.
    #[must_use]
    pub fn service_root(&self) -> &Utf8Path {
        &self.service_root
    }

    /// The top-level directories the archive contained.
    #[must_use]
    pub fn top_level_dirs(&self) -> &TopLevelDirectories {
        &self.top_level_dirs
    }

    /// Whether the archive's checksum was verified.
    #[must_use]
    pub fn checksum(&self) -> &ChecksumOutcome {
        &self.checksum
    }
}

/// Resolve the latest version of a coordinate through `downloader`.
///
/// # Errors
///
/// Returns [`InstallerError::Resolve`] when no naming variant exists.
pub fn resolve_latest(
    coordinate: &ArtefactCoordinate,
    layout: &RepositoryLayout,
    naming: &NamingVariantPolicy,
    downloader: &dyn ArtefactDownloader,
) -> Result<VersionMetadata> {
    Ok(VersionResolver::new(downloader, layout, naming).resolve_latest(coordinate)?)
}

/// Install the latest version of a service using production HTTP and
/// extraction implementations.
///
/// # Errors
///
/// See [`install_latest_with`].
pub fn install_latest(
    request: &InstallRequest<'_>,
    downloader: &HttpDownloader,
    progress: &mut dyn ProgressSink,
    stderr: &mut dyn Write,
) -> Result<InstalledService> {
    install_latest_with(request, downloader, &TarGzExtractor, progress, stderr)
}

/// Testable inner function with injected dependencies.
///
/// Nothing is written below `request.output_dir` unless the archive was
/// downloaded completely and passed verification. Files already extracted
/// when a later entry fails are left in place.
///
/// # Errors
///
/// Returns an [`InstallerError`] naming the stage that failed: resolution,
/// download or verification, output directory creation or extraction.
pub fn install_latest_with(
    request: &InstallRequest<'_>,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
    progress: &mut dyn ProgressSink,
    stderr: &mut dyn Write,
) -> Result<InstalledService> {
    // Step 1: Resolve the artefact name and version.
    if !request.quiet {
        write_stderr_line(stderr, format!("Resolving {}...", request.coordinate));
    }
    let metadata = resolve_latest(request.coordinate, request.layout, request.naming, downloader)?;
    let version = metadata.deployable_version().to_owned();
    let archive_url =
        request
            .layout
            .archive_url(request.coordinate.group(), metadata.artifact(), &version);

    // Step 2: Download into a staging file and verify.
    if !request.quiet {
        write_stderr_line(stderr, format!("Downloading {archive_url}..."));
    }
    let staging_dir = tempfile::tempdir().map_err(|source| InstallerError::StagingDir { source })?;
    let fetcher = ArchiveFetcher::new(downloader, request.download_timeout, request.verification);
    let staged = fetcher.fetch(&archive_url, staging_dir.path(), progress)?;
    let checksum = staged.session().outcome().clone();

    // Step 3: Extract into the output directory.
    std::fs::create_dir_all(request.output_dir).map_err(|source| InstallerError::OutputDir {
        path: request.output_dir.to_owned(),
        source,
    })?;
    if !request.quiet {
        write_stderr_line(stderr, format!("Extracting to {}...", request.output_dir));
    }
    let top_level_dirs = extractor
        .extract(staged.path(), request.output_dir.as_std_path())
        .map_err(|source| InstallerError::Extraction {
            output_dir: request.output_dir.to_owned(),
            source,
        })?;

    // Step 4: Work out where the service landed.
    let service_root = infer_service_dir(
        &top_level_dirs,
        request.output_dir,
        request.preferred_service_dir,
    );
    info!(
        "installed {} {version} at {service_root}",
        metadata.artifact()
    );

    Ok(InstalledService {
        metadata,
        version,
        archive_url,
        service_root,
        top_level_dirs,
        checksum,
    })
}

#[cfg(test)]
#[path = "install_flow_tests.rs"]
mod tests;
