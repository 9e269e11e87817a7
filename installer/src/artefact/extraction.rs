//! Archive extraction for service artefacts.
//!
//! Unpacks gzip-compressed tar archives into an output directory entry by
//! entry, recreating directories with fixed permissions and restoring each
//! file's recorded mode. Entries that would escape the output directory are
//! rejected. The first directory segment of every file written is recorded
//! in [`TopLevelDirectories`] so the caller can infer the service root.

use super::service_dir::TopLevelDirectories;
use flate2::read::MultiGzDecoder;
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Permission bits applied to every directory created during extraction.
pub const DIRECTORY_MODE: u32 = 0o755;

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::extraction::{ArtefactExtractor, TarGzExtractor};
///
/// let extractor: &dyn ArtefactExtractor = &TarGzExtractor;
/// // Use extractor.extract(archive_path, output_dir) in production
/// # let _ = extractor;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `output_dir`.
    ///
    /// Returns the top-level directories that received files.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape `output_dir`, [`ExtractionError::Archive`] if the archive
    /// cannot be decoded and [`ExtractionError::Io`] if writing fails.
    fn extract(
        &self,
        archive_path: &Path,
        output_dir: &Path,
    ) -> Result<TopLevelDirectories, ExtractionError>;
}

/// Errors arising from archive extraction.
///
/// Files already written are left in place; cleaning up a partially
/// extracted directory is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The archive could not be read or decoded.
    #[error("failed to read archive: {0}")]
    Archive(#[source] io::Error),

    /// A directory or file could not be created or written.
    #[error("failed to write {path}")]
    Io {
        /// The filesystem path being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },
}

impl ExtractionError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Default extractor for `.tgz` archives using the `flate2` and `tar`
/// crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzExtractor;

impl ArtefactExtractor for TarGzExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        output_dir: &Path,
    ) -> Result<TopLevelDirectories, ExtractionError> {
        let file = File::open(archive_path).map_err(ExtractionError::Archive)?;
        unpack_entries(BufReader::new(file), output_dir)
    }
}

/// Unpack a gzip-compressed tar stream into `output_dir`.
///
/// Every gzip member of the stream is decoded, so archives written as
/// concatenated members unpack in full.
///
/// Directory entries are created with [`DIRECTORY_MODE`]; regular files
/// replace any existing file at their path and receive the entry's mode.
/// Other entry kinds are skipped. Re-extracting the same archive over its
/// own output yields the same tree.
///
/// # Errors
///
/// See [`ArtefactExtractor::extract`].
pub fn unpack_entries<R: Read>(
    reader: R,
    output_dir: &Path,
) -> Result<TopLevelDirectories, ExtractionError> {
    let mut archive = tar::Archive::new(MultiGzDecoder::new(reader));
    let mut dirs = TopLevelDirectories::new();

    for entry_result in archive.entries().map_err(ExtractionError::Archive)? {
        let mut entry = entry_result.map_err(ExtractionError::Archive)?;
        let entry_path = entry.path().map_err(ExtractionError::Archive)?.into_owned();

        validate_entry_path(&entry_path)?;

        let target = output_dir.join(&entry_path);
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            create_dir(&target)?;
        } else if kind.is_file() {
            let mode = entry.header().mode().map_err(ExtractionError::Archive)?;
            write_file(&mut entry, &target, mode)?;
            dirs.record(&entry_path);
        } else {
            debug!("skipping {kind:?} entry {}", entry_path.display());
        }
    }

    Ok(dirs)
}

fn create_dir(path: &Path) -> Result<(), ExtractionError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIRECTORY_MODE);
    }
    builder
        .create(path)
        .map_err(|source| ExtractionError::io(path, source))
}

fn write_file(contents: &mut impl Read, target: &Path, mode: u32) -> Result<(), ExtractionError> {
    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }

    match fs::remove_file(target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(ExtractionError::io(target, source)),
    }

    let mut file = File::create(target).map_err(|source| ExtractionError::io(target, source))?;
    io::copy(contents, &mut file).map_err(|source| ExtractionError::io(target, source))?;
    set_mode(target, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ExtractionError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|source| ExtractionError::io(path, source))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ExtractionError> {
    Ok(())
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::RootDir));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
