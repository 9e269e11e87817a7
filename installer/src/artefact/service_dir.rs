//! Service-root inference from the directories an extraction produced.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// First path segments observed while writing files during one extraction,
/// with the number of files written beneath each.
///
/// Ordered by name so inference over it is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLevelDirectories {
    counts: BTreeMap<String, usize>,
}

impl TopLevelDirectories {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file written at archive-relative `path`.
    ///
    /// Files at the archive root have no top-level directory and are not
    /// recorded; leading `.` segments are skipped. A segment that is not
    /// valid UTF-8 cannot be reported as a service root and is left out.
    pub fn record(&mut self, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let first = parent.components().find_map(|component| match component {
            Component::Normal(segment) => Some(segment),
            _ => None,
        });
        let Some(segment) = first else {
            return;
        };
        match segment.to_str() {
            Some(name) => *self.counts.entry(name.to_owned()).or_default() += 1,
            None => debug!("not recording non-UTF-8 directory of {}", path.display()),
        }
    }

    /// Number of distinct top-level directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Return whether no file was written below a directory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Return whether `name` was recorded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    /// Number of files written beneath `name`.
    #[must_use]
    pub fn file_count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Directory names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// Pick the extracted service's root directory.
///
/// A recorded `preferred` name wins. Otherwise the directory holding the
/// most files is chosen, ties going to the lexicographically smallest name.
/// When nothing was extracted below a directory the service lives directly
/// in `output_dir`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use sm2_installer::artefact::service_dir::{infer_service_dir, TopLevelDirectories};
/// use std::path::Path;
///
/// let mut dirs = TopLevelDirectories::new();
/// dirs.record(Path::new("auth-7.1.0/bin/auth"));
/// let root = infer_service_dir(&dirs, Utf8Path::new("/srv/auth"), None);
/// assert_eq!(root, "/srv/auth/auth-7.1.0");
/// ```
#[must_use]
pub fn infer_service_dir(
    dirs: &TopLevelDirectories,
    output_dir: &Utf8Path,
    preferred: Option<&str>,
) -> Utf8PathBuf {
    if let Some(name) = preferred.filter(|name| dirs.contains(name)) {
        return output_dir.join(name);
    }

    // `max_by_key` keeps the last maximum, so iterate names in reverse to
    // land on the smallest.
    dirs.counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| **count)
        .map_or_else(|| output_dir.to_owned(), |(name, _)| output_dir.join(name))
}
