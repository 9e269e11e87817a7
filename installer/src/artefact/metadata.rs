//! Version metadata reported by the repository for one artifact.

/// The fields of a `maven-metadata.xml` document the installer relies on.
///
/// Produced fresh by every resolution; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadata {
    artifact: String,
    group: String,
    latest: String,
    release: String,
}

impl VersionMetadata {
    /// Create metadata from its four reported fields.
    #[must_use]
    pub fn new(
        artifact: impl Into<String>,
        group: impl Into<String>,
        latest: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            group: group.into(),
            latest: latest.into(),
            release: release.into(),
        }
    }

    /// The artifact name the document was published under.
    ///
    /// When a naming variant was substituted during resolution this is the
    /// substituted name, which is also the name the archive lives under.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// The group identifier reported by the document.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The most recently deployed version, which may be a snapshot.
    #[must_use]
    pub fn latest(&self) -> &str {
        &self.latest
    }

    /// The most recent non-snapshot release.
    #[must_use]
    pub fn release(&self) -> &str {
        &self.release
    }

    /// The version to install.
    ///
    /// Always the `release` field: `latest` can point at a snapshot that was
    /// never promoted, which is not fit for deployment.
    #[must_use]
    pub fn deployable_version(&self) -> &str {
        &self.release
    }
}
