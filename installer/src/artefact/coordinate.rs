//! Artefact coordinates and Maven repository URL layout.
//!
//! A coordinate names a package in the remote index by group and artifact,
//! optionally pinning a naming variant (for example the Scala major version
//! the artefact was built against). [`RepositoryLayout`] turns coordinates
//! into metadata and archive URLs following the Maven directory convention:
//! `<base>/<group path>/<artifact>/<version>/<artifact>-<version>.tgz`.

use super::error::{ArtefactError, Result};
use std::fmt;

/// Default name of the version metadata document published per artifact.
pub const DEFAULT_METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// File extension of service archives.
const ARCHIVE_EXTENSION: &str = ".tgz";

/// An immutable `(group, artifact)` pair with an optional naming variant.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::coordinate::ArtefactCoordinate;
///
/// let coordinate = ArtefactCoordinate::new("uk.gov.hmrc", "auth_2.13")
///     .expect("valid coordinate")
///     .with_variant("2.12");
/// assert_eq!(coordinate.artifact(), "auth_2.13");
/// assert_eq!(coordinate.variant(), Some("2.12"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtefactCoordinate {
    group: String,
    artifact: String,
    variant: Option<String>,
}

impl ArtefactCoordinate {
    /// Create a coordinate from a group identifier and artifact name.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::EmptyField`] if either component is blank
    /// and [`ArtefactError::IllegalPathSegment`] if either would escape the
    /// repository directory when used as a URL path.
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Result<Self> {
        let group = group.into();
        let artifact = artifact.into();
        validate_component("group", &group)?;
        validate_component("artifact", &artifact)?;
        if artifact.contains('/') {
            return Err(ArtefactError::IllegalPathSegment {
                field: "artifact",
                value: artifact,
            });
        }
        Ok(Self {
            group,
            artifact,
            variant: None,
        })
    }

    /// Pin the naming variant to try, e.g. `"2.13"`.
    ///
    /// Blank values are ignored so that an empty configuration entry behaves
    /// like an absent one.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        let variant = variant.into();
        let trimmed = variant.trim();
        self.variant = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Return the group identifier as supplied.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Return the artifact name as supplied.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Return the explicitly requested naming variant, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
}

impl fmt::Display for ArtefactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ArtefactError::EmptyField { field });
    }
    if value.split('/').any(|segment| segment == "..") {
        return Err(ArtefactError::IllegalPathSegment {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

/// URL layout of a Maven-style repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    base_url: String,
    metadata_file_name: String,
}

impl RepositoryLayout {
    /// Create a layout rooted at `base_url` using the default metadata
    /// file name.
    ///
    /// Trailing slashes on the base URL are ignored.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            metadata_file_name: DEFAULT_METADATA_FILE_NAME.to_owned(),
        }
    }

    /// Override the metadata document file name.
    #[must_use]
    pub fn with_metadata_file_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_file_name = name.into();
        self
    }

    /// Return the repository base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the metadata URL for `artifact` within `group`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm2_installer::artefact::coordinate::RepositoryLayout;
    ///
    /// let layout = RepositoryLayout::new("https://repo.test/releases/");
    /// assert_eq!(
    ///     layout.metadata_url("uk.gov.hmrc", "auth_2.13"),
    ///     "https://repo.test/releases/uk/gov/hmrc/auth_2.13/maven-metadata.xml"
    /// );
    /// ```
    #[must_use]
    pub fn metadata_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}/{}/{artifact}/{}",
            self.base_url,
            group_path(group),
            self.metadata_file_name
        )
    }

    /// Build the archive URL for a resolved `artifact` and `version`.
    ///
    /// `artifact` must be the name the metadata was found under, which may
    /// differ from the requested name when a naming variant was substituted.
    #[must_use]
    pub fn archive_url(&self, group: &str, artifact: &str, version: &str) -> String {
        format!(
            "{}/{}/{artifact}/{version}/{artifact}-{version}{ARCHIVE_EXTENSION}",
            self.base_url,
            group_path(group)
        )
    }
}

/// Convert a dotted group identifier into its repository path.
fn group_path(group: &str) -> String {
    group.trim_matches('/').replace('.', "/")
}
