//! Installer configuration loaded from TOML.
//!
//! Every setting has a default, so an empty file (or no file at all) is a
//! valid configuration apart from the repository URL, which must come from
//! the file or the command line. A minimal file looks like:
//!
//! ```toml
//! repository_url = "https://artefacts.example.com/artifactory/hmrc-releases"
//! download_timeout_secs = 600
//! require_checksum = true
//!
//! [naming_variants]
//! candidates = ["_3", "_2.13"]
//! ```

use crate::artefact::coordinate::{DEFAULT_METADATA_FILE_NAME, RepositoryLayout};
use crate::artefact::download::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_METADATA_TIMEOUT};
use crate::artefact::error::ArtefactError;
use crate::artefact::naming::{
    DEFAULT_SEPARATOR, NamingVariantPolicy, SCALA_CANDIDATES, SCALA_SUFFIX_PATTERN,
};
use crate::artefact::verification::VerificationPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Errors arising while loading or interpreting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The naming-variant settings do not form a usable policy.
    #[error("invalid naming variants: {0}")]
    NamingVariants(#[from] ArtefactError),

    /// No repository URL was configured.
    #[error("no repository URL configured; set repository_url or pass --repository-url")]
    MissingRepositoryUrl,
}

/// Top-level installer configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Base URL of the Maven-layout repository.
    pub repository_url: Option<String>,
    /// File name of the per-artifact version metadata document.
    pub metadata_file_name: String,
    /// Deadline for a whole archive download, in seconds.
    pub download_timeout_secs: u64,
    /// Deadline for each metadata request, in seconds.
    pub metadata_timeout_secs: u64,
    /// Reject archives served without a checksum header.
    pub require_checksum: bool,
    /// Naming-variant fallback settings.
    pub naming_variants: NamingVariantsConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            repository_url: None,
            metadata_file_name: DEFAULT_METADATA_FILE_NAME.to_owned(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
            metadata_timeout_secs: DEFAULT_METADATA_TIMEOUT.as_secs(),
            require_checksum: false,
            naming_variants: NamingVariantsConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, mistyped values or
    /// unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm2_installer::config::InstallerConfig;
    ///
    /// let config = InstallerConfig::from_toml_str("require_checksum = true")
    ///     .expect("valid configuration");
    /// assert!(config.verification_policy().require_checksum());
    /// assert_eq!(config.download_timeout().as_secs(), 1800);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build the repository layout from the configured URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRepositoryUrl`] when no non-blank URL is
    /// configured.
    pub fn layout(&self) -> Result<RepositoryLayout, ConfigError> {
        let url = self
            .repository_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingRepositoryUrl)?;
        Ok(RepositoryLayout::new(url).with_metadata_file_name(self.metadata_file_name.clone()))
    }

    /// Build the naming-variant policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NamingVariants`] for an invalid pattern or an
    /// empty candidate list.
    pub fn naming_policy(&self) -> Result<NamingVariantPolicy, ConfigError> {
        let variants = &self.naming_variants;
        Ok(NamingVariantPolicy::new(
            &variants.pattern,
            &variants.separator,
            &variants.candidates,
        )?)
    }

    /// The archive download deadline.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// The per-request metadata deadline.
    #[must_use]
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// The archive verification policy.
    #[must_use]
    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy::with_required_checksum(self.require_checksum)
    }
}

/// Settings for [`NamingVariantPolicy`]; defaults to the Scala convention.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NamingVariantsConfig {
    /// Regular expression matching a variant suffix at the end of a name.
    pub pattern: String,
    /// Separator placed before an explicitly requested variant.
    pub separator: String,
    /// Suffixes to try, in priority order.
    pub candidates: Vec<String>,
}

impl Default for NamingVariantsConfig {
    fn default() -> Self {
        Self {
            pattern: SCALA_SUFFIX_PATTERN.to_owned(),
            separator: DEFAULT_SEPARATOR.to_owned(),
            candidates: SCALA_CANDIDATES.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}
