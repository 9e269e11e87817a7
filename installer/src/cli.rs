//! CLI argument definitions for the service installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::artefact::coordinate::ArtefactCoordinate;
use crate::artefact::error::ArtefactError;
use crate::config::InstallerConfig;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Group used when `--group` is not given.
pub const DEFAULT_GROUP: &str = "uk.gov.hmrc";

/// Resolve and install service artefacts from a Maven-layout repository.
#[derive(Parser, Debug)]
#[command(name = "sm2-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Resolve and install service artefacts from a Maven-layout repository.\n\n",
    "The installer reads maven-metadata.xml to find the latest release of an ",
    "artefact, trying newer Scala cross-build suffixes first when the name ",
    "carries one (auth_2.12 may resolve to auth_3 or auth_2.13). The archive is ",
    "downloaded to a staging file, checked against the checksum the repository ",
    "declares, and only then unpacked into the output directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Show the latest release of a service:\n",
    "    $ sm2-installer --repository-url https://repo.example.com/releases resolve auth_2.13\n\n",
    "  Install a service, pinning the Scala 2.13 build:\n",
    "    $ sm2-installer install auth_2.12 --variant 2.13 --output ~/.sm2/auth\n\n",
    "  Use a configuration file and require checksums:\n",
    "    $ sm2-installer -c sm2.toml --require-checksum install auth_2.13 -o /srv/auth\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the latest release of an artefact.
    Resolve(ArtefactArgs),

    /// Download, verify and unpack the latest release of an artefact.
    Install(InstallArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Repository base URL, overriding the configuration file.
    #[arg(long, value_name = "URL", global = true)]
    pub repository_url: Option<String>,

    /// Archive download deadline in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Reject archives served without a checksum header.
    #[arg(long, global = true)]
    pub require_checksum: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Apply command-line overrides on top of file configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm2_installer::cli::GlobalArgs;
    /// use sm2_installer::config::InstallerConfig;
    ///
    /// let args = GlobalArgs {
    ///     timeout: Some(60),
    ///     ..GlobalArgs::default()
    /// };
    /// let config = args.apply_overrides(InstallerConfig::default());
    /// assert_eq!(config.download_timeout_secs, 60);
    /// ```
    #[must_use]
    pub fn apply_overrides(&self, mut config: InstallerConfig) -> InstallerConfig {
        if let Some(url) = &self.repository_url {
            config.repository_url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout {
            config.download_timeout_secs = timeout;
        }
        config.require_checksum |= self.require_checksum;
        config
    }

    /// The log level implied by `-q` and `-v`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Identifies the artefact to work on.
#[derive(Args, Debug, Clone)]
pub struct ArtefactArgs {
    /// Artifact name, optionally with a Scala suffix (e.g. `auth_2.13`).
    #[arg(value_name = "ARTIFACT")]
    pub artifact: String,

    /// Group identifier.
    #[arg(short, long, value_name = "GROUP", default_value = DEFAULT_GROUP)]
    pub group: String,

    /// Try only this naming variant (e.g. `2.13`) instead of the fallback
    /// search.
    #[arg(long, value_name = "VARIANT")]
    pub variant: Option<String>,
}

impl ArtefactArgs {
    /// Build the coordinate these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError`] for a blank or path-like group or artifact.
    pub fn coordinate(&self) -> Result<ArtefactCoordinate, ArtefactError> {
        let coordinate = ArtefactCoordinate::new(self.group.as_str(), self.artifact.as_str())?;
        Ok(match &self.variant {
            Some(variant) => coordinate.with_variant(variant.as_str()),
            None => coordinate,
        })
    }
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// The artefact to install.
    #[command(flatten)]
    pub artefact: ArtefactArgs,

    /// Directory to unpack the archive into.
    #[arg(short, long, value_name = "DIR")]
    pub output: Utf8PathBuf,

    /// Top-level archive directory to report as the service root.
    #[arg(long, value_name = "NAME")]
    pub service_dir: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
