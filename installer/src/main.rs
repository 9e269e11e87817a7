//! Service installer CLI entrypoint.
//!
//! Resolves the latest release of a service artefact and, for `install`,
//! downloads, verifies and unpacks it. Results go to stdout; progress and
//! errors go to stderr.

use clap::Parser;
use log::LevelFilter;
use sm2_installer::artefact::download::HttpDownloader;
use sm2_installer::artefact::fetch::{NoProgress, ProgressSink};
use sm2_installer::cli::{ArtefactArgs, Cli, Command, GlobalArgs, InstallArgs};
use sm2_installer::config::InstallerConfig;
use sm2_installer::error::{InstallerError, Result};
use sm2_installer::install_flow::{InstallRequest, install_latest, resolve_latest};
use sm2_installer::output::{StderrProgress, success_message, write_stderr_line};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.log_level());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the `env_logger` backend; `RUST_LOG` takes precedence over the
/// flag-derived level.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = load_config(&cli.global)?;
    let downloader = HttpDownloader::new(config.metadata_timeout());

    match &cli.command {
        Command::Resolve(args) => run_resolve(&config, args, &downloader, stdout),
        Command::Install(args) => run_install(
            &config,
            args,
            cli.global.quiet,
            &downloader,
            stdout,
            stderr,
        ),
    }
}

/// Loads the configuration file, if any, and applies command-line overrides.
fn load_config(global: &GlobalArgs) -> Result<InstallerConfig> {
    let file_config = match &global.config {
        Some(path) => InstallerConfig::load(path)?,
        None => InstallerConfig::default(),
    };
    Ok(global.apply_overrides(file_config))
}

/// Prints the deployable version of the latest release.
fn run_resolve(
    config: &InstallerConfig,
    args: &ArtefactArgs,
    downloader: &HttpDownloader,
    stdout: &mut dyn Write,
) -> Result<()> {
    let coordinate = args.coordinate()?;
    let layout = config.layout()?;
    let naming = config.naming_policy()?;
    let metadata = resolve_latest(&coordinate, &layout, &naming, downloader)?;
    writeln!(
        stdout,
        "{}:{} {}",
        metadata.group(),
        metadata.artifact(),
        metadata.deployable_version()
    )
    .map_err(|source| InstallerError::WriteFailed { source })
}

/// Installs the latest release and prints the service root.
fn run_install(
    config: &InstallerConfig,
    args: &InstallArgs,
    quiet: bool,
    downloader: &HttpDownloader,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let coordinate = args.artefact.coordinate()?;
    let layout = config.layout()?;
    let naming = config.naming_policy()?;
    let request = InstallRequest {
        coordinate: &coordinate,
        layout: &layout,
        naming: &naming,
        output_dir: &args.output,
        download_timeout: config.download_timeout(),
        verification: config.verification_policy(),
        preferred_service_dir: args.service_dir.as_deref(),
        quiet,
    };

    let mut progress_stream = std::io::stderr();
    let mut progress: Box<dyn ProgressSink + '_> = if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(StderrProgress::new(&mut progress_stream))
    };
    let installed = install_latest(&request, downloader, progress.as_mut(), stderr)?;

    if !quiet {
        write_stderr_line(stderr, success_message(&installed));
    }
    writeln!(stdout, "{}", installed.service_root())
        .map_err(|source| InstallerError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {}", error_chain(&err)));
            1
        }
    }
}

/// Formats an error with its sources, separated by `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use sm2_installer::config::ConfigError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_chain_and_returns_one() {
        let err = InstallerError::OutputDir {
            path: Utf8PathBuf::from("/srv/auth"),
            source: std::io::Error::other("permission denied"),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("failed to create output directory /srv/auth"));
        assert!(stderr_text.contains("permission denied"));
    }

    #[test]
    fn error_chain_skips_repeated_messages() {
        let err = InstallerError::Config(ConfigError::MissingRepositoryUrl);
        assert_eq!(error_chain(&err), ConfigError::MissingRepositoryUrl.to_string());
    }

    #[test]
    fn load_config_without_file_uses_overrides() {
        let global = GlobalArgs {
            repository_url: Some("https://repo.test".to_owned()),
            ..GlobalArgs::default()
        };
        let config = load_config(&global).expect("config");
        assert_eq!(config.repository_url.as_deref(), Some("https://repo.test"));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let global = GlobalArgs {
            config: Some(Utf8PathBuf::from("/nonexistent/sm2.toml")),
            ..GlobalArgs::default()
        };
        let err = load_config(&global).expect_err("missing file");
        assert!(matches!(err, InstallerError::Config(ConfigError::Read { .. })));
    }

    #[test]
    fn resolve_without_repository_url_fails() {
        let cli = Cli::parse_from(["sm2-installer", "resolve", "auth"]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let err = run(&cli, &mut stdout, &mut stderr).expect_err("no url");
        assert!(matches!(
            err,
            InstallerError::Config(ConfigError::MissingRepositoryUrl)
        ));
        assert!(stdout.is_empty());
    }
}
