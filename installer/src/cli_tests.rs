//! Tests for installer CLI parsing and default behaviours.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_resolve_with_defaults() {
    let cli = Cli::parse_from(["sm2-installer", "resolve", "auth_2.13"]);
    let Command::Resolve(args) = cli.command else {
        panic!("expected Resolve command");
    };
    assert_eq!(args.artifact, "auth_2.13");
    assert_eq!(args.group, DEFAULT_GROUP);
    assert!(args.variant.is_none());
    assert!(cli.global.config.is_none());
    assert!(!cli.global.quiet);
    assert_eq!(cli.global.verbosity, 0);
}

#[test]
fn cli_parses_install() {
    let cli = Cli::parse_from([
        "sm2-installer",
        "install",
        "auth_2.12",
        "--group",
        "uk.gov.example",
        "--variant",
        "2.13",
        "-o",
        "/srv/auth",
        "--service-dir",
        "auth-7.1.0",
    ]);
    let Command::Install(args) = cli.command else {
        panic!("expected Install command");
    };
    assert_eq!(args.output, Utf8PathBuf::from("/srv/auth"));
    assert_eq!(args.service_dir.as_deref(), Some("auth-7.1.0"));

    let coordinate = args.artefact.coordinate().expect("coordinate");
    assert_eq!(coordinate.group(), "uk.gov.example");
    assert_eq!(coordinate.artifact(), "auth_2.12");
    assert_eq!(coordinate.variant(), Some("2.13"));
}

#[test]
fn install_requires_output() {
    let result = Cli::try_parse_from(["sm2-installer", "install", "auth_2.13"]);
    assert!(result.is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["sm2-installer"]).is_err());
}

#[test]
fn global_flags_accepted_after_subcommand() {
    let cli = Cli::parse_from([
        "sm2-installer",
        "resolve",
        "auth",
        "--repository-url",
        "https://repo.test",
        "--timeout",
        "90",
        "--require-checksum",
        "-c",
        "sm2.toml",
    ]);
    assert_eq!(cli.global.repository_url.as_deref(), Some("https://repo.test"));
    assert_eq!(cli.global.timeout, Some(90));
    assert!(cli.global.require_checksum);
    assert_eq!(cli.global.config, Some(Utf8PathBuf::from("sm2.toml")));
}

#[test]
fn verbosity_conflicts_with_quiet() {
    let result = Cli::try_parse_from(["sm2-installer", "-v", "-q", "resolve", "auth"]);
    assert!(result.is_err());
}

#[rstest]
#[case::quiet(&["sm2-installer", "-q", "resolve", "auth"], LevelFilter::Error)]
#[case::default(&["sm2-installer", "resolve", "auth"], LevelFilter::Warn)]
#[case::verbose(&["sm2-installer", "-v", "resolve", "auth"], LevelFilter::Info)]
#[case::very_verbose(&["sm2-installer", "-vv", "resolve", "auth"], LevelFilter::Debug)]
#[case::trace(&["sm2-installer", "-vvvv", "resolve", "auth"], LevelFilter::Trace)]
fn log_level_follows_flags(#[case] argv: &[&str], #[case] expected: LevelFilter) {
    let cli = Cli::parse_from(argv);
    assert_eq!(cli.global.log_level(), expected);
}

#[test]
fn overrides_replace_file_values() {
    let file = InstallerConfig {
        repository_url: Some("https://file.test".to_owned()),
        download_timeout_secs: 10,
        ..InstallerConfig::default()
    };
    let args = GlobalArgs {
        repository_url: Some("https://cli.test".to_owned()),
        require_checksum: true,
        ..GlobalArgs::default()
    };

    let merged = args.apply_overrides(file);
    assert_eq!(merged.repository_url.as_deref(), Some("https://cli.test"));
    assert_eq!(merged.download_timeout_secs, 10);
    assert!(merged.require_checksum);
}

#[test]
fn absent_overrides_keep_file_values() {
    let file = InstallerConfig {
        repository_url: Some("https://file.test".to_owned()),
        require_checksum: true,
        ..InstallerConfig::default()
    };
    let merged = GlobalArgs::default().apply_overrides(file.clone());
    assert_eq!(merged, file);
}

#[rstest]
#[case::blank_artifact("uk.gov.hmrc", " ")]
#[case::path_artifact("uk.gov.hmrc", "a/b")]
#[case::blank_group("", "auth")]
fn invalid_coordinates_are_rejected(#[case] group: &str, #[case] artifact: &str) {
    let args = ArtefactArgs {
        artifact: artifact.to_owned(),
        group: group.to_owned(),
        variant: None,
    };
    assert!(args.coordinate().is_err());
}
