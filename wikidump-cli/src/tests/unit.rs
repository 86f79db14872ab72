//! Focused unit tests covering fetch and convert CLI configuration.

use super::helpers::{Workspace, language};
use super::*;
use crate::convert::{ConvertArgs, ConvertConfig};
use crate::fetch::{FetchArgs, FetchConfig, FetchTarget, config_from_layers_for_test};
use camino::Utf8PathBuf;
use rstest::rstest;
use wikidump_data::dump::{DEFAULT_BASE_URL, DEFAULT_LOADER, DEFAULT_TRANSLITERATOR, DEFAULT_USER_AGENT};

#[rstest]
fn fetch_config_applies_defaults() {
    let args = FetchArgs {
        language: Some("ab".to_owned()),
        ..FetchArgs::default()
    };
    let config = FetchConfig::try_from(args).expect("config should build");
    assert_eq!(config.target, FetchTarget::One(language("ab")));
    assert_eq!(config.output_dir, Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(config.fetch_log, None);
    assert!(!config.quiet);
}

#[rstest]
#[case(false, None, ARG_LANGUAGE, ENV_FETCH_LANGUAGE)]
#[case(true, None, ARG_LANGUAGES, ENV_FETCH_LANGUAGES)]
fn converting_fetch_without_required_fields_errors(
    #[case] all: bool,
    #[case] languages: Option<Utf8PathBuf>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = FetchArgs {
        all,
        languages,
        ..FetchArgs::default()
    };
    let err = FetchConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn fetch_rejects_language_with_all() {
    let args = FetchArgs {
        language: Some("ab".to_owned()),
        all: true,
        languages: Some(Utf8PathBuf::from("languages.txt")),
        ..FetchArgs::default()
    };
    let err = FetchConfig::try_from(args).expect_err("conflicting targets should error");
    assert!(matches!(err, CliError::ConflictingTargets));
}

#[rstest]
#[case("")]
#[case("en/../de")]
fn fetch_rejects_invalid_languages(#[case] code: &str) {
    let args = FetchArgs {
        language: Some(code.to_owned()),
        ..FetchArgs::default()
    };
    let err = FetchConfig::try_from(args).expect_err("invalid language should error");
    match err {
        CliError::InvalidLanguage { code: reported, .. } => assert_eq!(reported, code),
        other => panic!("expected InvalidLanguage, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_language_list() {
    let workspace = Workspace::new();
    let config = super::helpers::fetch_config(
        FetchTarget::All(workspace.root().join("missing.txt")),
        workspace.output_dir(),
    );
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_LANGUAGES),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let workspace = Workspace::new();
    let config = super::helpers::fetch_config(
        FetchTarget::All(workspace.root().to_path_buf()),
        workspace.output_dir(),
    );
    let err = config
        .validate_sources()
        .expect_err("expected directory rejection");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_LANGUAGES),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "language": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "language": "de",
            "output_dir": "from-file",
            "base_url": "https://mirror.example.org",
        }),
        None,
    );
    composer.push_environment(json!({
        "output_dir": "from-env",
        "user_agent": "env-agent/1.0",
    }));
    composer.push_cli(json!({
        "language": "ab",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.target, FetchTarget::One(language("ab")));
    assert_eq!(config.output_dir, Utf8PathBuf::from("from-env"));
    assert_eq!(config.base_url, "https://mirror.example.org");
    assert_eq!(config.user_agent, "env-agent/1.0");
}

#[rstest]
fn convert_config_applies_defaults() {
    let args = ConvertArgs {
        language: Some("ab".to_owned()),
        ..ConvertArgs::default()
    };
    let config = ConvertConfig::try_from(args).expect("config should build");
    assert_eq!(config.language, language("ab"));
    assert_eq!(config.output_dir, Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.transliterator, DEFAULT_TRANSLITERATOR);
    assert_eq!(config.loader, DEFAULT_LOADER);
    let converter = config.converter();
    assert_eq!(
        converter.input_path(&config.language),
        Utf8PathBuf::from(DEFAULT_OUTPUT_DIR).join("ab.sql").as_std_path()
    );
}

#[rstest]
fn convert_requires_language() {
    let err = ConvertConfig::try_from(ConvertArgs::default())
        .expect_err("missing language should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_LANGUAGE);
            assert_eq!(env, ENV_CONVERT_LANGUAGE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn parses_subcommands() {
    let cli = Cli::try_parse_from([
        "wikidump",
        "fetch",
        "--all",
        "--languages",
        "editions.txt",
        "--quiet",
    ])
    .expect("arguments should parse");
    match cli.command {
        Command::Fetch(args) => {
            assert!(args.all);
            assert!(args.quiet);
            assert_eq!(args.languages, Some(Utf8PathBuf::from("editions.txt")));
            assert_eq!(args.language, None);
        }
        Command::Convert(_) => panic!("expected the fetch subcommand"),
    }
}
