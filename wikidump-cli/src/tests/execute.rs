//! Tests driving fetch execution against stubbed dump servers.

use super::helpers::{SAMPLE_DUMP, Workspace, archive_name, fetch_config, language, stub_with_dumps};
use super::*;
use crate::fetch::{FetchSummary, FetchTarget, execute_fetch};
use rstest::rstest;
use std::{fs, sync::Arc};
use wikidump_data::dump::{
    PipelineError, SilentProgress, block_on_for_tests,
    test_support::{ProgressEvent, RecordingProgress},
};

#[rstest]
fn fetches_a_single_language() {
    let workspace = Workspace::new();
    let source = stub_with_dumps(&["ab"]);
    let config = fetch_config(FetchTarget::One(language("ab")), workspace.output_dir());

    let summary = block_on_for_tests(execute_fetch(&config, &source, Arc::new(SilentProgress)))
        .expect("fetch should succeed");

    match summary {
        FetchSummary::One(report) => assert_eq!(report.language, language("ab")),
        other => panic!("expected a single report, found {other:?}"),
    }
    let output = workspace.output_dir();
    assert!(output.join(archive_name("ab")).is_file());
    assert_eq!(fs::read(output.join("ab.sql")).expect("read dump"), SAMPLE_DUMP);
}

#[rstest]
fn single_language_failures_surface_the_stage() {
    let workspace = Workspace::new();
    let source = stub_with_dumps(&[]);
    let config = fetch_config(FetchTarget::One(language("xx")), workspace.output_dir());

    let err = block_on_for_tests(execute_fetch(&config, &source, Arc::new(SilentProgress)))
        .expect_err("unknown language should fail");
    match err {
        CliError::Fetch(inner) => assert!(matches!(*inner, PipelineError::Resolve { .. })),
        other => panic!("expected a fetch error, found {other:?}"),
    }
    let entries = fs::read_dir(workspace.output_dir())
        .expect("output directory should exist")
        .count();
    assert_eq!(entries, 0);
}

#[rstest]
fn batch_fetch_reports_failures_after_attempting_all() {
    let workspace = Workspace::new();
    let list = workspace.write("languages.txt", b"# editions\nab\nxx\nbe-tarask\n");
    let source = stub_with_dumps(&["ab", "be_tarask"]);
    let config = fetch_config(FetchTarget::All(list), workspace.output_dir());
    let progress = Arc::new(RecordingProgress::default());

    let err = block_on_for_tests(execute_fetch(&config, &source, progress.clone()))
        .expect_err("one language should fail");

    match err {
        CliError::FetchFailures { failed, total } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("expected FetchFailures, found {other:?}"),
    }
    let output = workspace.output_dir();
    assert!(output.join("ab.sql").is_file());
    assert!(output.join("be_tarask.sql").is_file());
    let announced = progress
        .events()
        .into_iter()
        .filter(|event| matches!(event, ProgressEvent::LanguageStarted { .. }))
        .count();
    assert_eq!(announced, 3);
}

#[rstest]
fn batch_fetch_succeeds_when_every_language_resolves() {
    let workspace = Workspace::new();
    let list = workspace.write("languages.txt", b"ab\nde\n");
    let source = stub_with_dumps(&["ab", "de"]);
    let config = fetch_config(FetchTarget::All(list), workspace.output_dir());

    let summary = block_on_for_tests(execute_fetch(&config, &source, Arc::new(SilentProgress)))
        .expect("batch should succeed");
    assert!(matches!(summary, FetchSummary::All { fetched: 2 }));
}

#[rstest]
fn fetch_log_is_created_beside_nested_paths() {
    let workspace = Workspace::new();
    let source = stub_with_dumps(&["ab"]);
    let mut config = fetch_config(FetchTarget::One(language("ab")), workspace.output_dir());
    let log_path = workspace.root().join("logs").join("fetches.sqlite");
    config.fetch_log = Some(log_path.clone());

    block_on_for_tests(execute_fetch(&config, &source, Arc::new(SilentProgress)))
        .expect("fetch should succeed");

    let connection = rusqlite::Connection::open(log_path.as_std_path()).expect("open fetch log");
    let count: i64 = connection
        .query_row("SELECT COUNT(*) FROM fetches", [], |row| row.get(0))
        .expect("query fetch log");
    assert_eq!(count, 1);
}

#[rstest]
fn unreadable_language_lists_are_reported() {
    let workspace = Workspace::new();
    let list = workspace.write("languages.txt", b"ab\nnot valid\n");
    let source = stub_with_dumps(&["ab"]);
    let config = fetch_config(FetchTarget::All(list), workspace.output_dir());

    let err = block_on_for_tests(execute_fetch(&config, &source, Arc::new(SilentProgress)))
        .expect_err("invalid list should fail");
    assert!(matches!(err, CliError::LanguageList(_)));
}
