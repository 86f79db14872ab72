//! Behavioural coverage for fetching a language's external-links dump.

use flate2::{Compression, write::GzEncoder};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, io::Write, path::PathBuf};
use tempfile::TempDir;
use wikidump_data::dump::{
    FeedError, FetchLog, FetchPipeline, FetchReport, LanguageCode, PipelineError,
    block_on_for_tests,
    test_support::{StubSource, feed_with_description, sample_feed},
};

const ARCHIVE_URL: &str = "https://example.org/abwiki/20240101/abwiki-20240101-externallinks.sql.gz";
const ARCHIVE_NAME: &str = "abwiki-20240101-externallinks.sql.gz";
const SAMPLE_DUMP: &[u8] = b"INSERT INTO `externallinks` VALUES (1,'https://example.org');\n";

type FetchResultCell = RefCell<Option<Result<FetchReport, PipelineError>>>;

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if let Err(err) = encoder.write_all(bytes) {
        panic!("failed to encode sample dump: {err}");
    }
    match encoder.finish() {
        Ok(archive) => archive,
        Err(err) => panic!("failed to finish sample archive: {err}"),
    }
}

fn language(code: &str) -> LanguageCode {
    match LanguageCode::new(code) {
        Ok(language) => language,
        Err(err) => panic!("invalid language code {code:?}: {err}"),
    }
}

#[fixture]
fn stub_source() -> RefCell<Option<StubSource>> {
    RefCell::new(None)
}

#[fixture]
fn target_language() -> RefCell<Option<LanguageCode>> {
    RefCell::new(None)
}

#[fixture]
fn fetch_result() -> FetchResultCell {
    RefCell::new(None)
}

#[fixture]
fn working_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temporary directory: {err}"),
    }
}

#[fixture]
fn output_dir() -> RefCell<Option<PathBuf>> {
    RefCell::new(None)
}

#[fixture]
fn log_handle() -> RefCell<Option<FetchLog>> {
    RefCell::new(None)
}

fn prepared_output(output_cell: &RefCell<Option<PathBuf>>) -> PathBuf {
    output_cell
        .borrow()
        .as_ref()
        .cloned()
        .unwrap_or_else(|| panic!("output directory must be prepared"))
}

#[given("a dump feed advertising an archive for language ab")]
fn feed_with_archive(
    #[from(stub_source)] source: &RefCell<Option<StubSource>>,
    #[from(target_language)] target: &RefCell<Option<LanguageCode>>,
) {
    let ab = language("ab");
    *source.borrow_mut() = Some(
        StubSource::default()
            .with_feed(&ab, sample_feed(ARCHIVE_URL, ARCHIVE_NAME))
            .with_archive(ARCHIVE_URL, gzip(SAMPLE_DUMP)),
    );
    *target.borrow_mut() = Some(ab);
}

#[given("no dump feed is published for language xx")]
fn no_feed(
    #[from(stub_source)] source: &RefCell<Option<StubSource>>,
    #[from(target_language)] target: &RefCell<Option<LanguageCode>>,
) {
    *source.borrow_mut() = Some(StubSource::default());
    *target.borrow_mut() = Some(language("xx"));
}

#[given("a dump feed without a download link for language ab")]
fn feed_without_link(
    #[from(stub_source)] source: &RefCell<Option<StubSource>>,
    #[from(target_language)] target: &RefCell<Option<LanguageCode>>,
) {
    let ab = language("ab");
    *source.borrow_mut() = Some(
        StubSource::default().with_feed(&ab, feed_with_description("Dump in progress")),
    );
    *target.borrow_mut() = Some(ab);
}

#[given("an empty output directory")]
fn empty_output(
    #[from(working_dir)] dir: &TempDir,
    #[from(output_dir)] output_cell: &RefCell<Option<PathBuf>>,
) {
    let path = dir.path().join("files");
    if let Err(err) = fs::create_dir_all(&path) {
        panic!("failed to create output directory: {err}");
    }
    *output_cell.borrow_mut() = Some(path);
}

#[given("a fetch log target")]
fn fetch_log_target(
    #[from(working_dir)] dir: &TempDir,
    #[from(log_handle)] log_cell: &RefCell<Option<FetchLog>>,
) {
    let path = dir.path().join("fetches.sqlite");
    let log = match FetchLog::initialise(&path) {
        Ok(log) => log,
        Err(err) => panic!("log initialisation failed: {err}"),
    };
    *log_cell.borrow_mut() = Some(log);
}

#[when("I fetch the dump for the language")]
fn fetch_dump(
    #[from(stub_source)] source_cell: &RefCell<Option<StubSource>>,
    #[from(target_language)] target_cell: &RefCell<Option<LanguageCode>>,
    #[from(output_dir)] output_cell: &RefCell<Option<PathBuf>>,
    #[from(log_handle)] log_cell: &RefCell<Option<FetchLog>>,
    #[from(fetch_result)] result_cell: &FetchResultCell,
) {
    let source_borrow = source_cell.borrow();
    let stub = source_borrow
        .as_ref()
        .unwrap_or_else(|| panic!("stub source must be initialised"));
    let target_borrow = target_cell.borrow();
    let target = target_borrow
        .as_ref()
        .unwrap_or_else(|| panic!("language must be chosen"));
    let log_borrow = log_cell.borrow();
    let mut pipeline = FetchPipeline::new(stub, prepared_output(output_cell));
    if let Some(log) = log_borrow.as_ref() {
        pipeline = pipeline.with_log(log);
    }
    let outcome = block_on_for_tests(pipeline.run_one(target));
    *result_cell.borrow_mut() = Some(outcome);
}

#[then("the archive and the extracted dump are written")]
fn dump_written(
    #[from(output_dir)] output_cell: &RefCell<Option<PathBuf>>,
    #[from(fetch_result)] result_cell: &FetchResultCell,
) {
    let output = prepared_output(output_cell);
    let result_borrow = result_cell.borrow();
    let report = match result_borrow.as_ref() {
        Some(Ok(report)) => report,
        Some(Err(err)) => panic!("fetch should succeed: {err}"),
        None => panic!("fetch result must be captured"),
    };
    let archive = match fs::read(output.join(ARCHIVE_NAME)) {
        Ok(bytes) => bytes,
        Err(err) => panic!("failed to read downloaded archive: {err}"),
    };
    assert_eq!(archive.len() as u64, report.transfer.size_on_disk);
    let dump = match fs::read(output.join("ab.sql")) {
        Ok(bytes) => bytes,
        Err(err) => panic!("failed to read extracted dump: {err}"),
    };
    assert_eq!(dump, SAMPLE_DUMP);
    assert_eq!(report.extracted.output_path, output.join("ab.sql"));
}

#[then("the fetch log records an entry")]
fn log_records_entry(#[from(log_handle)] log_cell: &RefCell<Option<FetchLog>>) {
    use rusqlite::Connection;

    let log_borrow = log_cell.borrow();
    let log = log_borrow
        .as_ref()
        .unwrap_or_else(|| panic!("fetch log should be initialised"));
    let connection = match Connection::open(log.path()) {
        Ok(conn) => conn,
        Err(err) => panic!("failed to open fetch log: {err}"),
    };
    let count: i64 =
        match connection.query_row("SELECT COUNT(*) FROM fetches", [], |row| row.get(0)) {
            Ok(value) => value,
            Err(err) => panic!("failed to query fetch log: {err}"),
        };
    assert_eq!(count, 1);
}

#[then("a network error with status 404 is returned")]
fn network_error(#[from(fetch_result)] result_cell: &FetchResultCell) {
    let result_borrow = result_cell.borrow();
    match result_borrow.as_ref() {
        Some(Err(PipelineError::Resolve {
            source: FeedError::Network { source },
            ..
        })) => assert_eq!(source.status(), Some(404)),
        Some(Err(err)) => panic!("unexpected error variant: {err}"),
        Some(Ok(_)) => panic!("expected an error for the unknown language"),
        None => panic!("fetch result must be captured"),
    }
}

#[then("no files are written")]
fn no_files(#[from(output_dir)] output_cell: &RefCell<Option<PathBuf>>) {
    let output = prepared_output(output_cell);
    let entries = match fs::read_dir(&output) {
        Ok(entries) => entries.count(),
        Err(err) => panic!("failed to list output directory: {err}"),
    };
    assert_eq!(entries, 0);
}

#[then("an error about the missing download link is returned")]
fn missing_link_error(#[from(fetch_result)] result_cell: &FetchResultCell) {
    let result_borrow = result_cell.borrow();
    match result_borrow.as_ref() {
        Some(Err(PipelineError::MissingDownloadLink { language })) => {
            assert_eq!(language.as_ref(), "ab");
        }
        Some(Err(err)) => panic!("unexpected error variant: {err}"),
        Some(Ok(_)) => panic!("expected an error for the missing link"),
        None => panic!("fetch result must be captured"),
    }
}

#[then("no archive is requested")]
fn no_archive_requested(#[from(stub_source)] source_cell: &RefCell<Option<StubSource>>) {
    let source_borrow = source_cell.borrow();
    let stub = source_borrow
        .as_ref()
        .unwrap_or_else(|| panic!("stub source must be initialised"));
    assert!(stub.archive_requests().is_empty());
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features/fetch_language_dump.feature");
    let contents = match fs::read_to_string(&feature_path) {
        Ok(data) => data,
        Err(err) => panic!("failed to read feature file {feature_path:?}: {err}"),
    };
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "fetching the latest dump for a language",
            "reporting an unknown language",
            "skipping a feed without a download link",
        ],
        "scenario order changed in feature file"
    );
}

macro_rules! register_scenario {
    ($name:ident, $index:literal) => {
        #[scenario(path = "tests/features/fetch_language_dump.feature", index = $index)]
        fn $name(
            stub_source: RefCell<Option<StubSource>>,
            target_language: RefCell<Option<LanguageCode>>,
            fetch_result: FetchResultCell,
            working_dir: TempDir,
            output_dir: RefCell<Option<PathBuf>>,
            log_handle: RefCell<Option<FetchLog>>,
        ) {
            let _ = (
                stub_source,
                target_language,
                fetch_result,
                working_dir,
                output_dir,
                log_handle,
            );
        }
    };
}

register_scenario!(fetching_the_latest_dump_for_a_language, 0);
register_scenario!(reporting_an_unknown_language, 1);
register_scenario!(skipping_a_feed_without_a_download_link, 2);
