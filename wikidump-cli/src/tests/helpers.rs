//! Test helpers for building CLI workspaces and stubbed dump servers.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::{Compression, write::GzEncoder};
use std::{fs, io::Write};
use tempfile::TempDir;
use wikidump_data::dump::{LanguageCode, StubSource, sample_feed};

use crate::fetch::{FetchConfig, FetchTarget};

pub(super) const SAMPLE_DUMP: &[u8] = b"INSERT INTO `externallinks` VALUES (1,'https://example.org');\n";

/// Temporary directory addressed through UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("files")
    }

    pub(super) fn write(&self, name: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write workspace file");
        path
    }
}

pub(super) fn language(code: &str) -> LanguageCode {
    LanguageCode::new(code).expect("valid language code")
}

pub(super) fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("encode sample dump");
    encoder.finish().expect("finish sample archive")
}

pub(super) fn archive_name(code: &str) -> String {
    format!("{code}wiki-20240101-externallinks.sql.gz")
}

/// Stub server publishing a dump for each of `codes`.
pub(super) fn stub_with_dumps(codes: &[&str]) -> StubSource {
    codes.iter().fold(StubSource::default(), |source, code| {
        let name = archive_name(code);
        let url = format!("https://example.org/{code}wiki/20240101/{name}");
        source
            .with_feed(&language(code), sample_feed(&url, &name))
            .with_archive(&url, gzip(SAMPLE_DUMP))
    })
}

pub(super) fn fetch_config(target: FetchTarget, output_dir: Utf8PathBuf) -> FetchConfig {
    FetchConfig {
        target,
        output_dir,
        base_url: "https://example.org".to_owned(),
        user_agent: "wikidump-tests".to_owned(),
        fetch_log: None,
        quiet: true,
    }
}
