use log::{info, warn};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::extract::extract_archive;
use super::feed::resolve_feed;
use super::progress::{ProgressReporter, SilentProgress};
use super::source::DumpSource;
use super::transfer::download_archive;
use super::{FetchLog, FetchReport, LanguageCode, PipelineError};

/// Outcome of one language within a batch fetch.
#[derive(Debug)]
pub struct LanguageOutcome {
    /// Language the outcome belongs to.
    pub language: LanguageCode,
    /// Result of fetching that language.
    pub result: Result<FetchReport, PipelineError>,
}

/// Sequences feed resolution, archive transfer and extraction.
///
/// Archives are written to `<output_dir>/<file name from the feed>` and
/// extracted to `<output_dir>/<language>.sql`, overwriting earlier runs.
///
/// # Examples
/// ```
/// # use flate2::{write::GzEncoder, Compression};
/// # use std::io::Write;
/// # use tempfile::tempdir;
/// # use wikidump_data::dump::{
/// #     block_on_for_tests, sample_feed, DumpUrl, FetchPipeline, LanguageCode, StubSource,
/// # };
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"-- ab dump")?;
/// let archive = encoder.finish()?;
/// let language = LanguageCode::new("ab")?;
/// let url = DumpUrl::new("https://example.org/abwiki-20240101.sql.gz");
/// let source = StubSource::default()
///     .with_feed(&language, sample_feed(&url, "abwiki-20240101.sql.gz"))
///     .with_archive(&url, archive);
/// let temp = tempdir()?;
/// let pipeline = FetchPipeline::new(&source, temp.path());
/// let report = block_on_for_tests(pipeline.run_one(&language))?;
/// assert_eq!(report.extracted.output_path, temp.path().join("ab.sql"));
/// # Ok(())
/// # }
/// # example().expect("example should run");
/// ```
pub struct FetchPipeline<'a, S: ?Sized> {
    source: &'a S,
    output_dir: PathBuf,
    progress: Arc<dyn ProgressReporter>,
    log: Option<&'a FetchLog>,
}

impl<'a, S: DumpSource + ?Sized> FetchPipeline<'a, S> {
    /// Construct a pipeline writing into `output_dir` with silent progress
    /// and no fetch log.
    pub fn new(source: &'a S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            progress: Arc::new(SilentProgress),
            log: None,
        }
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Record each successful fetch in `log`.
    #[must_use]
    pub fn with_log(mut self, log: &'a FetchLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Directory receiving archives and extracted dumps.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch and extract the latest dump for `language`.
    ///
    /// Nothing is written to disk unless the feed resolves to a download
    /// link.
    pub async fn run_one(&self, language: &LanguageCode) -> Result<FetchReport, PipelineError> {
        let feed = resolve_feed(self.source, language)
            .await
            .map_err(|source| PipelineError::Resolve {
                language: language.clone(),
                source,
            })?;
        let (url, file_name) =
            feed.download_target()
                .ok_or_else(|| PipelineError::MissingDownloadLink {
                    language: language.clone(),
                })?;
        if !file_name.is_plain() {
            return Err(PipelineError::UnsafeFileName {
                language: language.clone(),
                file_name: file_name.clone(),
            });
        }

        let archive_path = self.output_dir.join(file_name.as_ref());
        let transfer = download_archive(self.source, url, &archive_path, self.progress.as_ref())
            .await
            .map_err(|source| PipelineError::Transfer {
                language: language.clone(),
                source,
            })?;
        info!(
            "{language}: downloaded {} bytes to {}",
            transfer.size_on_disk,
            transfer.output_path.display()
        );

        let output_path = self.output_dir.join(language.sql_file_name());
        let progress = Arc::clone(&self.progress);
        let archive = transfer.output_path.clone();
        let target = output_path.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            extract_archive(&archive, &target, progress.as_ref())
        })
        .await
        .map_err(|source| PipelineError::ExtractTask {
            language: language.clone(),
            source,
        })?
        .map_err(|source| PipelineError::Extract {
            language: language.clone(),
            source,
        })?;
        info!(
            "{language}: extracted {} bytes to {}",
            extracted.bytes_written,
            output_path.display()
        );

        let report = FetchReport {
            language: language.clone(),
            feed,
            transfer,
            extracted,
        };
        if let Some(log) = self.log {
            log.record(&report).map_err(|source| PipelineError::Log {
                language: language.clone(),
                source,
            })?;
        }
        Ok(report)
    }

    /// Fetch every language in order, one at a time.
    ///
    /// A failure is logged and recorded in the returned outcomes; the
    /// remaining languages are still attempted.
    pub async fn run_all(&self, languages: &[LanguageCode]) -> Vec<LanguageOutcome> {
        let total = languages.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, language) in languages.iter().enumerate() {
            self.progress
                .language_started(index.saturating_add(1), total, language);
            let result = self.run_one(language).await;
            if let Err(err) = &result {
                warn!("{err}");
            }
            outcomes.push(LanguageOutcome {
                language: language.clone(),
                result,
            });
        }
        outcomes
    }
}
