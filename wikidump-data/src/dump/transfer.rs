use log::info;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use super::progress::{ProgressReporter, Stage};
use super::source::{ArchiveSink, DumpSource};
use super::{DumpUrl, TransferError, TransferReport};

/// Largest slice of the response body written between progress updates.
pub const TRANSFER_CHUNK_SIZE: usize = 8 * 1024;

/// Stream the archive at `url` into `output_path`.
///
/// Any existing file is truncated. The parent directory is created when
/// missing. A transfer that fails mid-stream leaves the partial file in place.
/// The reported `size_on_disk` is re-read from the filesystem once the stream
/// completes and is the size later stages rely on.
///
/// # Examples
/// ```
/// # use tempfile::tempdir;
/// # use wikidump_data::dump::{
/// #     block_on_for_tests, download_archive, DumpUrl, SilentProgress, StubSource,
/// # };
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = DumpUrl::new("https://example.org/abwiki-20240101.sql.gz");
/// let source = StubSource::default().with_archive(&url, b"archive".to_vec());
/// let temp = tempdir()?;
/// let output = temp.path().join("abwiki-20240101.sql.gz");
/// let report = block_on_for_tests(download_archive(&source, &url, &output, &SilentProgress))?;
/// assert_eq!(report.size_on_disk, 7);
/// # Ok(())
/// # }
/// # example().expect("example should run");
/// ```
pub async fn download_archive<S: DumpSource + ?Sized>(
    source: &S,
    url: &DumpUrl,
    output_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<TransferReport, TransferError> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| TransferError::CreateDir {
            source,
            path: parent.to_path_buf(),
        })?;
    }
    let file = File::create(output_path).map_err(|source| TransferError::Write {
        source,
        path: output_path.to_path_buf(),
    })?;
    let mut sink = FileSink {
        file,
        path: output_path.to_path_buf(),
        progress,
        declared_length: None,
        written: 0,
    };
    info!("downloading {url} to {}", output_path.display());
    let bytes_received = source.download_archive(url, &mut sink).await?;
    let declared_length = sink.finish()?;
    let size_on_disk = fs::metadata(output_path)
        .map_err(|source| TransferError::Write {
            source,
            path: output_path.to_path_buf(),
        })?
        .len();
    progress.stage_finished(Stage::Download);
    Ok(TransferReport {
        url: url.clone(),
        output_path: output_path.to_path_buf(),
        declared_length,
        bytes_received,
        size_on_disk,
    })
}

struct FileSink<'a> {
    file: File,
    path: PathBuf,
    progress: &'a dyn ProgressReporter,
    declared_length: Option<u64>,
    written: u64,
}

impl FileSink<'_> {
    fn finish(mut self) -> Result<Option<u64>, TransferError> {
        self.file.flush().map_err(|source| TransferError::Write {
            source,
            path: self.path.clone(),
        })?;
        Ok(self.declared_length)
    }
}

impl ArchiveSink for FileSink<'_> {
    fn begin(&mut self, content_length: Option<u64>) {
        // Servers that omit the header report zero; treat that as unknown.
        self.declared_length = content_length.filter(|length| *length > 0);
        self.progress
            .stage_started(Stage::Download, self.declared_length);
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), TransferError> {
        for piece in chunk.chunks(TRANSFER_CHUNK_SIZE) {
            self.file
                .write_all(piece)
                .map_err(|source| TransferError::Write {
                    source,
                    path: self.path.clone(),
                })?;
            self.written = self.written.saturating_add(piece.len() as u64);
            self.progress.stage_advanced(Stage::Download, self.written);
        }
        Ok(())
    }
}
