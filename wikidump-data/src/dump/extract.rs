use flate2::read::MultiGzDecoder;
use log::info;
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use super::progress::{ProgressReporter, Stage};
use super::{ExtractedDump, ExtractionError};

/// Size of the blocks read from the decompressor.
pub const EXTRACTION_BLOCK_SIZE: usize = 1024 * 1024;

/// Decompress the gzip archive at `archive_path` into `output_path`.
///
/// Progress is reported as cumulative decompressed bytes against the
/// archive's compressed size, which only approximates the final size. The
/// destination is truncated first and left in place if decoding fails.
///
/// This performs blocking I/O; async callers should run it on a blocking
/// task.
///
/// # Examples
/// ```
/// # use flate2::{write::GzEncoder, Compression};
/// # use std::io::Write;
/// # use tempfile::tempdir;
/// # use wikidump_data::dump::{extract_archive, SilentProgress};
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let temp = tempdir()?;
/// let archive = temp.path().join("ab.sql.gz");
/// let mut encoder = GzEncoder::new(std::fs::File::create(&archive)?, Compression::default());
/// encoder.write_all(b"INSERT INTO externallinks VALUES (1);")?;
/// encoder.finish()?;
/// let output = temp.path().join("ab.sql");
/// let dump = extract_archive(&archive, &output, &SilentProgress)?;
/// assert_eq!(dump.bytes_written, 37);
/// # Ok(())
/// # }
/// # example().expect("example should run");
/// ```
pub fn extract_archive(
    archive_path: &Path,
    output_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<ExtractedDump, ExtractionError> {
    let open_error = |source: io::Error| ExtractionError::OpenArchive {
        source,
        path: archive_path.to_path_buf(),
    };
    let write_error = |source: io::Error| ExtractionError::Write {
        source,
        path: output_path.to_path_buf(),
    };

    let compressed_size = fs::metadata(archive_path).map_err(open_error)?.len();
    let archive = File::open(archive_path).map_err(open_error)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(archive));
    let mut writer = BufWriter::new(File::create(output_path).map_err(write_error)?);

    info!(
        "extracting {} to {}",
        archive_path.display(),
        output_path.display()
    );
    progress.stage_started(Stage::Extract, Some(compressed_size));
    let mut block = vec![0_u8; EXTRACTION_BLOCK_SIZE];
    let mut written = 0_u64;
    loop {
        let read = match decoder.read(&mut block) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ExtractionError::Decode {
                    source,
                    path: archive_path.to_path_buf(),
                });
            }
        };
        let data = block.get(..read).unwrap_or(&block);
        writer.write_all(data).map_err(write_error)?;
        written = written.saturating_add(data.len() as u64);
        progress.stage_advanced(Stage::Extract, written);
    }
    writer.flush().map_err(write_error)?;
    progress.stage_finished(Stage::Extract);

    Ok(ExtractedDump {
        output_path: output_path.to_path_buf(),
        bytes_written: written,
    })
}
