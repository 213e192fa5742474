//! Flatten the harvested tree into the single delimited corpus file.
//!
//! Each qualifying file becomes one record:
//!
//! ```text
//! \n\n### FILE: <basename> (<ext>) ###\n<raw content>\n<|endoftext|>\n
//! ```
//!
//! Files are visited in file-name order at every directory level, so the
//! record order is `(category, owner, repo, relative path)` lexicographic and
//! the output is identical across runs and platforms for the same tree. The
//! destination is rewritten as a whole through a temporary file in the same
//! directory. Symbolic links are not followed, so a symlinked file is never
//! merged; the harvested tree does not contain any.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::filter::ContentFilter;

/// End-of-document marker the training collaborator splits on.
pub const END_OF_TEXT: &str = "<|endoftext|>";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Files written to the corpus.
    pub merged: usize,
    /// Files that qualified but could not be read, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Merged files whose content already contains [`END_OF_TEXT`].
    pub delimiter_collisions: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("cannot write corpus file {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One corpus record for a file named `basename`.
pub fn render_record(basename: &str, content: &str) -> String {
    format!(
        "\n\n### FILE: {basename} ({ext}) ###\n{content}\n{END_OF_TEXT}\n",
        ext = extension_of(basename)
    )
}

/// Final dot-suffix including the dot, or empty when there is none.
fn extension_of(basename: &str) -> String {
    Path::new(basename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Merge `config.output_dir` into `config.corpus_path`.
pub fn merge_corpus(config: &Config) -> Result<MergeReport, MergeError> {
    let filter = ContentFilter::from_config(config);
    merge(&config.output_dir, &config.corpus_path, &filter)
}

/// Merge every file under `local_root` whose name passes `filter` into `destination`.
pub fn merge(
    local_root: &Path,
    destination: &Path,
    filter: &ContentFilter,
) -> Result<MergeReport, MergeError> {
    info!(
        root = %local_root.display(),
        destination = %destination.display(),
        "Processing data"
    );
    let destination_error = |source: std::io::Error| MergeError::Destination {
        path: destination.to_path_buf(),
        source,
    };

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(destination_error)?;
    let tmp = NamedTempFile::new_in(&parent).map_err(destination_error)?;
    let mut out = BufWriter::new(tmp);

    let mut report = MergeReport::default();
    if !local_root.exists() {
        warn!(root = %local_root.display(), "Harvest root does not exist, writing empty corpus");
    } else {
        for entry in WalkDir::new(local_root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.path() == destination {
                continue;
            }
            let basename = entry.file_name().to_string_lossy();
            if !filter.qualifies_by_extension(&basename) {
                continue;
            }
            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping file");
                    report.skipped.push((entry.path().to_path_buf(), e.to_string()));
                    continue;
                }
            };
            if content.contains(END_OF_TEXT) {
                warn!(path = %entry.path().display(), "File content contains the end-of-text marker");
                report.delimiter_collisions += 1;
            }
            out.write_all(render_record(&basename, &content).as_bytes())
                .map_err(destination_error)?;
            report.merged += 1;
            debug!(path = %entry.path().display(), "Merged file");
        }
    }

    let tmp = out
        .into_inner()
        .map_err(|e| destination_error(e.into_error()))?;
    tmp.persist(destination)
        .map_err(|e| destination_error(e.error))?;

    info!(
        merged = report.merged,
        skipped = report.skipped.len(),
        destination = %destination.display(),
        "Preprocessing complete"
    );
    Ok(report)
}
