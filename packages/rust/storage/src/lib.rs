//! Record file storage for topic repository lists.
//!
//! The [`RecordStore`] owns the output directory: it maps topic titles to
//! filesystem-safe paths, answers whether a topic is already persisted, and
//! writes record files atomically (temp file + rename).

pub mod csv;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use topicscrape_shared::{OutputFormat, Result, TopicRecordSet, TopicScrapeError};

/// Characters that are not allowed (or not portable) in file names.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[/\\:*?"<>|\x00-\x1f\x7f]"#).expect("valid filename regex")
});

/// Output directory holding one record file per topic.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
    format: OutputFormat,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    /// The output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| TopicScrapeError::io(&self.root, e))?;
        debug!(path = %self.root.display(), "output directory ready");
        Ok(())
    }

    /// Path of the record file for a topic title, e.g. `data/3D.csv`.
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_file_name(title), self.format.extension()))
    }

    /// Whether a record file already exists at `path`.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Serialize `set` and atomically replace the file at `path`.
    ///
    /// Returns the number of data rows written.
    pub fn write(&self, path: &Path, set: &TopicRecordSet) -> Result<usize> {
        let content =
            csv::to_delimited(set, self.format.delimiter()).map_err(|e| TopicScrapeError::io(path, e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| TopicScrapeError::validation(format!("not a file path: {path:?}")))?
            .to_string_lossy();
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        if let Err(e) = std::fs::write(&temp, content) {
            let _ = std::fs::remove_file(&temp);
            return Err(TopicScrapeError::io(&temp, e));
        }
        if let Err(e) = std::fs::rename(&temp, path) {
            let _ = std::fs::remove_file(&temp);
            return Err(TopicScrapeError::io(path, e));
        }

        info!(path = %path.display(), rows = set.len(), "wrote record file");
        Ok(set.len())
    }
}

/// Turn a topic title into a portable file stem.
///
/// Path separators, reserved punctuation and control characters become `_`;
/// surrounding whitespace and trailing dots are dropped. Names that end up
/// empty, `.` or `..` become `_`.
pub fn sanitize_file_name(title: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(title, "_");
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
