//! Core domain types for topic directories and repository listings.

use serde::{Deserialize, Serialize};

use crate::error::TopicScrapeError;

/// Column names of a topic record file, in output order.
pub const RECORD_COLUMNS: [&str; 4] = ["username", "repo_name", "stars", "repo_url"];

// ---------------------------------------------------------------------------
// TopicRef
// ---------------------------------------------------------------------------

/// One entry of the topic directory page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    /// Display title, e.g. `3D`. Never empty.
    pub title: String,
    /// Short description shown under the title.
    pub description: String,
    /// Absolute URL of the topic page.
    pub url: String,
}

// ---------------------------------------------------------------------------
// RepositoryRecord
// ---------------------------------------------------------------------------

/// A single repository row extracted from a topic page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Owner (user or organisation) display name.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Exact star count after expanding abbreviations like `90.5k`.
    pub star_count: u64,
    /// Absolute repository URL.
    pub url: String,
}

impl RepositoryRecord {
    /// Render the record as output cells in [`RECORD_COLUMNS`] order.
    pub fn to_row(&self) -> [String; 4] {
        [
            self.owner.clone(),
            self.name.clone(),
            self.star_count.to_string(),
            self.url.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// TopicRecordSet
// ---------------------------------------------------------------------------

/// The ordered repositories of one topic, in source document order.
///
/// Built whole by the extractor and handed to the writer in one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecordSet {
    /// The topic these repositories were listed under.
    pub topic: TopicRef,
    /// Repositories in page order; this is the row order of the output file.
    pub records: Vec<RepositoryRecord>,
}

impl TopicRecordSet {
    pub fn new(topic: TopicRef, records: Vec<RepositoryRecord>) -> Self {
        Self { topic, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Delimited text format used for topic record files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
}

impl OutputFormat {
    /// Field separator.
    pub fn delimiter(self) -> char {
        match self {
            Self::Csv => ',',
            Self::Tsv => '\t',
        }
    }

    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = TopicScrapeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            other => Err(TopicScrapeError::validation(format!(
                "unknown output format '{other}' (expected csv or tsv)"
            ))),
        }
    }
}
