//! Page fetching and structured extraction for topic pages.
//!
//! This crate provides:
//! - [`PageFetcher`], the HTTP leaf returning parsed documents
//! - [`parse_count`], star-count normalization (`90.5k` to `90500`)
//! - [`extract_topics`] and [`extract_repos`], the two page extractors

pub mod count;
pub mod extract;
pub mod fetch;

pub use count::parse_count;
pub use extract::{PageSelectors, extract_repos, extract_topics};
pub use fetch::PageFetcher;
