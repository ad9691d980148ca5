//! Shared types, error model, and configuration for topicscrape.
//!
//! This crate is the foundation depended on by all other topicscrape crates.
//! It provides:
//! - [`TopicScrapeError`], the unified error type
//! - Domain types ([`TopicRef`], [`RepositoryRecord`], [`TopicRecordSet`], [`OutputFormat`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HttpConfig, ScrapeConfig, SelectorsConfig, SourceConfig,
    TagClass, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TopicScrapeError};
pub use types::{OutputFormat, RECORD_COLUMNS, RepositoryRecord, TopicRecordSet, TopicRef};
