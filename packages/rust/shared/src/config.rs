//! Application configuration for topicscrape.
//!
//! User config lives at `~/.topicscrape/topicscrape.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TopicScrapeError};
use crate::types::OutputFormat;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topicscrape.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topicscrape";

// ---------------------------------------------------------------------------
// Config structs (matching topicscrape.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Where the topic directory lives.
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Markup classes the extractors look for.
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory that receives one record file per topic.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Record file format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> String {
    "data".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Site origin; relative links on scraped pages resolve against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the topic directory page under `base_url`.
    #[serde(default = "default_directory_path")]
    pub directory_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            directory_path: default_directory_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://github.com".into()
}
fn default_directory_path() -> String {
    "/topics".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("topicscrape/", env!("CARGO_PKG_VERSION")).into()
}

/// An element name plus the exact value its `class` attribute must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagClass {
    pub tag: String,
    pub class: String,
}

impl TagClass {
    fn new(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
        }
    }

    /// CSS selector matching elements whose whole `class` attribute equals `class`.
    pub fn css(&self) -> String {
        format!(r#"{}[class="{}"]"#, self.tag, self.class)
    }

    fn validate(&self, key: &str) -> Result<()> {
        if self.tag.is_empty() || !self.tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TopicScrapeError::config(format!(
                "selectors.{key}: invalid tag name '{}'",
                self.tag
            )));
        }
        if self.class.contains('"') || self.class.contains('\\') {
            return Err(TopicScrapeError::config(format!(
                "selectors.{key}: class may not contain quotes or backslashes"
            )));
        }
        Ok(())
    }
}

/// `[selectors]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default = "default_topic_title")]
    pub topic_title: TagClass,
    #[serde(default = "default_topic_description")]
    pub topic_description: TagClass,
    #[serde(default = "default_topic_link")]
    pub topic_link: TagClass,
    /// Heading holding the owner link followed by the repository link.
    #[serde(default = "default_repo_heading")]
    pub repo_heading: TagClass,
    #[serde(default = "default_star_counter")]
    pub star_counter: TagClass,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            topic_title: default_topic_title(),
            topic_description: default_topic_description(),
            topic_link: default_topic_link(),
            repo_heading: default_repo_heading(),
            star_counter: default_star_counter(),
        }
    }
}

impl SelectorsConfig {
    /// Reject class strings that cannot be embedded in a CSS attribute selector.
    pub fn validate(&self) -> Result<()> {
        self.topic_title.validate("topic_title")?;
        self.topic_description.validate("topic_description")?;
        self.topic_link.validate("topic_link")?;
        self.repo_heading.validate("repo_heading")?;
        self.star_counter.validate("star_counter")
    }
}

fn default_topic_title() -> TagClass {
    TagClass::new("p", "f3 lh-condensed mb-0 mt-1 Link--primary")
}
fn default_topic_description() -> TagClass {
    TagClass::new("p", "f5 color-fg-muted mb-0 mt-1")
}
fn default_topic_link() -> TagClass {
    TagClass::new("a", "no-underline flex-1 d-flex flex-column")
}
fn default_repo_heading() -> TagClass {
    TagClass::new("h3", "f3 color-fg-muted text-normal lh-condensed")
}
fn default_star_counter() -> TagClass {
    TagClass::new("span", "Counter js-social-count")
}

// ---------------------------------------------------------------------------
// Scrape config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Origin that relative links resolve against.
    pub base_url: Url,
    /// The topic directory page.
    pub directory_url: Url,
    /// Where record files are written.
    pub output_dir: PathBuf,
    /// Record file format.
    pub format: OutputFormat,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Extractor selectors.
    pub selectors: SelectorsConfig,
}

impl TryFrom<&AppConfig> for ScrapeConfig {
    type Error = TopicScrapeError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.source.base_url).map_err(|e| {
            TopicScrapeError::config(format!(
                "invalid source.base_url '{}': {e}",
                config.source.base_url
            ))
        })?;
        let directory_url = base_url.join(&config.source.directory_path).map_err(|e| {
            TopicScrapeError::config(format!(
                "invalid source.directory_path '{}': {e}",
                config.source.directory_path
            ))
        })?;
        config.selectors.validate()?;

        Ok(Self {
            base_url,
            directory_url,
            output_dir: PathBuf::from(&config.defaults.output_dir),
            format: config.defaults.format,
            timeout: Duration::from_secs(config.http.timeout_secs),
            user_agent: config.http.user_agent.clone(),
            selectors: config.selectors.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topicscrape/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicScrapeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topicscrape/topicscrape.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicScrapeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TopicScrapeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicScrapeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicScrapeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicScrapeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
