//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use topicscrape_core::{
    Orchestrator, ProgressReporter, RunReport, TopicReport, TopicStatus,
};
use topicscrape_shared::{
    AppConfig, OutputFormat, ScrapeConfig, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// topicscrape: top repositories per GitHub topic, one record file each.
#[derive(Parser)]
#[command(
    name = "topicscrape",
    version,
    about = "Scrape GitHub topic pages into one CSV/TSV file of top repositories per topic.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.topicscrape/topicscrape.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape every topic that has no record file yet.
    Run {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the topic directory without writing anything.
    Topics {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags that override config file values.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct Overrides {
    /// Output directory for record files.
    #[arg(short, long)]
    pub out: Option<String>,

    /// Record file format: csv or tsv.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Site origin (e.g. https://github.com).
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(out) = &self.out {
            config.defaults.output_dir = out.clone();
        }
        if let Some(format) = self.format {
            config.defaults.format = format;
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "topicscrape=info",
        1 => "topicscrape=debug",
        _ => "topicscrape=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run { overrides } => cmd_run(config_path, &overrides).await,
        Command::Topics { json, overrides } => cmd_topics(config_path, &overrides, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

/// Load the config file (explicit path or default location).
fn load_app_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(&p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge config file and CLI flags into the runtime scrape config.
fn resolve_config(path: Option<PathBuf>, overrides: &Overrides) -> Result<ScrapeConfig> {
    let mut config = load_app_config(path)?;
    overrides.apply(&mut config);
    Ok(ScrapeConfig::try_from(&config)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;

    info!(
        directory = %config.directory_url,
        output_dir = %config.output_dir.display(),
        format = %config.format,
        "starting run"
    );

    let orchestrator = Orchestrator::new(config)?;
    let reporter = CliProgress::new();
    let report = orchestrator.run(&reporter).await?;

    println!();
    println!("  Topics:  {}", report.topics.len());
    println!("  Written: {}", report.written());
    println!("  Skipped: {}", report.skipped());
    println!("  Failed:  {}", report.failed());
    println!("  Output:  {}", orchestrator.config().output_dir.display());
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());

    let failures: Vec<_> = report
        .topics
        .iter()
        .filter_map(|t| match &t.status {
            TopicStatus::Failed { error } => Some((t.title.as_str(), error.as_str())),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("  Failed topics:");
        for (title, error) in failures {
            println!("    {title}: {error}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_topics(config_path: Option<PathBuf>, overrides: &Overrides, json: bool) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;
    let orchestrator = Orchestrator::new(config)?;
    let topics = orchestrator.fetch_directory().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&topics)?);
        return Ok(());
    }

    for (i, topic) in topics.iter().enumerate() {
        println!("{:>3}. {}  {}", i + 1, topic.title, topic.url);
        if !topic.description.is_empty() {
            println!("     {}", truncate(&topic.description, 96));
        }
    }
    println!("\n{} topics", topics.len());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{truncated}...")
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn topic_started(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scraping [{current}/{total}] {title}"));
    }

    fn topic_finished(&self, report: &TopicReport) {
        if let TopicStatus::Failed { error } = &report.status {
            self.spinner
                .suspend(|| eprintln!("  ! {}: {error}", report.title));
        }
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "topicscrape",
            "-v",
            "run",
            "--out",
            "/tmp/topics",
            "--format",
            "tsv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Run { overrides } => {
                assert_eq!(overrides.out.as_deref(), Some("/tmp/topics"));
                assert_eq!(overrides.format, Some(OutputFormat::Tsv));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let overrides = Overrides {
            out: Some("out".into()),
            format: Some(OutputFormat::Tsv),
            base_url: Some("https://example.com".into()),
        };
        overrides.apply(&mut config);

        let scrape = ScrapeConfig::try_from(&config).unwrap();
        assert_eq!(scrape.output_dir, PathBuf::from("out"));
        assert_eq!(scrape.format, OutputFormat::Tsv);
        assert_eq!(scrape.directory_url.as_str(), "https://example.com/topics");
    }

    #[test]
    fn empty_overrides_keep_defaults() {
        let mut config = AppConfig::default();
        Overrides::default().apply(&mut config);
        assert_eq!(config.defaults.output_dir, "data");
        assert_eq!(config.source.base_url, "https://github.com");
    }

    #[test]
    fn truncate_long_descriptions() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
