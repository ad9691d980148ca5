//! End-to-end run: topic directory → per-topic gate → record files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use topicscrape_crawler::{PageFetcher, PageSelectors, extract_topics};
use topicscrape_shared::{Result, ScrapeConfig, TopicRef, TopicScrapeError};
use topicscrape_storage::RecordStore;

use crate::gate::{GateOutcome, PersistenceGate, TopicState};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// How a topic ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicStatus {
    Skipped,
    Written { rows: usize },
    Failed { error: String },
}

impl TopicStatus {
    pub fn state(&self) -> TopicState {
        match self {
            Self::Skipped => TopicState::Skipped,
            Self::Written { .. } => TopicState::Written,
            Self::Failed { .. } => TopicState::Failed,
        }
    }
}

impl From<GateOutcome> for TopicStatus {
    fn from(outcome: GateOutcome) -> Self {
        match outcome {
            GateOutcome::Skipped => Self::Skipped,
            GateOutcome::Written { rows } => Self::Written { rows },
        }
    }
}

/// Result of one topic within a run.
#[derive(Debug, Clone)]
pub struct TopicReport {
    /// Topic title as shown on the directory page.
    pub title: String,
    /// Record file path for this topic.
    pub path: PathBuf,
    pub status: TopicStatus,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Per-topic results, in directory order.
    pub topics: Vec<TopicReport>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl RunReport {
    fn count(&self, state: TopicState) -> usize {
        self.topics
            .iter()
            .filter(|t| t.status.state() == state)
            .count()
    }

    pub fn written(&self) -> usize {
        self.count(TopicState::Written)
    }

    pub fn skipped(&self) -> usize {
        self.count(TopicState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(TopicState::Failed)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a topic is handed to the gate.
    fn topic_started(&self, title: &str, current: usize, total: usize);
    /// Called after a topic reached a terminal state.
    fn topic_finished(&self, report: &TopicReport);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn topic_started(&self, _title: &str, _current: usize, _total: usize) {}
    fn topic_finished(&self, _report: &TopicReport) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one sequential pass over the topic directory.
pub struct Orchestrator {
    config: ScrapeConfig,
    fetcher: PageFetcher,
    selectors: PageSelectors,
    gate: PersistenceGate,
}

impl Orchestrator {
    /// Build the HTTP client, selectors and record store from `config`.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let fetcher = PageFetcher::from_config(&config)?;
        let selectors = PageSelectors::compile(&config.selectors)?;
        let store = RecordStore::new(&config.output_dir, config.format);
        let gate = PersistenceGate::new(
            fetcher.clone(),
            selectors.clone(),
            store,
            config.base_url.clone(),
        );

        Ok(Self {
            config,
            fetcher,
            selectors,
            gate,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Fetch the directory page and extract its topics.
    pub async fn fetch_directory(&self) -> Result<Vec<TopicRef>> {
        let doc = self.fetcher.fetch(&self.config.directory_url).await?;
        extract_topics(&doc, &self.config.base_url, &self.selectors)
    }

    /// Run the full pass.
    ///
    /// A directory failure aborts the run. Per-topic failures are logged,
    /// recorded in the report, and the loop moves on to the next topic.
    /// A topic whose record path was already claimed earlier in the same run
    /// (duplicate title, or titles that sanitize alike) fails without being
    /// handed to the gate.
    #[instrument(skip_all, fields(directory = %self.config.directory_url))]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunReport> {
        let start = Instant::now();

        info!("scraping list of topics");
        progress.phase("Fetching topic directory");
        let topics = self.fetch_directory().await?;
        info!(count = topics.len(), "topic directory loaded");

        let store = self.gate.store();
        store.ensure_root()?;

        progress.phase("Scraping topics");
        let total = topics.len();
        let mut reports = Vec::with_capacity(total);
        let mut claimed: HashMap<PathBuf, &str> = HashMap::with_capacity(total);

        for (i, topic) in topics.iter().enumerate() {
            progress.topic_started(&topic.title, i + 1, total);
            info!(topic = %topic.title, "scraping top repositories");

            let path = store.path_for(&topic.title);
            let gated = match claimed.get(&path) {
                Some(owner) => Err(TopicScrapeError::validation(format!(
                    "record file {} is already claimed by topic '{owner}' in this run",
                    path.display()
                ))),
                None => {
                    claimed.insert(path.clone(), topic.title.as_str());
                    self.gate.ensure_topic_persisted(topic, &path).await
                }
            };
            let status = match gated {
                Ok(outcome) => outcome.into(),
                Err(e) => {
                    warn!(topic = %topic.title, error = %e, "topic failed, continuing");
                    TopicStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            let report = TopicReport {
                title: topic.title.clone(),
                path,
                status,
            };
            progress.topic_finished(&report);
            reports.push(report);
        }

        let report = RunReport {
            topics: reports,
            elapsed: start.elapsed(),
        };

        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            duration_ms = report.elapsed.as_millis(),
            "run completed"
        );
        progress.done(&report);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use topicscrape_shared::AppConfig;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DIRECTORY: &str = r#"<html><body>
        <a class="no-underline flex-1 d-flex flex-column" href="/topics/3d">
            <p class="f3 lh-condensed mb-0 mt-1 Link--primary">3D</p>
            <p class="f5 color-fg-muted mb-0 mt-1">Three dimensions</p>
        </a>
        <a class="no-underline flex-1 d-flex flex-column" href="/topics/ajax">
            <p class="f3 lh-condensed mb-0 mt-1 Link--primary">Ajax</p>
            <p class="f5 color-fg-muted mb-0 mt-1">Asynchronous requests</p>
        </a>
    </body></html>"#;

    fn repo(owner: &str, name: &str, stars: &str) -> String {
        format!(
            r#"<h3 class="f3 color-fg-muted text-normal lh-condensed">
                <a href="/{owner}">{owner}</a> / <a href="/{owner}/{name}">{name}</a>
            </h3>
            <span class="Counter js-social-count">{stars}</span>"#
        )
    }

    fn topic_page(repos: &[String]) -> String {
        format!("<html><body>{}</body></html>", repos.concat())
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ts-run-test-{}", Uuid::now_v7()))
    }

    fn orchestrator(server: &MockServer, out: &Path) -> Orchestrator {
        let mut app = AppConfig::default();
        app.source.base_url = server.uri();
        app.defaults.output_dir = out.to_string_lossy().into_owned();
        app.http.timeout_secs = 5;
        Orchestrator::new(ScrapeConfig::try_from(&app).unwrap()).unwrap()
    }

    async fn mount(server: &MockServer, route: &str, body: String, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn end_to_end_writes_one_file_per_topic() {
        let server = MockServer::start().await;
        mount(&server, "/topics", DIRECTORY.to_string(), 1).await;
        mount(&server, "/topics/3d", topic_page(&[repo("mrdoob", "three.js", "90.5k")]), 1).await;
        mount(
            &server,
            "/topics/ajax",
            topic_page(&[repo("jquery", "jquery", "59k"), repo("axios", "axios", "1.2k")]),
            1,
        )
        .await;

        let dir = temp_dir();
        let report = orchestrator(&server, &dir).run(&SilentProgress).await.unwrap();

        assert_eq!(report.written(), 2);
        assert_eq!(report.failed(), 0);

        let three_d = std::fs::read_to_string(dir.join("3D.csv")).unwrap();
        assert_eq!(
            three_d,
            format!(
                "username,repo_name,stars,repo_url\nmrdoob,three.js,90500,{}/mrdoob/three.js\n",
                server.uri()
            )
        );

        // Rows follow page order.
        let ajax = std::fs::read_to_string(dir.join("Ajax.csv")).unwrap();
        let names: Vec<&str> = ajax
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(names, ["jquery", "axios"]);
        assert!(ajax.contains(",1200,"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn second_run_skips_everything_and_changes_nothing() {
        let server = MockServer::start().await;
        mount(&server, "/topics", DIRECTORY.to_string(), 2).await;
        mount(&server, "/topics/3d", topic_page(&[repo("mrdoob", "three.js", "90.5k")]), 1).await;
        mount(&server, "/topics/ajax", topic_page(&[repo("jquery", "jquery", "59k")]), 1).await;

        let dir = temp_dir();
        let orchestrator = orchestrator(&server, &dir);

        let first = orchestrator.run(&SilentProgress).await.unwrap();
        assert_eq!(first.written(), 2);
        let before = (
            std::fs::read(dir.join("3D.csv")).unwrap(),
            std::fs::read(dir.join("Ajax.csv")).unwrap(),
        );

        let second = orchestrator.run(&SilentProgress).await.unwrap();
        assert_eq!(second.skipped(), 2);
        assert!(second.topics.iter().all(|t| t.status == TopicStatus::Skipped));

        let after = (
            std::fs::read(dir.join("3D.csv")).unwrap(),
            std::fs::read(dir.join("Ajax.csv")).unwrap(),
        );
        assert_eq!(before, after);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn topic_failures_do_not_stop_the_run() {
        let server = MockServer::start().await;
        mount(&server, "/topics", DIRECTORY.to_string(), 1).await;
        Mock::given(method("GET"))
            .and(path("/topics/3d"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount(&server, "/topics/ajax", topic_page(&[repo("jquery", "jquery", "59k")]), 1).await;

        let dir = temp_dir();
        let report = orchestrator(&server, &dir).run(&SilentProgress).await.unwrap();

        assert_eq!(report.topics.len(), 2);
        assert_eq!(report.topics[0].title, "3D");
        assert!(matches!(report.topics[0].status, TopicStatus::Failed { .. }));
        assert_eq!(report.topics[1].status, TopicStatus::Written { rows: 1 });
        assert!(!dir.join("3D.csv").exists());
        assert!(dir.join("Ajax.csv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn misaligned_topic_page_writes_nothing() {
        let server = MockServer::start().await;
        mount(&server, "/topics", DIRECTORY.to_string(), 1).await;
        let mut broken = topic_page(&[repo("mrdoob", "three.js", "90.5k")]);
        broken = broken.replace(
            "</body>",
            r#"<span class="Counter js-social-count">12</span></body>"#,
        );
        mount(&server, "/topics/3d", broken, 1).await;
        mount(&server, "/topics/ajax", topic_page(&[repo("bad", "stars", "lots")]), 1).await;

        let dir = temp_dir();
        let report = orchestrator(&server, &dir).run(&SilentProgress).await.unwrap();

        assert_eq!(report.failed(), 2);
        match &report.topics[0].status {
            TopicStatus::Failed { error } => assert!(error.contains("misaligned")),
            other => panic!("expected failure, got {other:?}"),
        }
        match &report.topics[1].status {
            TopicStatus::Failed { error } => assert!(error.contains("format error")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!dir.join("3D.csv").exists());
        assert!(!dir.join("Ajax.csv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn colliding_file_names_fail_the_later_topic() {
        let server = MockServer::start().await;
        let directory = r#"<html><body>
            <a class="no-underline flex-1 d-flex flex-column" href="/topics/tcp-ip">
                <p class="f3 lh-condensed mb-0 mt-1 Link--primary">TCP/IP</p>
                <p class="f5 color-fg-muted mb-0 mt-1">Slash spelling</p>
            </a>
            <a class="no-underline flex-1 d-flex flex-column" href="/topics/tcp-ip-2">
                <p class="f3 lh-condensed mb-0 mt-1 Link--primary">TCP:IP</p>
                <p class="f5 color-fg-muted mb-0 mt-1">Colon spelling</p>
            </a>
        </body></html>"#;
        mount(&server, "/topics", directory.to_string(), 1).await;
        mount(&server, "/topics/tcp-ip", topic_page(&[repo("first", "r", "1")]), 1).await;
        mount(&server, "/topics/tcp-ip-2", topic_page(&[repo("second", "r", "2")]), 0).await;

        let dir = temp_dir();
        let report = orchestrator(&server, &dir).run(&SilentProgress).await.unwrap();

        assert_eq!(report.topics.len(), 2);
        assert_eq!(report.topics[0].status, TopicStatus::Written { rows: 1 });
        assert_eq!(report.topics[0].path, report.topics[1].path);
        match &report.topics[1].status {
            TopicStatus::Failed { error } => {
                assert!(error.contains("validation error"));
                assert!(error.contains("TCP/IP"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(report.skipped(), 0);

        let text = std::fs::read_to_string(dir.join("TCP_IP.csv")).unwrap();
        assert!(text.contains("first,r,1,"));
        assert!(!text.contains("second"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn directory_failure_aborts_the_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let err = orchestrator(&server, &dir)
            .run(&SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, TopicScrapeError::Fetch { .. }));
        assert!(!dir.exists());
    }
}
