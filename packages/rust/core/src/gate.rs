//! Persistence gate: the single place that decides whether a topic needs work.
//!
//! Per topic the gate walks an explicit state machine:
//!
//! ```text
//! Unseen ──▶ Skipped                       (record file already present)
//!   │
//!   └──▶ Fetching ──▶ Extracted ──▶ Written
//!           │             │
//!           └─────────────┴──▶ Failed
//! ```
//!
//! The existence check and the write are not guarded against a concurrent
//! external writer; runs are strictly sequential within one process.

use std::path::Path;

use tracing::{debug, info, instrument};
use url::Url;

use topicscrape_crawler::{PageFetcher, PageSelectors, extract_repos};
use topicscrape_shared::{Result, TopicRecordSet, TopicRef, TopicScrapeError};
use topicscrape_storage::RecordStore;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle of a single topic within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
    Unseen,
    Skipped,
    Fetching,
    Extracted,
    Written,
    Failed,
}

impl TopicState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: TopicState) -> bool {
        use TopicState::*;
        matches!(
            (self, next),
            (Unseen, Skipped)
                | (Unseen, Fetching)
                | (Fetching, Extracted)
                | (Fetching, Failed)
                | (Extracted, Written)
                | (Extracted, Failed)
        )
    }

    /// `Skipped`, `Written` and `Failed` end a topic's walk.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Written | Self::Failed)
    }
}

/// Current state of one topic, logging every transition.
struct TopicTracker<'a> {
    title: &'a str,
    state: TopicState,
}

impl<'a> TopicTracker<'a> {
    fn new(title: &'a str) -> Self {
        Self {
            title,
            state: TopicState::Unseen,
        }
    }

    fn advance(&mut self, next: TopicState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal topic transition {:?} -> {next:?}",
            self.state
        );
        debug!(topic = self.title, from = ?self.state, to = ?next, "topic state");
        self.state = next;
    }
}

/// Successful end state of a gate call. Failures are returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// A record file already existed; nothing was fetched.
    Skipped,
    /// The topic page was scraped and `rows` records written.
    Written { rows: usize },
}

impl GateOutcome {
    pub fn state(self) -> TopicState {
        match self {
            Self::Skipped => TopicState::Skipped,
            Self::Written { .. } => TopicState::Written,
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Fetches, extracts and persists a topic unless its record file exists.
#[derive(Debug, Clone)]
pub struct PersistenceGate {
    fetcher: PageFetcher,
    selectors: PageSelectors,
    store: RecordStore,
    base_url: Url,
}

impl PersistenceGate {
    pub fn new(
        fetcher: PageFetcher,
        selectors: PageSelectors,
        store: RecordStore,
        base_url: Url,
    ) -> Self {
        Self {
            fetcher,
            selectors,
            store,
            base_url,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Make sure `topic` is persisted at `output_path`.
    ///
    /// An existing file short-circuits to [`GateOutcome::Skipped`] without any
    /// network access. Otherwise the topic page is fetched and extracted, and
    /// the whole record set is written in one atomic step; any error leaves no
    /// file behind.
    #[instrument(skip_all, fields(topic = %topic.title))]
    pub async fn ensure_topic_persisted(
        &self,
        topic: &TopicRef,
        output_path: &Path,
    ) -> Result<GateOutcome> {
        let mut tracker = TopicTracker::new(&topic.title);

        if self.store.exists(output_path) {
            tracker.advance(TopicState::Skipped);
            info!(path = %output_path.display(), "record file already exists, skipping");
            return Ok(GateOutcome::Skipped);
        }

        tracker.advance(TopicState::Fetching);
        let result = self.scrape_and_write(topic, output_path, &mut tracker).await;
        if result.is_err() {
            tracker.advance(TopicState::Failed);
        }
        result
    }

    async fn scrape_and_write(
        &self,
        topic: &TopicRef,
        output_path: &Path,
        tracker: &mut TopicTracker<'_>,
    ) -> Result<GateOutcome> {
        let url = Url::parse(&topic.url).map_err(|e| {
            TopicScrapeError::validation(format!("invalid topic URL '{}': {e}", topic.url))
        })?;

        let records = {
            let doc = self.fetcher.fetch(&url).await?;
            extract_repos(&doc, &self.base_url, &self.selectors)?
        };
        tracker.advance(TopicState::Extracted);

        let set = TopicRecordSet::new(topic.clone(), records);
        let rows = self.store.write(output_path, &set)?;
        tracker.advance(TopicState::Written);

        Ok(GateOutcome::Written { rows })
    }
}
