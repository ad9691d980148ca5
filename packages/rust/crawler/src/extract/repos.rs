//! Repository list extraction from a single topic page.

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use topicscrape_shared::{RepositoryRecord, Result, TopicScrapeError};

use super::{PageSelectors, element_text, ensure_aligned, href, resolve};
use crate::count::parse_count;

/// Extract the ordered repository list from a topic page.
///
/// Each repository heading holds two links (owner, then repository) and is
/// paired by position with a star counter. Misaligned or missing collections,
/// a heading with fewer than two links, or an unparseable star count fail the
/// whole page; no partial list is returned.
pub fn extract_repos(
    doc: &Html,
    base_url: &Url,
    selectors: &PageSelectors,
) -> Result<Vec<RepositoryRecord>> {
    let headings: Vec<_> = doc.select(&selectors.repo_heading).collect();
    let counters: Vec<_> = doc.select(&selectors.star_counter).collect();

    if headings.is_empty() {
        return Err(TopicScrapeError::extraction(
            "no repository headings found on the topic page",
        ));
    }
    if counters.is_empty() {
        return Err(TopicScrapeError::extraction(
            "no star counters found on the topic page",
        ));
    }
    ensure_aligned(&[
        ("repository headings", headings.len()),
        ("star counters", counters.len()),
    ])?;

    let records = headings
        .into_iter()
        .zip(counters)
        .enumerate()
        .map(|(i, (heading, counter))| record_from_pair(i, heading, counter, base_url, selectors))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = records.len(), "extracted repositories");
    Ok(records)
}

fn record_from_pair(
    index: usize,
    heading: ElementRef<'_>,
    counter: ElementRef<'_>,
    base_url: &Url,
    selectors: &PageSelectors,
) -> Result<RepositoryRecord> {
    let mut links = heading.select(&selectors.anchor);
    let (Some(owner_link), Some(repo_link)) = (links.next(), links.next()) else {
        return Err(TopicScrapeError::extraction(format!(
            "repository #{} heading does not contain an owner and a repository link",
            index + 1
        )));
    };

    let url = resolve(base_url, href(repo_link, "repository link")?)?;
    let star_count = parse_count(&element_text(counter))?;

    Ok(RepositoryRecord {
        owner: element_text(owner_link),
        name: element_text(repo_link),
        star_count,
        url,
    })
}
