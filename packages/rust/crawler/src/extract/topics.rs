//! Topic directory extraction.

use scraper::Html;
use tracing::debug;
use url::Url;

use topicscrape_shared::{Result, TopicRef, TopicScrapeError};

use super::{PageSelectors, element_text, ensure_aligned, href, resolve};

/// Extract the ordered topic list from the directory page.
///
/// Titles, descriptions and link containers are located independently and
/// zipped by position, so all three collections must have the same length.
/// An empty directory is an error: without topics nothing can proceed.
pub fn extract_topics(
    doc: &Html,
    base_url: &Url,
    selectors: &PageSelectors,
) -> Result<Vec<TopicRef>> {
    let titles: Vec<String> = doc.select(&selectors.topic_title).map(element_text).collect();
    let descriptions: Vec<String> = doc
        .select(&selectors.topic_description)
        .map(element_text)
        .collect();
    let links: Vec<_> = doc.select(&selectors.topic_link).collect();

    let count = ensure_aligned(&[
        ("titles", titles.len()),
        ("descriptions", descriptions.len()),
        ("links", links.len()),
    ])?;
    if count == 0 {
        return Err(TopicScrapeError::extraction(
            "no topics found on the directory page",
        ));
    }

    let topics = titles
        .into_iter()
        .zip(descriptions)
        .zip(links)
        .enumerate()
        .map(|(i, ((title, description), link))| {
            if title.is_empty() {
                return Err(TopicScrapeError::extraction(format!(
                    "topic #{} has an empty title",
                    i + 1
                )));
            }
            let url = resolve(base_url, href(link, "topic link")?)?;
            Ok(TopicRef {
                title,
                description,
                url,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = topics.len(), "extracted topic directory");
    Ok(topics)
}
