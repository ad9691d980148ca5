//! Structured extraction from topic directory and topic pages.
//!
//! Both page kinds list their entries as several independently located tag
//! collections that are paired by position. Every extractor checks that the
//! collections line up before pairing anything.

mod repos;
mod topics;

use scraper::{ElementRef, Selector};
use url::Url;

use topicscrape_shared::{Result, SelectorsConfig, TagClass, TopicScrapeError};

pub use repos::extract_repos;
pub use topics::extract_topics;

// ---------------------------------------------------------------------------
// Compiled selectors
// ---------------------------------------------------------------------------

/// CSS selectors compiled from [`SelectorsConfig`].
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub(crate) topic_title: Selector,
    pub(crate) topic_description: Selector,
    pub(crate) topic_link: Selector,
    pub(crate) repo_heading: Selector,
    pub(crate) star_counter: Selector,
    pub(crate) anchor: Selector,
}

impl PageSelectors {
    /// Compile every configured tag/class pair.
    pub fn compile(config: &SelectorsConfig) -> Result<Self> {
        Ok(Self {
            topic_title: compile_tag_class(&config.topic_title)?,
            topic_description: compile_tag_class(&config.topic_description)?,
            topic_link: compile_tag_class(&config.topic_link)?,
            repo_heading: compile_tag_class(&config.repo_heading)?,
            star_counter: compile_tag_class(&config.star_counter)?,
            anchor: compile("a")?,
        })
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self::compile(&SelectorsConfig::default()).expect("default selectors are valid CSS")
    }
}

fn compile_tag_class(tag_class: &TagClass) -> Result<Selector> {
    compile(&tag_class.css())
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| TopicScrapeError::config(format!("invalid selector '{css}': {e:?}")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Text content of an element with surrounding whitespace removed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Read the `href` of a link, failing if it is absent.
pub(crate) fn href<'a>(el: ElementRef<'a>, what: &str) -> Result<&'a str> {
    el.value()
        .attr("href")
        .ok_or_else(|| TopicScrapeError::extraction(format!("{what} has no href attribute")))
}

/// Resolve a link found on the page against the site origin.
pub(crate) fn resolve(base_url: &Url, href: &str) -> Result<String> {
    base_url
        .join(href.trim())
        .map(String::from)
        .map_err(|e| TopicScrapeError::extraction(format!("unresolvable link '{href}': {e}")))
}

/// Fail unless the positionally paired collections have the same length.
pub(crate) fn ensure_aligned(lengths: &[(&str, usize)]) -> Result<usize> {
    let Some(&(_, expected)) = lengths.first() else {
        return Ok(0);
    };
    if lengths.iter().all(|&(_, n)| n == expected) {
        return Ok(expected);
    }

    let found = lengths
        .iter()
        .map(|(what, n)| format!("{n} {what}"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(TopicScrapeError::extraction(format!(
        "misaligned tag collections: found {found}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selectors_compile() {
        let _ = PageSelectors::default();
    }

    #[test]
    fn alignment_check() {
        assert_eq!(ensure_aligned(&[("titles", 3), ("links", 3)]).unwrap(), 3);

        let err = ensure_aligned(&[("headings", 2), ("star counters", 1)]).unwrap_err();
        assert!(matches!(err, TopicScrapeError::Extraction { .. }));
        assert!(err.to_string().contains("2 headings, 1 star counters"));
    }

    #[test]
    fn resolve_relative_and_absolute_links() {
        let base = Url::parse("https://github.com").unwrap();
        assert_eq!(
            resolve(&base, "/mrdoob/three.js").unwrap(),
            "https://github.com/mrdoob/three.js"
        );
        assert_eq!(
            resolve(&base, "https://example.com/x").unwrap(),
            "https://example.com/x"
        );
    }
}
