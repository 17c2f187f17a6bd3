//! Outbound link discovery.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn anchor_selector() -> &'static Selector {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    ANCHOR.get_or_init(|| Selector::parse("a[href]").expect("static selector parses"))
}

/// Whether an href is absolute and fetchable.
#[must_use]
pub fn is_absolute_link(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

/// Collects absolute anchor targets in document order.
///
/// Relative hrefs are ignored, never resolved. Repeated targets are kept.
#[must_use]
pub fn absolute_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(anchor_selector())
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_absolute_link(href))
        .map(String::from)
        .collect()
}

/// Applies the link budget, optionally dropping repeated targets first.
#[must_use]
pub fn select_links(links: Vec<String>, max_links: usize, dedup: bool) -> Vec<String> {
    if dedup {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter(|link| seen.insert(link.clone()))
            .take(max_links)
            .collect()
    } else {
        links.into_iter().take(max_links).collect()
    }
}
