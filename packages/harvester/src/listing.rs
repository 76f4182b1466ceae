//! Discovery of statutes from the portal's paginated browse endpoint.
//!
//! The portal has shipped two listing skins: a data table paged by page
//! number and a generic item list paged by entry offset. Each is a
//! [`ListingStrategy`]; [`strategy_for`] picks one from configuration and
//! [`discover`] drives it page by page until the listing runs dry, the
//! "next page" signal disappears, or `max_pages` is reached. A page that
//! cannot be fetched fails the whole crawl, so a partial listing is never
//! mistaken for the full one.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::{HarvestConfig, ListingMode};
use crate::error::{HarvesterError, Result};
use crate::html::{element_text, normalize_label, within_class};
use crate::http::Transport;
use crate::types::{ActKey, IndexEntry};

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static TABLE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static DATA_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static NEXT_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[rel='next'], a.next-page-link, li.next > a").expect("valid selector")
});

/// A four-digit year between 1600 and 2099.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\b").expect("valid regex"));

/// Act number token such as "45" or "12A".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ACT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+[A-Za-z]?)\b").expect("valid regex"));

/// "Act No. 45 of 1860" style citation inside list items.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ACT_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bact\s*(?:no\.?|number)\s*[:.]?\s*(\d+[A-Za-z]?)\s*(?:of|/)\s*(\d{4})")
        .expect("valid regex")
});

/// One listing entry as it appears on a page, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub year: Option<u32>,
    pub act_number: Option<String>,
    pub href: Option<String>,
}

/// Entries of one listing page plus the continuation signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<RawEntry>,
    pub has_more: bool,
}

/// One listing skin: how to page it and how to read a page.
pub trait ListingStrategy {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// URL of the zero-based page `page`.
    fn page_url(&self, config: &HarvestConfig, page: u32) -> Result<String>;

    /// Parse the entries of one page.
    fn parse_page(&self, html: &str) -> ListingPage;
}

/// Data table skin, paged by 1-based page number.
pub struct TableListing;

/// Item list skin, paged by entry offset.
pub struct ItemListing;

/// Select the listing strategy for the configured mode.
#[must_use]
pub fn strategy_for(mode: ListingMode) -> Box<dyn ListingStrategy> {
    match mode {
        ListingMode::Table => Box::new(TableListing),
        ListingMode::List => Box::new(ItemListing),
    }
}

/// Column positions of a listing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableColumns {
    date: Option<usize>,
    number: Option<usize>,
    title: usize,
}

impl Default for TableColumns {
    /// Enactment date, act number, short title, view link.
    fn default() -> Self {
        Self {
            date: Some(0),
            number: Some(1),
            title: 2,
        }
    }
}

impl TableColumns {
    fn from_headers(headers: &[String]) -> Self {
        let defaults = Self::default();
        let title = column(headers, |h| h.contains("title"));
        let number = column(headers, |h| h.contains("number") || h.contains("act no"));
        let date = column(headers, |h| h.contains("date") || h == "year");

        if title.is_none() && number.is_none() && date.is_none() {
            return defaults;
        }
        Self {
            date,
            number,
            title: title.unwrap_or(defaults.title),
        }
    }
}

fn column(headers: &[String], matches: impl Fn(&str) -> bool) -> Option<usize> {
    headers.iter().position(|h| matches(h.as_str()))
}

impl ListingStrategy for TableListing {
    fn name(&self) -> &'static str {
        "table"
    }

    fn page_url(&self, config: &HarvestConfig, page: u32) -> Result<String> {
        config.listing_url("page", u64::from(page) + 1)
    }

    fn parse_page(&self, html: &str) -> ListingPage {
        let doc = Html::parse_document(html);
        let mut columns = TableColumns::default();
        let mut entries = Vec::new();

        for row in doc.select(&TABLE_ROW) {
            let headers: Vec<String> = row
                .select(&HEADER_CELL)
                .map(|th| normalize_label(&element_text(th)))
                .collect();
            if !headers.is_empty() {
                columns = TableColumns::from_headers(&headers);
                continue;
            }

            let cells: Vec<String> = row.select(&DATA_CELL).map(element_text).collect();
            let Some(title) = cells.get(columns.title).filter(|t| !t.is_empty()) else {
                continue;
            };

            let year = columns
                .date
                .and_then(|i| cells.get(i))
                .and_then(|c| last_year(c))
                .or_else(|| last_year(title));
            let act_number = columns
                .number
                .and_then(|i| cells.get(i))
                .and_then(|c| ACT_NUMBER.captures(c))
                .map(|c| c[1].to_string());

            entries.push(RawEntry {
                title: title.clone(),
                year,
                act_number,
                href: first_href(row),
            });
        }

        ListingPage {
            entries,
            has_more: has_next_page(&doc),
        }
    }
}

impl ListingStrategy for ItemListing {
    fn name(&self) -> &'static str {
        "list"
    }

    fn page_url(&self, config: &HarvestConfig, page: u32) -> Result<String> {
        config.listing_url("offset", u64::from(page) * u64::from(config.page_size))
    }

    fn parse_page(&self, html: &str) -> ListingPage {
        let doc = Html::parse_document(html);
        let mut entries = Vec::new();

        for item in doc.select(&LIST_ITEM) {
            if within_class(item, "pagination") || within_class(item, "next") {
                continue;
            }
            let Some(link) = item.select(&LINK).next() else {
                continue;
            };
            let title = element_text(link);
            if title.is_empty() {
                continue;
            }

            let text = element_text(item);
            let (act_number, year) = match ACT_CITATION.captures(&text) {
                Some(c) => (Some(c[1].to_string()), c[2].parse().ok()),
                None => (None, last_year(&title)),
            };

            entries.push(RawEntry {
                title,
                year,
                act_number,
                href: link.value().attr("href").map(String::from),
            });
        }

        ListingPage {
            entries,
            has_more: has_next_page(&doc),
        }
    }
}

fn last_year(text: &str) -> Option<u32> {
    YEAR.captures_iter(text)
        .last()
        .and_then(|c| c[1].parse().ok())
}

fn first_href(element: ElementRef<'_>) -> Option<String> {
    element
        .select(&LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(String::from)
}

fn has_next_page(doc: &Html) -> bool {
    if doc.select(&NEXT_LINK).next().is_some() {
        return true;
    }
    doc.select(&LINK).any(|a| {
        let text = normalize_label(&element_text(a));
        text == "next" || text.starts_with("next ")
    })
}

/// Crawl the listing and return the deduplicated index in crawl order.
///
/// Any page that fails at the transport level or answers with a status
/// other than 200 aborts the crawl with [`HarvesterError::Listing`].
pub fn discover(
    transport: &dyn Transport,
    config: &HarvestConfig,
    strategy: &dyn ListingStrategy,
) -> Result<Vec<IndexEntry>> {
    let mut raw = Vec::new();

    for page in 0..config.max_pages {
        let url = strategy.page_url(config, page)?;
        tracing::debug!(page, url = %url, strategy = strategy.name(), "Fetching listing page");

        let response = transport
            .request(&url)
            .map_err(|e| listing_failed(page, e.to_string()))?;
        if !response.is_ok() {
            return Err(listing_failed(page, format!("HTTP {}", response.status)));
        }

        let parsed = strategy.parse_page(&response.body);
        if parsed.entries.is_empty() {
            tracing::debug!(page, "Empty listing page, discovery finished");
            break;
        }
        raw.extend(parsed.entries);

        if !parsed.has_more {
            break;
        }
        if page + 1 == config.max_pages {
            tracing::warn!(max_pages = config.max_pages, "Listing page bound reached");
        }
    }

    let last_seen = Utc::now().to_rfc3339();
    let entries: Vec<IndexEntry> = raw
        .into_iter()
        .filter_map(|entry| to_index_entry(entry, config, &last_seen))
        .collect();

    let index = dedupe_entries(entries);
    tracing::info!(count = index.len(), "Discovery finished");
    Ok(index)
}

fn listing_failed(page: u32, reason: String) -> HarvesterError {
    tracing::warn!(page = page + 1, reason = %reason, "Listing page failed");
    HarvesterError::Listing {
        page: page + 1,
        reason,
    }
}

fn to_index_entry(raw: RawEntry, config: &HarvestConfig, last_seen: &str) -> Option<IndexEntry> {
    let Some(year) = raw.year else {
        tracing::debug!(title = %raw.title, "Dropping listing entry without year");
        return None;
    };
    let Some(act_number) = raw.act_number else {
        tracing::debug!(title = %raw.title, "Dropping listing entry without act number");
        return None;
    };
    let url = match raw.href.as_deref().map(|href| config.resolve_url(href)) {
        Some(Ok(url)) => url,
        _ => {
            tracing::debug!(title = %raw.title, "Dropping listing entry without usable link");
            return None;
        }
    };

    Some(IndexEntry {
        title: raw.title,
        year,
        act_number,
        url,
        last_seen: last_seen.to_string(),
    })
}

/// Collapse entries sharing `(year, act number)`, keeping the first one.
#[must_use]
pub fn dedupe_entries(entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    let mut seen: HashSet<ActKey> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.key()))
        .collect()
}
