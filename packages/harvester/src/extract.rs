//! Metadata and section extraction from a statute's detail page.
//!
//! Metadata comes from the labelled key/value table. Section references
//! come from the first strategy in [`SECTION_STRATEGIES`] that finds any;
//! strategies target different generations of portal markup and their
//! results are never merged.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::html::{element_text, normalize_label};
use crate::types::SectionRef;

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static COMPOUND_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[id*='#']").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static DATA_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-section-id]").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2[id], h3[id], h4[id], h5[id], .section-heading[id]")
        .expect("valid selector")
});

/// "Section 43A. Title" style label; captures the number and the remainder.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*section\s*(\d+[A-Za-z]*(?:\([0-9A-Za-z]+\))*\.?)\s*(.*)$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

/// Base for resolving relative section links; only the query is read.
const LINK_BASE: &str = "http://localhost/";

/// Metadata read from the act page's key/value table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActMetadata {
    pub short_title: Option<String>,
    pub long_title: Option<String>,
    pub enactment_date: Option<String>,
    pub ministry: Option<String>,
    pub act_id: Option<String>,
    pub act_number: Option<String>,
    pub year: Option<u32>,
    pub status: Option<String>,
    pub language: Option<String>,
}

/// Everything extracted from one act page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActPage {
    pub metadata: ActMetadata,
    pub sections: Vec<SectionRef>,
    /// Name of the section strategy that produced `sections`.
    pub strategy: Option<&'static str>,
}

/// A pure section extraction strategy; `None` when the markup shape is absent.
pub type SectionStrategy = fn(&Html) -> Option<Vec<SectionRef>>;

/// Section strategies in priority order.
pub const SECTION_STRATEGIES: &[(&str, SectionStrategy)] = &[
    ("accordion", accordion_sections),
    ("query-link", query_link_sections),
    ("data-attribute", data_attribute_sections),
    ("heading-anchor", heading_anchor_sections),
];

/// Extract metadata and section references from an act page.
pub fn extract_act_page(html: &str) -> ActPage {
    let doc = Html::parse_document(html);
    let mut metadata = parse_metadata(&doc);

    let (strategy, mut sections) = SECTION_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(&doc).map(|sections| (Some(*name), sections)))
        .unwrap_or((None, Vec::new()));

    if metadata.act_id.is_none() {
        metadata.act_id = sections
            .iter()
            .map(|s| s.act_id.clone())
            .find(|id| !id.is_empty());
    }
    if let Some(act_id) = &metadata.act_id {
        for section in sections.iter_mut().filter(|s| s.act_id.is_empty()) {
            section.act_id = act_id.clone();
        }
    }

    ActPage {
        metadata,
        sections,
        strategy,
    }
}

/// Read the labelled metadata table. A later row with the same label wins.
pub fn parse_metadata(doc: &Html) -> ActMetadata {
    let mut metadata = ActMetadata::default();

    for row in doc.select(&ROW) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
        let [label, value, ..] = cells.as_slice() else {
            continue;
        };
        let value = element_text(*value);
        if value.is_empty() {
            continue;
        }

        match normalize_label(&element_text(*label)).as_str() {
            "short title" => metadata.short_title = Some(value),
            "long title" => metadata.long_title = Some(value),
            "enactment date" | "date of enactment" => metadata.enactment_date = Some(value),
            "ministry" | "ministry name" => metadata.ministry = Some(value),
            "act id" | "actid" => metadata.act_id = Some(value),
            "act number" | "act no" => metadata.act_number = Some(value),
            "act year" | "year" => {
                metadata.year = YEAR.captures(&value).and_then(|c| c[1].parse().ok());
            }
            "status" | "act status" => metadata.status = Some(value),
            "language" => metadata.language = Some(value),
            _ => {}
        }
    }

    metadata
}

/// Split a "Section <number> <title>" label. Labels without the prefix keep
/// their full text as the title and use `fallback_number`.
pub fn parse_section_label(label: &str, fallback_number: &str) -> (String, String) {
    match SECTION_LABEL.captures(label) {
        Some(c) => {
            let title = c[2].trim_start_matches(['-', ':', ' ']).trim().to_string();
            (c[1].to_string(), title)
        }
        None => (fallback_number.to_string(), label.trim().to_string()),
    }
}

fn non_empty(sections: Vec<SectionRef>) -> Option<Vec<SectionRef>> {
    if sections.is_empty() {
        None
    } else {
        Some(sections)
    }
}

fn section_from_label(act_id: &str, section_id: &str, label: &str) -> SectionRef {
    let (section_number, title) = parse_section_label(label, section_id);
    SectionRef {
        act_id: act_id.to_string(),
        section_id: section_id.to_string(),
        section_number,
        title,
    }
}

/// Accordion entries whose id is `actId#sectionId#originatingActId`.
fn accordion_sections(doc: &Html) -> Option<Vec<SectionRef>> {
    let sections = doc
        .select(&COMPOUND_ID)
        .filter_map(|el| {
            let id = el.value().id()?;
            let mut parts = id.split('#');
            let act_id = parts.next()?.trim();
            let section_id = parts.next()?.trim();
            if act_id.is_empty() || section_id.is_empty() {
                return None;
            }
            Some(section_from_label(act_id, section_id, &element_text(el)))
        })
        .collect();
    non_empty(sections)
}

/// Legacy links carrying `actid` and `sectionId` query parameters.
fn query_link_sections(doc: &Html) -> Option<Vec<SectionRef>> {
    let base = Url::parse(LINK_BASE).ok()?;
    let mut seen = HashSet::new();
    let mut sections = Vec::new();

    for link in doc.select(&LINK) {
        let Some(url) = link.value().attr("href").and_then(|h| base.join(h).ok()) else {
            continue;
        };
        let mut act_id = None;
        let mut section_id = None;
        for (key, value) in url.query_pairs() {
            match key.to_lowercase().as_str() {
                "actid" => act_id = Some(value.into_owned()),
                "sectionid" => section_id = Some(value.into_owned()),
                _ => {}
            }
        }
        let (Some(act_id), Some(section_id)) = (act_id, section_id) else {
            continue;
        };
        if section_id.is_empty() || !seen.insert(section_id.clone()) {
            continue;
        }
        sections.push(section_from_label(&act_id, &section_id, &element_text(link)));
    }

    non_empty(sections)
}

/// Legacy elements tagged with `data-section-id` (and optionally `data-act-id`).
fn data_attribute_sections(doc: &Html) -> Option<Vec<SectionRef>> {
    let sections = doc
        .select(&DATA_SECTION)
        .filter_map(|el| {
            let section_id = el.value().attr("data-section-id")?.trim();
            if section_id.is_empty() {
                return None;
            }
            let act_id = el.value().attr("data-act-id").unwrap_or_default().trim();
            Some(section_from_label(act_id, section_id, &element_text(el)))
        })
        .collect();
    non_empty(sections)
}

/// Oldest markup: headings with an id whose text is a section label.
fn heading_anchor_sections(doc: &Html) -> Option<Vec<SectionRef>> {
    let sections = doc
        .select(&HEADING)
        .filter_map(|el| {
            let section_id = el.value().id()?;
            let label = element_text(el);
            if !SECTION_LABEL.is_match(&label) {
                return None;
            }
            Some(section_from_label("", section_id, &label))
        })
        .collect();
    non_empty(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCORDION_PAGE: &str = r#"<html><body>
<table class="table">
  <tr><td>Short Title:</td><td>The Indian Penal Code, 1860</td></tr>
  <tr><td>Long Title</td><td>An Act to provide a general Penal Code for India.</td></tr>
  <tr><td>Enactment Date</td><td>6-Oct-1860</td></tr>
  <tr><td>Act Number</td><td>45</td></tr>
  <tr><td>Act Year</td><td>1860</td></tr>
  <tr><td>Ministry</td><td>Ministry of Law</td></tr>
  <tr><td>Ministry</td><td>Ministry of Home Affairs</td></tr>
</table>
<div class="panel-group" id="accordion">
  <a class="accordion-toggle" id="AC_CEN_5_23_000045#1001#AC_CEN_5_23_000045">Section 1. Title and extent of operation of the Code.</a>
  <a class="accordion-toggle" id="AC_CEN_5_23_000045#1002#AC_CEN_5_23_000045">Section 43A. Power to do certain things</a>
</div>
</body></html>"#;

    #[test]
    fn test_parse_metadata_last_row_wins() {
        let page = extract_act_page(ACCORDION_PAGE);
        let m = &page.metadata;
        assert_eq!(m.short_title.as_deref(), Some("The Indian Penal Code, 1860"));
        assert_eq!(
            m.long_title.as_deref(),
            Some("An Act to provide a general Penal Code for India.")
        );
        assert_eq!(m.enactment_date.as_deref(), Some("6-Oct-1860"));
        assert_eq!(m.act_number.as_deref(), Some("45"));
        assert_eq!(m.year, Some(1860));
        assert_eq!(m.ministry.as_deref(), Some("Ministry of Home Affairs"));
    }

    #[test]
    fn test_accordion_sections() {
        let page = extract_act_page(ACCORDION_PAGE);
        assert_eq!(page.strategy, Some("accordion"));
        assert_eq!(page.sections.len(), 2);

        let s = &page.sections[1];
        assert_eq!(s.act_id, "AC_CEN_5_23_000045");
        assert_eq!(s.section_id, "1002");
        assert_eq!(s.section_number, "43A.");
        assert_eq!(s.title, "Power to do certain things");
    }

    #[test]
    fn test_act_id_recovered_from_first_section() {
        let page = extract_act_page(ACCORDION_PAGE);
        assert_eq!(page.metadata.act_id.as_deref(), Some("AC_CEN_5_23_000045"));
    }

    #[test]
    fn test_explicit_act_id_is_kept() {
        let html = r#"<table><tr><th>Act ID</th><td>AC_EXPLICIT</td></tr></table>
<a id="AC_OTHER#5#">Section 5. Five</a>"#;
        let page = extract_act_page(html);
        assert_eq!(page.metadata.act_id.as_deref(), Some("AC_EXPLICIT"));
        assert_eq!(page.sections[0].act_id, "AC_OTHER");
    }

    #[test]
    fn test_query_link_fallback() {
        let html = r#"<html><body>
<table><tr><td>Act ID</td><td>AC_LEGACY</td></tr></table>
<a href="/show-data?actid=AC_LEGACY&amp;sectionId=11&amp;orderno=1">Section 1. Short title</a>
<a href="/show-data?actid=AC_LEGACY&amp;sectionId=11&amp;orderno=1">Section 1. Short title</a>
<a href="/show-data?actid=AC_LEGACY&amp;sectionId=12&amp;orderno=2">Section 2. Definitions</a>
<div data-section-id="99">Section 99. Should not be merged</div>
</body></html>"#;
        let page = extract_act_page(html);
        assert_eq!(page.strategy, Some("query-link"));
        let ids: Vec<&str> = page.sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["11", "12"]);
        assert_eq!(page.sections[1].title, "Definitions");
    }

    #[test]
    fn test_data_attribute_fallback_fills_act_id() {
        let html = r#"<html><body>
<table><tr><td>Act ID</td><td>AC_DATA</td></tr></table>
<div data-section-id="7">Section 7 - Penalties</div>
<div data-section-id="8" data-act-id="AC_OWN">Transitional provisions</div>
</body></html>"#;
        let page = extract_act_page(html);
        assert_eq!(page.strategy, Some("data-attribute"));
        assert_eq!(page.sections[0].act_id, "AC_DATA");
        assert_eq!(page.sections[0].section_number, "7");
        assert_eq!(page.sections[0].title, "Penalties");
        assert_eq!(page.sections[1].act_id, "AC_OWN");
        assert_eq!(page.sections[1].section_number, "8");
        assert_eq!(page.sections[1].title, "Transitional provisions");
    }

    #[test]
    fn test_heading_anchor_fallback() {
        let html = r#"<html><body>
<h2 id="intro">Preamble</h2>
<h3 id="sec-3">Section 3. Interpretation</h3>
</body></html>"#;
        let page = extract_act_page(html);
        assert_eq!(page.strategy, Some("heading-anchor"));
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].section_id, "sec-3");
        assert_eq!(page.sections[0].act_id, "");
    }

    #[test]
    fn test_no_sections() {
        let page = extract_act_page("<html><body><p>Old format act</p></body></html>");
        assert!(page.sections.is_empty());
        assert_eq!(page.strategy, None);
        assert_eq!(page.metadata, ActMetadata::default());
    }

    #[test]
    fn test_parse_section_label() {
        assert_eq!(
            parse_section_label("Section 66(1). Computer related offences", "x"),
            ("66(1).".to_string(), "Computer related offences".to_string())
        );
        assert_eq!(
            parse_section_label("SECTION 4", "x"),
            ("4".to_string(), String::new())
        );
        assert_eq!(
            parse_section_label("Schedule I", "sched-1"),
            ("sched-1".to_string(), "Schedule I".to_string())
        );
    }
}
