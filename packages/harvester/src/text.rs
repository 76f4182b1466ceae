//! Text cleaning and naming helpers for statute records.

use regex::Regex;
use std::sync::LazyLock;

/// Line-break and paragraph tags, which become newlines before tags are stripped.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?p(?:\s[^>]*)?>").expect("valid regex")
});

/// Any remaining markup tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trailing enactment year of a title, e.g. ", 1860".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",?\s*\(?\d{4}\)?\s*$").expect("valid regex"));

/// Leading "Section" label of a section number.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:section|sec\.)\s*").expect("valid regex"));

/// Entities unescaped by [`clean_html`]. `&amp;` comes last so that
/// `&amp;lt;` ends up as the literal text `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Titles with at most this many words (year excluded) are their own short name.
const SHORT_TITLE_MAX_WORDS: usize = 3;

/// Maximum number of letters in a generated initialism.
const MAX_INITIALS: usize = 5;

/// Words that never contribute to an initialism.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to", "with",
];

/// Turn an HTML fragment into plain text.
///
/// Break and paragraph tags become newlines, all other tags are dropped,
/// a fixed set of entities is unescaped, and whitespace runs collapse to a
/// single space.
///
/// # Examples
/// ```
/// use statute_harvester::text::clean_html;
///
/// assert_eq!(clean_html("<p>Hello</p>"), "Hello");
/// assert_eq!(clean_html("a<br/>b &amp; <b>c</b>"), "a b & c");
/// ```
pub fn clean_html(html: &str) -> String {
    let text = BREAK_TAG.replace_all(html, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let mut text = text.into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    collapse_whitespace(&text)
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Combine cleaned section content with its footnote.
///
/// # Examples
/// ```
/// use statute_harvester::text::assemble_content;
///
/// assert_eq!(assemble_content("A", "B"), "A\n\n[Footnote] B");
/// assert_eq!(assemble_content("A", ""), "A");
/// ```
pub fn assemble_content(content: &str, footnote: &str) -> String {
    if !content.is_empty() && !footnote.is_empty() {
        format!("{content}\n\n[Footnote] {footnote}")
    } else {
        content.to_string()
    }
}

/// Derive the provision reference from a section number.
///
/// Strips a leading "Section" label and a trailing period, then prefixes `s`.
///
/// # Examples
/// ```
/// use statute_harvester::text::provision_ref;
///
/// assert_eq!(provision_ref("43A."), "s43A");
/// assert_eq!(provision_ref("Section 4"), "s4");
/// ```
pub fn provision_ref(section_number: &str) -> String {
    let number = SECTION_LABEL.replace(section_number, "");
    let number = number.trim();
    let number = number.strip_suffix('.').unwrap_or(number).trim();
    format!("s{number}")
}

/// Derive a short name from a statute title and its year.
///
/// Short titles pass through unchanged. Longer titles are reduced to the
/// initials of their capitalised significant words (at most five),
/// followed by the year.
///
/// # Examples
/// ```
/// use statute_harvester::text::short_name;
///
/// assert_eq!(short_name("The Indian Penal Code, 1860", 1860), "IPC 1860");
/// assert_eq!(short_name("Companies Act, 2013", 2013), "Companies Act, 2013");
/// ```
pub fn short_name(title: &str, year: u32) -> String {
    let title = title.trim();
    let base = TRAILING_YEAR.replace(title, "");
    let words: Vec<&str> = base.split_whitespace().collect();

    if words.len() <= SHORT_TITLE_MAX_WORDS {
        return title.to_string();
    }

    let initials: String = words
        .iter()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .filter_map(|w| w.chars().next())
        .filter(|c| c.is_uppercase())
        .take(MAX_INITIALS)
        .collect();

    if initials.is_empty() {
        title.to_string()
    } else {
        format!("{initials} {year}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_paragraph() {
        assert_eq!(clean_html("<p>Hello</p>"), "Hello");
    }

    #[test]
    fn test_clean_html_breaks_and_whitespace() {
        assert_eq!(
            clean_html("<p class=\"x\">(1) First</p>\n\n<p>(2)   Second<br>line</p>"),
            "(1) First (2) Second line"
        );
    }

    #[test]
    fn test_clean_html_entities() {
        assert_eq!(
            clean_html("Rs.&nbsp;500 &lt;or&gt; &quot;fine&quot; &#39;x&#39;"),
            "Rs. 500 <or> \"fine\" 'x'"
        );
        assert_eq!(clean_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_clean_html_strips_nested_tags() {
        assert_eq!(
            clean_html("<div><span style=\"a\">Power</span> to <i>make</i> rules</div>"),
            "Power to make rules"
        );
    }

    #[test]
    fn test_clean_html_empty() {
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("<p> </p>"), "");
    }

    #[test]
    fn test_assemble_content() {
        assert_eq!(assemble_content("A", "B"), "A\n\n[Footnote] B");
        assert_eq!(assemble_content("A", ""), "A");
        assert_eq!(assemble_content("", "B"), "");
    }

    #[test]
    fn test_provision_ref() {
        assert_eq!(provision_ref("43A."), "s43A");
        assert_eq!(provision_ref("4"), "s4");
        assert_eq!(provision_ref("66(1)"), "s66(1)");
        assert_eq!(provision_ref("Section 12."), "s12");
        assert_eq!(provision_ref("SECTION 2A"), "s2A");
    }

    #[test]
    fn test_short_name_initialism() {
        assert_eq!(short_name("The Indian Penal Code, 1860", 1860), "IPC 1860");
        assert_eq!(
            short_name("The Information Technology Act, 2000", 2000),
            "ITA 2000"
        );
        assert_eq!(
            short_name("The Code of Criminal Procedure, 1973", 1973),
            "CCP 1973"
        );
    }

    #[test]
    fn test_short_name_caps_initials() {
        assert_eq!(
            short_name(
                "The Scheduled Castes And Scheduled Tribes Prevention Of Atrocities Act, 1989",
                1989
            ),
            "SCSTP 1989"
        );
    }

    #[test]
    fn test_short_name_passes_short_titles_through() {
        assert_eq!(short_name("Companies Act, 2013", 2013), "Companies Act, 2013");
        assert_eq!(short_name("  Evidence Act ", 1872), "Evidence Act");
    }

    #[test]
    fn test_short_name_without_capitals_keeps_title() {
        assert_eq!(
            short_name("an act to amend certain laws", 1950),
            "an act to amend certain laws"
        );
    }
}
