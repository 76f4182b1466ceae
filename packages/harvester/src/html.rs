//! HTML utility functions shared by the listing and act page parsers.

use scraper::ElementRef;

use crate::text::collapse_whitespace;

/// Visible text of an element with whitespace collapsed.
///
/// # Examples
/// ```
/// use scraper::{Html, Selector};
/// use statute_harvester::html::element_text;
///
/// let doc = Html::parse_fragment("<p> Short\n  <b>title</b> </p>");
/// let p = doc.select(&Selector::parse("p").unwrap()).next().unwrap();
/// assert_eq!(element_text(p), "Short title");
/// ```
pub fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    collapse_whitespace(&raw)
}

/// Normalize a table label for matching: lowercase, punctuation removed,
/// whitespace collapsed.
///
/// # Examples
/// ```
/// use statute_harvester::html::normalize_label;
///
/// assert_eq!(normalize_label("  Enactment   Date: "), "enactment date");
/// assert_eq!(normalize_label("Act-ID"), "actid");
/// ```
pub fn normalize_label(label: &str) -> String {
    let stripped: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    collapse_whitespace(&stripped)
}

/// Whether the element or one of its ancestors carries `class`.
pub fn within_class(element: ElementRef<'_>, class: &str) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|e| e.value().classes().any(|c| c.eq_ignore_ascii_case(class)))
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    #[test]
    fn test_element_text_joins_fragments() {
        let doc = Html::parse_fragment("<div><span>Section </span><span>4.</span>\n</div>");
        let div = doc.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(element_text(div), "Section 4.");
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Short Title:"), "short title");
        assert_eq!(normalize_label("ACT   NUMBER"), "act number");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_within_class() {
        let doc = Html::parse_fragment(
            r#"<ul class="pagination"><li><a href="?page=2">2</a></li></ul><ul><li id="x">x</li></ul>"#,
        );
        let li = Selector::parse("li").unwrap();
        let items: Vec<_> = doc.select(&li).collect();
        assert!(within_class(items[0], "pagination"));
        assert!(!within_class(items[1], "pagination"));
    }
}
