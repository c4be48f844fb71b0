//! Heading outline collection and hierarchy validation.

use serde::Serialize;

use crate::parse::{Document, Element, collapse_whitespace, truncate_chars};

/// Maximum characters of section text kept per heading.
pub const SECTION_TEXT_MAX_CHARS: usize = 1000;

/// Sibling elements whose text never counts toward a heading's section.
const SECTION_SKIP_TAGS: &[&str] = &["script", "style", "noscript", "nav", "footer", "iframe"];

/// One heading in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRecord {
    /// Lowercase tag name, `h1` through `h6`.
    pub tag: String,
    /// Trimmed heading text.
    pub text: String,
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Set when this heading skips one or more levels below its predecessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Text between this heading and the next one, at most 1000 characters.
    pub content: String,
}

impl HeadingRecord {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self { tag: format!("h{}", level), text: text.into(), level, error: None, content: String::new() }
    }
}

/// Annotates level skips.
///
/// A record is flagged only when it goes deeper than its predecessor by more
/// than one level (`H2 -> H4`). Same-level, shallower and single-step deeper
/// transitions are valid, and the first record is never flagged.
pub fn validate_heading_hierarchy(mut headings: Vec<HeadingRecord>) -> Vec<HeadingRecord> {
    if let Some(first) = headings.first_mut() {
        first.error = None;
    }

    for i in 1..headings.len() {
        let prev = headings[i - 1].level;
        let current = &mut headings[i];
        current.error = if current.level > prev + 1 {
            Some(format!("Skipped heading level: H{} -> H{}", prev, current.level))
        } else {
            None
        };
    }

    headings
}

/// Collects visible headings with their section text and validates them.
pub fn collect_headings(doc: &Document) -> Vec<HeadingRecord> {
    let headings: Vec<Element<'_>> = match doc.select("h1, h2, h3, h4, h5, h6") {
        Ok(elements) => elements.into_iter().filter(Element::is_rendered).collect(),
        Err(_) => return Vec::new(),
    };

    let records = headings
        .iter()
        .enumerate()
        .filter_map(|(i, heading)| {
            let tag = heading.tag_name();
            let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
            let content = section_text(heading, headings.get(i + 1));
            Some(HeadingRecord { tag, text: heading.text().trim().to_string(), level, error: None, content })
        })
        .collect();

    validate_heading_hierarchy(records)
}

/// Walks the heading's following siblings up to the next heading.
fn section_text(heading: &Element<'_>, next: Option<&Element<'_>>) -> String {
    let stop = next.map(|el| (*el.element_ref()).id());
    let mut text = String::new();

    for sibling in heading.element_ref().next_siblings() {
        if Some(sibling.id()) == stop {
            break;
        }

        if let Some(t) = sibling.value().as_text() {
            text.push_str(t);
        } else if let Some(el) = scraper::ElementRef::wrap(sibling) {
            if SECTION_SKIP_TAGS.contains(&el.value().name()) {
                continue;
            }
            text.push_str(&Element::from_ref(el).visible_text());
        }
    }

    truncate_chars(&collapse_whitespace(&text), SECTION_TEXT_MAX_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn records(levels: &[u8]) -> Vec<HeadingRecord> {
        levels.iter().map(|&l| HeadingRecord::new(l, format!("Heading {}", l))).collect()
    }

    fn flagged(levels: &[u8]) -> Vec<bool> {
        validate_heading_hierarchy(records(levels))
            .iter()
            .map(|h| h.error.is_some())
            .collect()
    }

    #[rstest]
    #[case(&[1, 2, 3], &[false, false, false])]
    #[case(&[1, 3], &[false, true])]
    #[case(&[2, 4, 2, 1], &[false, true, false, false])]
    #[case(&[3, 3, 2], &[false, false, false])]
    #[case(&[6, 1, 6], &[false, false, true])]
    #[case(&[1, 2, 4, 5, 2, 6], &[false, false, true, false, false, true])]
    fn test_skip_detection(#[case] levels: &[u8], #[case] expected: &[bool]) {
        assert_eq!(flagged(levels), expected);
    }

    #[test]
    fn test_first_record_never_flagged() {
        let mut input = records(&[4, 5]);
        input[0].error = Some("stale".to_string());
        let output = validate_heading_hierarchy(input);
        assert!(output[0].error.is_none());
    }

    #[test]
    fn test_error_message_names_levels() {
        let output = validate_heading_hierarchy(records(&[2, 4]));
        assert_eq!(output[1].error.as_deref(), Some("Skipped heading level: H2 -> H4"));
    }

    #[test]
    fn test_empty_input() {
        assert!(validate_heading_hierarchy(Vec::new()).is_empty());
    }

    #[test]
    fn test_collect_headings_with_sections() {
        let html = r#"
            <html><body>
                <h1>  Guide  </h1>
                <p>Intro paragraph.</p>
                <h3>Details</h3>
                Loose text
                <p>More detail.</p>
                <script>ignored()</script>
                <nav>Menu</nav>
                <h2 style="display:none">Hidden heading</h2>
                <h2>Next</h2>
            </body></html>
        "#;
        let doc = Document::parse(html).unwrap();
        let headings = collect_headings(&doc);

        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].text, "Guide");
        assert_eq!(headings[0].tag, "h1");
        assert_eq!(headings[0].content, "Intro paragraph.");
        assert!(headings[0].error.is_none());

        assert_eq!(headings[1].level, 3);
        assert!(headings[1].error.is_some());
        assert_eq!(headings[1].content, "Loose text More detail.");

        assert_eq!(headings[2].text, "Next");
        assert!(headings[2].error.is_none());
    }

    #[test]
    fn test_section_text_is_capped() {
        let long = "word ".repeat(400);
        let html = format!("<html><body><h2>Long</h2><p>{}</p></body></html>", long);
        let doc = Document::parse(&html).unwrap();
        let headings = collect_headings(&doc);
        assert_eq!(headings[0].content.chars().count(), SECTION_TEXT_MAX_CHARS);
    }
}
