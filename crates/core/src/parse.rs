//! HTML parsing and DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types the engine reads
//! pages through. Besides CSS selection it exposes the two text views the
//! extractor depends on:
//!
//! - [`Element::text`]: raw text content, every text node including hidden ones
//! - [`Element::visible_text`]: rendered text only, skipping elements hidden by the
//!   `hidden` attribute or an inline `display: none`, honoring inherited
//!   `visibility`, with block boundaries and `<br>` turned into line breaks
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Shown</p>
//!             <p hidden>Collapsed</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let body = doc.body().unwrap();
//! assert!(body.text().contains("Collapsed"));
//! assert!(!body.visible_text().contains("Collapsed"));
//! ```

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::{PagesenseError, Result};

/// Elements whose boundaries break lines in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

/// Elements that never contribute rendered text.
const NON_RENDERED: &[&str] = &["head", "title", "script", "style", "noscript", "template"];

/// Represents a parsed HTML document.
///
/// A Document is an immutable snapshot. The engine never edits it; extraction
/// works on a serialized copy of the chosen subtree.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses a full HTML document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagesense_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><head><title>Test</title></head><body></body></html>").unwrap();
    /// assert_eq!(doc.title(), "Test");
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses a full HTML document that was loaded from `url`.
    ///
    /// The URL is used to resolve links and canonical references.
    pub fn parse_with_url(html: &str, url: Option<Url>) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: url })
    }

    /// Parses an HTML fragment such as a serialized subtree.
    pub fn parse_fragment(html: &str) -> Result<Self> {
        let html = Html::parse_fragment(html);
        Ok(Self { html, base_url: None })
    }

    /// Gets the URL the document was loaded from, if known.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Gets the entire HTML as a string.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PagesenseError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagesense_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the root element (`<html>` for documents).
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Gets the `<body>` element if present.
    pub fn body(&self) -> Option<Element<'_>> {
        self.select_first("body").ok().flatten()
    }

    /// Gets the document title with whitespace collapsed, or an empty string.
    pub fn title(&self) -> String {
        self.select_first("title")
            .ok()
            .flatten()
            .map(|el| collapse_whitespace(&el.text()))
            .unwrap_or_default()
    }

    /// Gets meta tag content by `name` or `property` attribute.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        for attr in ["name", "property"] {
            let selector = format!("meta[{}=\"{}\"]", attr, key);
            if let Ok(Some(el)) = self.select_first(&selector)
                && let Some(content) = el.attr("content")
            {
                return Some(content.to_string());
            }
        }

        None
    }
}

/// A wrapper around scraper's ElementRef.
///
/// Two `Element`s compare equal when they refer to the same node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element, including its own tags.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the raw text content: every descendant text node, hidden or not.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the rendered text of this element.
    ///
    /// Subtrees removed from layout and non-rendered elements are skipped; block
    /// elements and `<br>` contribute line breaks. `visibility` is inherited per
    /// element, so a `visibility: visible` descendant of a `visibility: hidden`
    /// container still contributes its text. Returns an empty string when the
    /// element itself is removed from layout.
    pub fn visible_text(&self) -> String {
        if !self.is_displayed() {
            return String::new();
        }
        self.visible_text_inheriting(self.is_visible())
    }

    /// Rendered text of the descendants, with `visible` as the visibility they
    /// inherit from this element.
    pub fn visible_text_inheriting(&self, visible: bool) -> String {
        let mut out = String::new();
        push_visible_text(self.element, visible, &mut out);
        out
    }

    /// Reports whether the element would be rendered.
    ///
    /// An element is not rendered when it or any ancestor carries the `hidden`
    /// attribute or an inline `display: none`, or when its inherited visibility
    /// is `hidden`.
    pub fn is_rendered(&self) -> bool {
        self.is_displayed() && self.is_visible()
    }

    /// False when the element or an ancestor is removed from layout.
    pub fn is_displayed(&self) -> bool {
        !self.self_and_ancestors().any(is_display_none)
    }

    /// Inherited visibility: the nearest inline `visibility` declaration on the
    /// element or an ancestor wins.
    pub fn is_visible(&self) -> bool {
        self.self_and_ancestors().find_map(visibility).unwrap_or(true)
    }

    fn self_and_ancestors(&self) -> impl Iterator<Item = ElementRef<'a>> {
        std::iter::once(self.element).chain(self.element.ancestors().filter_map(ElementRef::wrap))
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g. "div", "a", "h2").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Returns true if any ancestor has one of the given tag names.
    pub fn has_ancestor(&self, tags: &[&str]) -> bool {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| tags.contains(&el.value().name()))
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagesenseError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    pub(crate) fn from_ref(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    pub(crate) fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

/// Collapses every whitespace run into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Counts whitespace-delimited non-empty tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncates to at most `max_chars` characters without splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PagesenseError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Inline style declarations, lowercased with whitespace removed.
fn declarations(element: ElementRef<'_>) -> Vec<String> {
    match element.value().attr("style") {
        Some(style) => style
            .split(';')
            .map(|decl| decl.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase())
            .filter(|decl| !decl.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

fn is_display_none(element: ElementRef<'_>) -> bool {
    element.value().attr("hidden").is_some() || declarations(element).iter().any(|d| d.starts_with("display:none"))
}

/// The element's own `visibility` declaration, if any. The last one wins.
fn visibility(element: ElementRef<'_>) -> Option<bool> {
    declarations(element).iter().rev().find_map(|decl| {
        let value = decl.strip_prefix("visibility:")?.trim_end_matches("!important");
        match value {
            "hidden" | "collapse" => Some(false),
            "visible" => Some(true),
            _ => None,
        }
    })
}

fn push_visible_text(element: ElementRef<'_>, visible: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if visible => out.push_str(text),
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else { continue };
                let name = el.name();
                if NON_RENDERED.contains(&name) || is_display_none(child_ref) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let child_visible = visibility(child_ref).unwrap_or(visible);
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                push_visible_text(child_ref, child_visible, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="description" content="A sample page">
            <meta property="og:title" content="OG Sample">
            <title>  Test
                Page </title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <div style="display: none"><p>Hidden by style</p></div>
            <details><p hidden>Accordion body</p></details>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document_title_is_collapsed() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), "Test Page");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PagesenseError::HtmlParseError(_))));
    }

    #[test]
    fn test_meta_content_by_name_and_property() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.meta_content("description"), Some("A sample page".to_string()));
        assert_eq!(doc.meta_content("og:title"), Some("OG Sample".to_string()));
        assert_eq!(doc.meta_content("robots"), None);
    }

    #[test]
    fn test_raw_text_includes_hidden_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.body().unwrap().text();
        assert!(text.contains("Hidden by style"));
        assert!(text.contains("Accordion body"));
    }

    #[test]
    fn test_visible_text_skips_hidden_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.body().unwrap().visible_text();
        assert!(text.contains("Paragraph 1"));
        assert!(!text.contains("Hidden by style"));
        assert!(!text.contains("Accordion body"));
    }

    #[test]
    fn test_visible_text_separates_blocks() {
        let doc = Document::parse("<div><p>one</p><p>two</p>three<br>four</div>").unwrap();
        let div = doc.select_first("div").unwrap().unwrap();
        assert_eq!(collapse_whitespace(&div.text()), "onetwothreefour");
        assert_eq!(collapse_whitespace(&div.visible_text()), "one two three four");
    }

    #[test]
    fn test_is_rendered_checks_ancestors() {
        let doc = Document::parse(r#"<div style="visibility:hidden"><span id="inner">x</span></div>"#).unwrap();
        let inner = doc.select_first("#inner").unwrap().unwrap();
        assert!(!inner.is_rendered());
        assert_eq!(inner.visible_text(), "");
    }

    #[test]
    fn test_visible_descendant_of_hidden_container() {
        let html = concat!(
            r#"<div id="outer" style="visibility:hidden">gone"#,
            r#"<span id="shown" style="visibility: visible">shown</span></div>"#
        );
        let doc = Document::parse(html).unwrap();
        let outer = doc.select_first("#outer").unwrap().unwrap();
        assert!(outer.is_displayed());
        assert!(!outer.is_rendered());
        assert_eq!(collapse_whitespace(&outer.visible_text()), "shown");

        let shown = doc.select_first("#shown").unwrap().unwrap();
        assert!(shown.is_rendered());
        assert_eq!(doc.body().unwrap().visible_text().trim(), "shown");
    }

    #[test]
    fn test_display_none_hides_visible_descendants() {
        let html = r#"<div style="display: none"><span id="s" style="visibility: visible">x</span></div><p>kept</p>"#;
        let doc = Document::parse(html).unwrap();
        assert!(!doc.select_first("#s").unwrap().unwrap().is_rendered());
        assert_eq!(collapse_whitespace(&doc.body().unwrap().visible_text()), "kept");
    }

    #[test]
    fn test_has_ancestor() {
        let doc = Document::parse(r##"<nav><a id="n" href="#">x</a></nav><a id="m" href="#">y</a>"##).unwrap();
        assert!(doc.select_first("#n").unwrap().unwrap().has_ancestor(&["nav"]));
        assert!(!doc.select_first("#m").unwrap().unwrap().has_ancestor(&["nav", "footer"]));
    }

    #[test]
    fn test_word_helpers() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(count_words("hello   world\n"), 2);
        assert_eq!(count_words(""), 0);
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
