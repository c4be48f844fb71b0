//! Noise-filtered main content extraction.
//!
//! Extraction picks a content root from a ranked list of named [`Strategy`]
//! entries, copies that subtree, strips noise from the copy and reads its text.
//! Two profiles ship with the crate:
//!
//! - [`ExtractProfile::deep_read`] reads raw text content, so text behind collapsed
//!   accordions and tabs still counts. It feeds word count and readability.
//! - [`ExtractProfile::weighted`] prefers dense containers, reads rendered text only
//!   and caps the result. It feeds the semantic payload.
//!
//! New heuristics are added by pushing a strategy onto a profile; the selection
//! loop does not change.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::{ContentExtractor, Document};
//!
//! let html = r#"<body><nav>Home About</nav><main><p>Main text that is long enough to qualify
//!     as the content root because it runs well past one hundred characters of raw text.</p></main></body>"#;
//! let doc = Document::parse(html).unwrap();
//! let extracted = ContentExtractor::deep_read().extract(&doc);
//! assert_eq!(extracted.strategy, "main");
//! assert!(!extracted.text.contains("Home"));
//! ```

use crate::parse::{Document, Element, collapse_whitespace, count_words, truncate_chars};

/// Body text cap applied by the weighted profile.
pub const WEIGHTED_BODY_MAX_CHARS: usize = 2500;

/// Text cap for plain deep-read text handed to hosts.
pub const DEEP_READ_TEXT_MAX_CHARS: usize = 15000;

/// Which text view of the cleaned subtree is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Every text node, hidden or not (`textContent`).
    Raw,
    /// Rendered text only (`innerText`).
    Visible,
}

/// Predicate deciding whether a strategy's match is an acceptable content root.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    /// Raw text length must exceed the given number of characters.
    MinRawChars(usize),
    /// More than `min_paragraphs` `<p>` descendants and more than
    /// `min_visible_chars` characters of rendered text.
    Dense { min_paragraphs: usize, min_visible_chars: usize },
}

impl Qualifier {
    /// Evaluates the predicate against a candidate element.
    pub fn qualifies(&self, element: &Element<'_>) -> bool {
        match self {
            Qualifier::MinRawChars(min) => element.text().chars().count() > *min,
            Qualifier::Dense { min_paragraphs, min_visible_chars } => {
                let paragraphs = element.select("p").map(|p| p.len()).unwrap_or(0);
                paragraphs > *min_paragraphs && element.visible_text().chars().count() > *min_visible_chars
            }
        }
    }
}

/// A named content-root heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    /// Name reported in [`ExtractedText::strategy`].
    pub name: String,
    /// CSS selector producing candidate roots, in document order.
    pub selector: String,
    /// Acceptance predicate for candidates.
    pub qualifier: Qualifier,
}

impl Strategy {
    pub fn new(name: impl Into<String>, selector: impl Into<String>, qualifier: Qualifier) -> Self {
        Self { name: name.into(), selector: selector.into(), qualifier }
    }
}

/// Configuration for one extraction variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractProfile {
    /// Strategies in priority order; the first qualifying match wins.
    pub strategies: Vec<Strategy>,
    /// Selectors removed from the copied subtree before reading text.
    pub noise_selectors: Vec<String>,
    /// Text view to read.
    pub text_mode: TextMode,
    /// Optional cap on the cleaned text, in characters.
    pub max_chars: Option<usize>,
}

const DEEP_READ_NOISE: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "iframe", "svg", ".ad", ".ads", ".sidebar", "aside",
    ".menu", ".modal", ".popup", "#sidebar", "#comments",
];

const WEIGHTED_NOISE: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    ".ad",
    ".ads",
    ".sidebar",
    ".menu",
    ".modal",
    ".popup",
    ".cookie-banner",
    "[hidden]",
    "[aria-hidden=\"true\"]",
];

impl ExtractProfile {
    /// Raw-text profile used for word count and readability.
    ///
    /// Landmarks are tried in order `main`, `article`, `#content`, `.content`,
    /// `.post-body`; a match qualifies with more than 100 characters of raw text.
    pub fn deep_read() -> Self {
        let min = Qualifier::MinRawChars(100);
        Self {
            strategies: vec![
                Strategy::new("main", "main", min.clone()),
                Strategy::new("article", "article", min.clone()),
                Strategy::new("content-id", "#content", min.clone()),
                Strategy::new("content-class", ".content", min.clone()),
                Strategy::new("post-body", ".post-body", min),
            ],
            noise_selectors: DEEP_READ_NOISE.iter().map(|s| s.to_string()).collect(),
            text_mode: TextMode::Raw,
            max_chars: None,
        }
    }

    /// Rendered-text profile used for the semantic payload body.
    pub fn weighted() -> Self {
        let dense = Qualifier::Dense { min_paragraphs: 3, min_visible_chars: 500 };
        Self {
            strategies: vec![
                Strategy::new("article", "article", dense.clone()),
                Strategy::new("main", "main", dense.clone()),
                Strategy::new("post-body", ".post-body", dense.clone()),
                Strategy::new("content-class", ".content", dense.clone()),
                Strategy::new("content-id", "#content", dense),
            ],
            noise_selectors: WEIGHTED_NOISE.iter().map(|s| s.to_string()).collect(),
            text_mode: TextMode::Visible,
            max_chars: Some(WEIGHTED_BODY_MAX_CHARS),
        }
    }

    /// Appends a strategy at the lowest priority.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Inserts a strategy ahead of all others.
    pub fn with_priority_strategy(mut self, strategy: Strategy) -> Self {
        self.strategies.insert(0, strategy);
        self
    }

    /// Adds a noise selector.
    pub fn with_noise_selector(mut self, selector: impl Into<String>) -> Self {
        self.noise_selectors.push(selector.into());
        self
    }

    /// Sets the text cap.
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }
}

/// The result of an extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Cleaned, whitespace-collapsed text.
    pub text: String,
    /// Whitespace-delimited token count of `text`.
    pub word_count: usize,
    /// Name of the strategy that chose the root, or `body` / `document` fallbacks.
    pub strategy: String,
}

/// Extracts noise-filtered text from a document with a given profile.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    profile: ExtractProfile,
}

impl ContentExtractor {
    pub fn new(profile: ExtractProfile) -> Self {
        Self { profile }
    }

    /// Extractor with the [`ExtractProfile::deep_read`] profile.
    pub fn deep_read() -> Self {
        Self::new(ExtractProfile::deep_read())
    }

    /// Extractor with the [`ExtractProfile::weighted`] profile.
    pub fn weighted() -> Self {
        Self::new(ExtractProfile::weighted())
    }

    pub fn profile(&self) -> &ExtractProfile {
        &self.profile
    }

    /// Chooses the content root.
    ///
    /// Invalid strategy selectors are skipped. Falls back to `<body>`, then to
    /// the document root.
    pub fn select_root<'a>(&self, doc: &'a Document) -> (Element<'a>, String) {
        for strategy in &self.profile.strategies {
            let candidates = match doc.select(&strategy.selector) {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(strategy = %strategy.name, error = %e, "skipping extraction strategy");
                    continue;
                }
            };

            if let Some(root) = candidates.into_iter().find(|el| strategy.qualifier.qualifies(el)) {
                return (root, strategy.name.clone());
            }
        }

        match doc.body() {
            Some(body) => (body, "body".to_string()),
            None => (doc.root(), "document".to_string()),
        }
    }

    /// Runs the extraction. Never fails; the live document is not modified.
    pub fn extract(&self, doc: &Document) -> ExtractedText {
        let (root, strategy) = self.select_root(doc);

        // Noise rules apply to descendants only, so the root's own markup is left out of the copy.
        let copy = remove_noise(&root.inner_html(), &self.profile.noise_selectors);
        let text = match Document::parse_fragment(&copy) {
            Ok(cleaned) => match self.profile.text_mode {
                TextMode::Raw => cleaned.root().text(),
                TextMode::Visible if root.is_displayed() => cleaned.root().visible_text_inheriting(root.is_visible()),
                TextMode::Visible => String::new(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to reparse cleaned subtree");
                String::new()
            }
        };

        let mut text = collapse_whitespace(&text);
        if let Some(max) = self.profile.max_chars {
            text = truncate_chars(&text, max).to_string();
        }

        let word_count = count_words(&text);
        tracing::debug!(strategy = %strategy, words = word_count, "extracted main content");

        ExtractedText { text, word_count, strategy }
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::deep_read()
    }
}

/// Deep-read text capped for hosts that only need a plain text dump.
pub fn deep_read_text(doc: &Document, max_chars: usize) -> String {
    let extracted = ContentExtractor::deep_read().extract(doc);
    truncate_chars(&extracted.text, max_chars).to_string()
}

/// Deep-read word count of a document.
pub fn deep_read_word_count(doc: &Document) -> usize {
    ContentExtractor::deep_read().extract(doc).word_count
}

/// Removes every element matching one of `selectors` from an HTML string.
///
/// Selectors the rewriter cannot parse are skipped. If rewriting fails the input
/// is returned unchanged.
pub fn remove_noise(html: &str, selectors: &[String]) -> String {
    let valid: Vec<&str> = selectors
        .iter()
        .map(String::as_str)
        .filter(|sel| match sel.parse::<lol_html::Selector>() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(selector = %sel, error = %e, "ignoring unsupported noise selector");
                false
            }
        })
        .collect();

    if valid.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: valid
                .iter()
                .map(|sel| {
                    lol_html::element!(*sel, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    output
}
