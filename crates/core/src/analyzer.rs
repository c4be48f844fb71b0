//! Page analysis API.
//!
//! [`Analyzer`] runs every synchronous measurement over one document snapshot
//! and returns a [`PageAnalysis`]: title, meta description, robots, canonical,
//! heading outline, links, social markup, main-content word count and
//! readability. The stability monitor calls it once the page settles; hosts can
//! also call it directly, along with the convenience functions below.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::analyzer::analyze;
//!
//! let html = r#"<html><head><title>Guide</title></head>
//!     <body><main><h1>Guide</h1><p>Short words are easy to read. They are.</p></main></body></html>"#;
//! let analysis = analyze(html).unwrap();
//! assert_eq!(analysis.title, "Guide");
//! assert_eq!(analysis.headings.len(), 1);
//! ```

use serde::Serialize;
use url::Url;

use crate::extract::{ContentExtractor, ExtractProfile, Strategy};
use crate::headings::{HeadingRecord, collect_headings};
use crate::parse::Document;
use crate::readability::{ReadabilityResult, calculate_readability};
use crate::signals::{self, CanonicalStatus, LinkAnalysis, RobotsStatus, SocialTags};
use crate::{PagesenseError, Result};

/// Configuration for the [`Analyzer`].
///
/// # Example
///
/// ```rust
/// use pagesense_core::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .noise_selector(".newsletter")
///     .include_links(false)
///     .build();
/// assert!(!config.include_links);
/// ```
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Profile for the main-content text behind word count and readability.
    pub profile: ExtractProfile,

    /// Whether to collect the link report (default: true).
    pub include_links: bool,

    /// Whether to read Open Graph, Twitter and JSON-LD markup (default: true).
    pub include_social: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { profile: ExtractProfile::deep_read(), include_links: true, include_social: true }
    }
}

impl AnalyzerConfig {
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::new()
    }
}

/// Builder for AnalyzerConfig.
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: AnalyzerConfig::default() }
    }

    /// Replaces the extraction profile.
    pub fn profile(mut self, profile: ExtractProfile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Tries `strategy` before the built-in ones.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.profile = self.config.profile.with_priority_strategy(strategy);
        self
    }

    /// Adds a selector to the noise list.
    pub fn noise_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.profile = self.config.profile.with_noise_selector(selector);
        self
    }

    pub fn include_links(mut self, value: bool) -> Self {
        self.config.include_links = value;
        self
    }

    pub fn include_social(mut self, value: bool) -> Self {
        self.config.include_social = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

impl Default for AnalyzerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Every synchronous signal of one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub meta_description: String,
    pub robots: RobotsStatus,
    pub canonical: CanonicalStatus,
    pub headings: Vec<HeadingRecord>,
    pub links: LinkAnalysis,
    pub social: SocialTags,
    /// Words in the main-content text.
    pub word_count: usize,
    /// Strategy that selected the main content.
    pub content_strategy: String,
    pub readability: ReadabilityResult,
    /// Main-content text the counts were taken from.
    #[serde(skip)]
    pub main_text: String,
}

impl PageAnalysis {
    /// Analysis of a page with no content.
    pub fn empty(url: Option<String>) -> Self {
        Self {
            url,
            title: String::new(),
            meta_description: String::new(),
            robots: RobotsStatus { content: String::new(), is_indexable: true },
            canonical: CanonicalStatus::default(),
            headings: Vec::new(),
            links: LinkAnalysis::default(),
            social: SocialTags::default(),
            word_count: 0,
            content_strategy: String::new(),
            readability: calculate_readability(""),
            main_text: String::new(),
        }
    }

    /// Texts of the H1 and H2 headings, in document order.
    pub fn alignment_targets(&self) -> Vec<String> {
        self.headings.iter().filter(|h| h.level <= 2).map(|h| h.text.clone()).collect()
    }

    /// Headings flagged as skipping levels.
    pub fn heading_errors(&self) -> impl Iterator<Item = &HeadingRecord> {
        self.headings.iter().filter(|h| h.error.is_some())
    }
}

/// Main entry point for page analysis.
pub struct Analyzer {
    config: AnalyzerConfig,
    extractor: ContentExtractor,
}

impl Analyzer {
    /// Creates an analyzer with default settings.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        let extractor = ContentExtractor::new(config.profile.clone());
        Self { config, extractor }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Main-content word count under this analyzer's extraction profile.
    pub fn word_count(&self, doc: &Document) -> usize {
        self.extractor.extract(doc).word_count
    }

    /// Analyzes a parsed document.
    pub fn analyze(&self, doc: &Document) -> PageAnalysis {
        let main = self.extractor.extract(doc);
        let readability = calculate_readability(&main.text);

        let links = if self.config.include_links { signals::links(doc) } else { LinkAnalysis::default() };
        let social = if self.config.include_social { signals::social(doc) } else { SocialTags::default() };

        tracing::debug!(
            words = main.word_count,
            strategy = %main.strategy,
            grade = readability.score,
            "page analyzed"
        );

        PageAnalysis {
            url: doc.base_url().map(Url::to_string),
            title: doc.title(),
            meta_description: doc
                .select_first(r#"meta[name="description"]"#)
                .ok()
                .flatten()
                .and_then(|el| el.attr("content"))
                .unwrap_or_default()
                .to_string(),
            robots: signals::robots(doc),
            canonical: signals::canonical(doc),
            headings: collect_headings(doc),
            links,
            social,
            word_count: main.word_count,
            content_strategy: main.strategy,
            readability,
            main_text: main.text,
        }
    }

    /// Parses and analyzes an HTML string.
    pub fn analyze_html(&self, html: &str, url: Option<Url>) -> Result<PageAnalysis> {
        let doc = Document::parse_with_url(html, url)?;
        Ok(self.analyze(&doc))
    }

    /// Fetches a page and analyzes it.
    #[cfg(feature = "fetch")]
    pub async fn fetch_and_analyze(&self, url: &str, fetch_config: &crate::fetch::FetchConfig) -> Result<PageAnalysis> {
        let page = crate::fetch::fetch_page(url, fetch_config).await?;
        self.analyze_html(&page.html, page.url)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyzes an HTML string with defaults.
pub fn analyze(html: &str) -> Result<PageAnalysis> {
    Analyzer::new().analyze_html(html, None)
}

/// Analyzes an HTML string served from `url`.
///
/// # Errors
///
/// Returns [`PagesenseError::InvalidUrl`] if the URL is invalid.
pub fn analyze_with_url(html: &str, url: &str) -> Result<PageAnalysis> {
    let url = Url::parse(url).map_err(|e| PagesenseError::InvalidUrl(e.to_string()))?;
    Analyzer::new().analyze_html(html, Some(url))
}

/// Fetches and analyzes a page with defaults.
#[cfg(feature = "fetch")]
pub async fn fetch_and_analyze(url: &str) -> Result<PageAnalysis> {
    Analyzer::new()
        .fetch_and_analyze(url, &crate::fetch::FetchConfig::default())
        .await
}
