//! Content stability detection and on-page analysis.
//!
//! The engine watches a live document until it settles, then measures it:
//! title, description, robots, canonical, heading outline, links, social
//! markup, main-content word count and readability. The optional semantic
//! layer embeds a weighted page payload and picks the sentence closest to it.
//!
//! ```rust
//! use pagesense_core::{Analyzer, Document};
//!
//! let doc = Document::parse("<html><head><title>Hi</title></head><body><h1>Hi</h1></body></html>").unwrap();
//! let analysis = Analyzer::new().analyze(&doc);
//! assert_eq!(analysis.title, "Hi");
//! ```

pub mod analyzer;
pub mod embed;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod headings;
pub mod parse;
pub mod readability;
pub mod semantic;
pub mod signals;
pub mod source;
pub mod stability;

pub use analyzer::{Analyzer, AnalyzerConfig, AnalyzerConfigBuilder, PageAnalysis, analyze, analyze_with_url};
#[cfg(feature = "fetch")]
pub use analyzer::fetch_and_analyze;
#[cfg(feature = "fetch")]
pub use embed::OpenAiEmbedder;
pub use embed::{EmbedOptions, Embedder, HashingEmbedder, Pooling, cosine_similarity, l2_normalize};
pub use error::{PagesenseError, Result};
pub use extract::{ContentExtractor, ExtractProfile, ExtractedText, Qualifier, Strategy, TextMode};
pub use extract::{deep_read_text, deep_read_word_count};
pub use fetch::{FetchConfig, LoadedPage};
pub use fetch::{fetch_file, fetch_page, fetch_stdin, fetch_url, load_page};
pub use formatters::{JsonConfig, JsonFormatter, Report, TextConfig, TextFormatter, convert_to_json, convert_to_text};
pub use headings::{HeadingRecord, collect_headings, validate_heading_hierarchy};
pub use parse::{Document, Element};
pub use readability::{GradeBand, ReadabilityResult, calculate_readability, count_syllables};
pub use semantic::{
    Centroid, CentroidSelector, HeadingAlignment, SemanticAnalyzer, SemanticConfig, SemanticResult, WeightedPayload,
    WeightedVectorBuilder, weighted_payload,
};
pub use signals::{CanonicalStatus, LinkAnalysis, LinkItem, RobotsStatus, SocialTags};
pub use source::{DocumentSource, LiveDocument, MutationEvent, MutationSubscription};
pub use stability::{StabilityConfig, StabilityHandle, StabilityMonitor, StabilityState, StableReason};
