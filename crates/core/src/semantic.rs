//! Weighted document vectors and thesis sentence selection.
//!
//! The document vector embeds a payload that repeats the strongest signals:
//!
//! ```text
//! "{title} {title} {h1} {h1} {meta} {body}"
//! ```
//!
//! The thesis ("centroid") is the candidate sentence whose embedding is most
//! similar to that vector. Candidates pass two filter stages first:
//!
//! 1. Structure: no boilerplate phrases, no bare years, 15 to 50 words, ends in
//!    `.`, `?` or `!`, no `|`, `>` or `<`.
//! 2. Repetition: no 4-word phrase occurs twice (sentences of 8+ words).
//!
//! When nothing scores above the similarity threshold the selector falls back to
//! the first reasonable raw segment (the lede).

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use unicode_segmentation::UnicodeSegmentation;

use crate::{PagesenseError, Result};
use crate::embed::{EmbedOptions, Embedder, Pooling, cosine_similarity};
use crate::extract::{ContentExtractor, ExtractProfile, WEIGHTED_BODY_MAX_CHARS};
use crate::parse::{Document, Element, count_words};

static BLOCKLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(search for|post a job|last updated|edited by|read time|author:|breadcrumb)")
        .expect("valid blocklist pattern")
});
static BARE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d{4}\s*$").expect("valid year pattern"));

const TERMINALS: [char; 3] = ['.', '?', '!'];
const ANGLES_AND_PIPES: [char; 3] = ['|', '>', '<'];

/// Thresholds for the semantic summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticConfig {
    /// Texts shorter than this yield no centroid.
    pub min_text_chars: usize,
    pub min_sentence_words: usize,
    pub max_sentence_words: usize,
    /// Phrase length for the repetition check.
    pub shingle_size: usize,
    /// Sentences shorter than this skip the repetition check.
    pub shingle_min_words: usize,
    /// Best scores at or below this trigger the fallback.
    pub similarity_threshold: f32,
    /// Preferred fallback: longer than this and ends in terminal punctuation.
    pub fallback_terminal_min_chars: usize,
    /// Loose fallback: longer than this.
    pub fallback_min_chars: usize,
    /// Cap on the payload body.
    pub body_max_chars: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            min_sentence_words: 15,
            max_sentence_words: 50,
            shingle_size: 4,
            shingle_min_words: 8,
            similarity_threshold: 0.65,
            fallback_terminal_min_chars: 30,
            fallback_min_chars: 40,
            body_max_chars: WEIGHTED_BODY_MAX_CHARS,
        }
    }
}

impl SemanticConfig {
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_sentence_words(mut self, min: usize, max: usize) -> Self {
        self.min_sentence_words = min;
        self.max_sentence_words = max;
        self
    }

    pub fn with_body_max_chars(mut self, max_chars: usize) -> Self {
        self.body_max_chars = max_chars;
        self
    }
}

/// Primary signals of a page, ready to embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeightedPayload {
    pub title: String,
    pub meta_description: String,
    /// Visible text of the first `h1`.
    pub h1: String,
    /// Weighted-profile body text, capped.
    pub body: String,
}

impl WeightedPayload {
    /// Builds the payload with a custom body cap.
    pub fn from_document(doc: &Document, body_max_chars: usize) -> Self {
        let profile = ExtractProfile::weighted().with_max_chars(Some(body_max_chars));
        let body = ContentExtractor::new(profile).extract(doc).text;

        let h1 = doc
            .select_first("h1")
            .ok()
            .flatten()
            .map(|el: Element<'_>| el.visible_text().trim().to_string())
            .unwrap_or_default();

        Self {
            title: doc.title(),
            meta_description: doc
                .select_first(r#"meta[name="description"]"#)
                .ok()
                .flatten()
                .and_then(|el| el.attr("content"))
                .unwrap_or_default()
                .to_string(),
            h1,
            body,
        }
    }

    /// Title and h1 twice, then meta description and body.
    pub fn weighted_text(&self) -> String {
        format!("{0} {0} {1} {1} {2} {3}", self.title, self.h1, self.meta_description, self.body)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.meta_description.is_empty() && self.h1.is_empty() && self.body.is_empty()
    }
}

/// Gathers the weighted payload with the default 2500-char body cap.
pub fn weighted_payload(doc: &Document) -> WeightedPayload {
    WeightedPayload::from_document(doc, WEIGHTED_BODY_MAX_CHARS)
}

/// A sentence that survived both filter stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceCandidate {
    pub text: String,
    pub word_count: usize,
}

/// The selected thesis sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Centroid {
    pub sentence: String,
    /// Cosine similarity to the document vector.
    pub score: f32,
}

/// Similarity of one heading to the document vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingAlignment {
    pub text: String,
    pub score: f32,
}

/// Output of [`SemanticAnalyzer::summarize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticResult {
    /// L2-normalized weighted document vector.
    pub vector: Vec<f32>,
    pub centroid: Option<Centroid>,
    pub heading_alignment: Vec<HeadingAlignment>,
    /// Mean of `heading_alignment` scores, absent without headings.
    pub alignment_score: Option<f32>,
}

fn sentence_options() -> EmbedOptions {
    EmbedOptions { pooling: Pooling::Mean, normalize: true }
}

/// Embeds a [`WeightedPayload`] into the document vector.
pub struct WeightedVectorBuilder {
    embedder: Arc<dyn Embedder>,
}

impl WeightedVectorBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Returns the embedder output unchanged. A payload with no signals is
    /// rejected before the embedder is called.
    pub async fn build(&self, payload: &WeightedPayload) -> Result<Vec<f32>> {
        if payload.is_empty() {
            return Err(PagesenseError::EmptyInput);
        }
        let text = payload.weighted_text();
        tracing::debug!(chars = text.chars().count(), "embedding weighted document");
        self.embedder.embed(&text, sentence_options()).await
    }
}

/// Why a segment was dropped by the first filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Blocklisted,
    BareYear,
    WordCount,
    NoTerminalPunctuation,
    PipeOrAngle,
    RepeatedPhrase,
}

/// Picks the sentence closest to a target vector.
pub struct CentroidSelector {
    embedder: Arc<dyn Embedder>,
    config: SemanticConfig,
}

impl CentroidSelector {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(embedder, SemanticConfig::default())
    }

    pub fn with_config(embedder: Arc<dyn Embedder>, config: SemanticConfig) -> Self {
        Self { embedder, config }
    }

    /// Structural checks on one trimmed segment.
    pub fn screen(&self, segment: &str) -> std::result::Result<SentenceCandidate, Rejection> {
        if BLOCKLIST.is_match(segment) {
            return Err(Rejection::Blocklisted);
        }
        if BARE_YEAR.is_match(segment) {
            return Err(Rejection::BareYear);
        }

        let word_count = count_words(segment);
        if word_count < self.config.min_sentence_words || word_count > self.config.max_sentence_words {
            return Err(Rejection::WordCount);
        }
        if !segment.ends_with(TERMINALS) {
            return Err(Rejection::NoTerminalPunctuation);
        }
        if segment.contains(ANGLES_AND_PIPES) {
            return Err(Rejection::PipeOrAngle);
        }

        Ok(SentenceCandidate { text: segment.to_string(), word_count })
    }

    /// Both filter stages on one trimmed segment.
    pub fn check(&self, segment: &str) -> std::result::Result<SentenceCandidate, Rejection> {
        let candidate = self.screen(segment)?;
        if has_repeated_phrase(&candidate.text, self.config.shingle_size, self.config.shingle_min_words) {
            return Err(Rejection::RepeatedPhrase);
        }
        Ok(candidate)
    }

    /// Surviving segments of `text`, in order.
    pub fn candidates(&self, text: &str) -> Vec<SentenceCandidate> {
        segments(text).filter_map(|s| self.check(s).ok()).collect()
    }

    /// Selects the thesis of `text` against `target`.
    ///
    /// Candidates are embedded one at a time; a later candidate replaces the
    /// best only with a strictly greater score. `Ok(None)` when the text is too
    /// short or neither a candidate nor a fallback sentence is available.
    pub async fn select(&self, text: &str, target: &[f32]) -> Result<Option<Centroid>> {
        if text.chars().count() < self.config.min_text_chars {
            return Ok(None);
        }

        let candidates = self.candidates(text);
        tracing::debug!(count = candidates.len(), "centroid candidates after filtering");

        let mut best: Option<Centroid> = None;
        let mut max_score = -1.0f32;
        for candidate in &candidates {
            let vector = self.embedder.embed(&candidate.text, sentence_options()).await?;
            let score = cosine_similarity(target, &vector)?;
            if score > max_score {
                max_score = score;
                best = Some(Centroid { sentence: candidate.text.clone(), score });
            }
        }

        if max_score > self.config.similarity_threshold {
            if let Some(centroid) = &best {
                tracing::info!(score = centroid.score, "thesis selected");
            }
            return Ok(best);
        }

        tracing::debug!(max_score, "no candidate above threshold, trying fallback");
        let Some(lede) = self.fallback(text) else {
            tracing::warn!("no fallback sentence found");
            return Ok(None);
        };

        let vector = self.embedder.embed(lede, sentence_options()).await?;
        let score = cosine_similarity(target, &vector)?;
        tracing::info!(score, "thesis selected from fallback");
        Ok(Some(Centroid { sentence: lede.to_string(), score }))
    }

    /// First raw segment longer than 30 chars with terminal punctuation, else
    /// the first longer than 40.
    pub fn fallback<'t>(&self, text: &'t str) -> Option<&'t str> {
        segments(text)
            .find(|s| s.chars().count() > self.config.fallback_terminal_min_chars && s.ends_with(TERMINALS))
            .or_else(|| segments(text).find(|s| s.chars().count() > self.config.fallback_min_chars))
    }
}

/// UAX #29 sentence segments, trimmed, empty ones dropped.
fn segments(text: &str) -> impl Iterator<Item = &str> {
    text.split_sentence_bounds().map(str::trim).filter(|s| !s.is_empty())
}

/// True when a `size`-word phrase occurs more than once.
///
/// Words are lowercased with punctuation stripped. Sentences below `min_words`
/// are never rejected.
pub fn has_repeated_phrase(sentence: &str, size: usize, min_words: usize) -> bool {
    let cleaned: String = sentence
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() < min_words || size == 0 {
        return false;
    }

    let mut seen = HashSet::new();
    words.windows(size).any(|phrase| !seen.insert(phrase.join(" ")))
}

/// Vector, thesis and heading alignment for one page.
pub struct SemanticAnalyzer {
    embedder: Arc<dyn Embedder>,
    config: SemanticConfig,
}

impl SemanticAnalyzer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(embedder, SemanticConfig::default())
    }

    pub fn with_config(embedder: Arc<dyn Embedder>, config: SemanticConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }

    /// Builds the document vector, then selects the thesis from `full_text`
    /// and scores each of `headings` against the vector.
    ///
    /// An embedding failure anywhere yields `None`; it is logged, not retried.
    pub async fn summarize(
        &self, payload: &WeightedPayload, full_text: &str, headings: &[String],
    ) -> Option<SemanticResult> {
        match self.try_summarize(payload, full_text, headings).await {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::warn!(error = %err, model = self.embedder.model_name(), "semantic summary failed");
                None
            }
        }
    }

    async fn try_summarize(
        &self, payload: &WeightedPayload, full_text: &str, headings: &[String],
    ) -> Result<SemanticResult> {
        let vector = WeightedVectorBuilder::new(Arc::clone(&self.embedder)).build(payload).await?;

        let selector = CentroidSelector::with_config(Arc::clone(&self.embedder), self.config.clone());
        let centroid = selector.select(full_text, &vector).await?;

        let mut heading_alignment = Vec::new();
        for heading in headings.iter().map(|h| h.trim()).filter(|h| !h.is_empty()) {
            let heading_vector = self.embedder.embed(heading, sentence_options()).await?;
            let score = cosine_similarity(&vector, &heading_vector)?;
            heading_alignment.push(HeadingAlignment { text: heading.to_string(), score });
        }

        let alignment_score = if heading_alignment.is_empty() {
            None
        } else {
            Some(heading_alignment.iter().map(|a| a.score).sum::<f32>() / heading_alignment.len() as f32)
        };

        Ok(SemanticResult { vector, centroid, heading_alignment, alignment_score })
    }

    /// Payload with this analyzer's body cap.
    pub fn payload(&self, doc: &Document) -> WeightedPayload {
        WeightedPayload::from_document(doc, self.config.body_max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const THESIS: &str = "Stable pages let the analyzer read the main content once the rendering framework has \
        finished inserting every paragraph.";
    const OTHER: &str = "Readers often skim the introduction before deciding whether the remaining sections of \
        a long article deserve attention.";

    /// Returns fixed vectors per text and records every call.
    struct ScriptedEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        default: Vec<f32>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptedEmbedder {
        fn new(vectors: &[(&str, Vec<f32>)], default: Vec<f32>) -> Self {
            Self {
                vectors: vectors.iter().map(|(t, v)| (t.to_string(), v.clone())).collect(),
                default,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new(&[], vec![1.0, 0.0, 0.0]) }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Embedder for ScriptedEmbedder {
        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn teardown(&self) -> Result<()> {
            Ok(())
        }

        async fn embed(&self, text: &str, _options: EmbedOptions) -> Result<Vec<f32>> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(PagesenseError::Embedding("scripted failure".to_string()));
            }
            Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.default.clone()))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn selector(embedder: ScriptedEmbedder) -> (Arc<ScriptedEmbedder>, CentroidSelector) {
        let embedder = Arc::new(embedder);
        let selector = CentroidSelector::new(embedder.clone());
        (embedder, selector)
    }

    #[tokio::test]
    async fn test_selects_sentence_matching_target() {
        let target = vec![0.0, 1.0, 0.0];
        let (_, selector) = selector(ScriptedEmbedder::new(
            &[(THESIS, target.clone()), (OTHER, vec![1.0, 0.0, 0.0])],
            vec![0.0, 0.0, 1.0],
        ));

        let text = format!("{} {}", OTHER, THESIS);
        let centroid = selector.select(&text, &target).await.unwrap().unwrap();
        assert_eq!(centroid.sentence, THESIS);
        assert!((centroid.score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_tie_keeps_first_seen() {
        let target = vec![1.0, 0.0, 0.0];
        let (_, selector) = selector(ScriptedEmbedder::new(&[], target.clone()));

        let text = format!("{} {}", OTHER, THESIS);
        let centroid = selector.select(&text, &target).await.unwrap().unwrap();
        assert_eq!(centroid.sentence, OTHER);
    }

    #[tokio::test]
    async fn test_hashing_embedder_identity_scores_one() {
        let embedder = Arc::new(HashingEmbedder::new(256));
        embedder.init().await.unwrap();
        let target = embedder.embed(THESIS, sentence_options()).await.unwrap();

        let selector = CentroidSelector::new(embedder);
        let text = format!("{} {}", OTHER, THESIS);
        let centroid = selector.select(&text, &target).await.unwrap().unwrap();
        assert_eq!(centroid.sentence, THESIS);
        assert!((centroid.score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_short_text_yields_none() {
        let (embedder, selector) = selector(ScriptedEmbedder::new(&[], vec![1.0, 0.0, 0.0]));
        assert!(selector.select("Too short to matter.", &[1.0, 0.0, 0.0]).await.unwrap().is_none());
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_and_no_fallback_yields_none() {
        let (embedder, selector) = selector(ScriptedEmbedder::new(&[], vec![1.0, 0.0, 0.0]));
        let text = "Menu item one. Menu item two. Menu item three. Menu item four.";
        assert!(text.len() >= 50);

        let result = selector.select(text, &[1.0, 0.0, 0.0]).await.unwrap();
        assert!(result.is_none());
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_low_scores_fall_back_to_lede() {
        let target = vec![1.0, 0.0, 0.0];
        let (embedder, selector) = selector(ScriptedEmbedder::new(&[], vec![0.0, 1.0, 0.0]));

        let lede = "This short lede opens the whole page.";
        let text = format!("Tiny. {} {}", lede, THESIS);
        let centroid = selector.select(&text, &target).await.unwrap().unwrap();

        assert_eq!(centroid.sentence, lede);
        assert_eq!(centroid.score, 0.0);
        assert_eq!(embedder.calls(), vec![THESIS.to_string(), lede.to_string()]);
    }

    #[tokio::test]
    async fn test_loose_fallback_without_punctuation() {
        let (_, selector) = selector(ScriptedEmbedder::new(&[], vec![0.0, 1.0, 0.0]));
        let text = "a navigation strip that never ends with any punctuation at all";

        let centroid = selector.select(text, &[1.0, 0.0, 0.0]).await.unwrap().unwrap();
        assert_eq!(centroid.sentence, text);
    }

    #[test]
    fn test_screen_rejections() {
        let selector = CentroidSelector::new(Arc::new(HashingEmbedder::default()));
        let long = |s: &str| format!("{} one two three four five six seven eight nine ten eleven twelve.", s);

        assert_eq!(selector.screen(&long("Last updated by the team")), Err(Rejection::Blocklisted));
        assert_eq!(selector.screen(&long("Please search for")), Err(Rejection::Blocklisted));
        assert_eq!(selector.screen(" 2024 "), Err(Rejection::BareYear));
        assert_eq!(selector.screen("Only a few words here."), Err(Rejection::WordCount));
        assert_eq!(selector.screen(&"word ".repeat(51)), Err(Rejection::WordCount));
        assert_eq!(selector.screen(&long("Home > Blog > Post").replace('.', "")), Err(Rejection::NoTerminalPunctuation));
        assert_eq!(selector.screen(&long("Home > Blog > Post")), Err(Rejection::PipeOrAngle));
        assert_eq!(selector.screen(&long("Tags | News | Rust")), Err(Rejection::PipeOrAngle));
        assert!(selector.screen(THESIS).is_ok());
    }

    #[test]
    fn test_sentence_word_bounds_are_configurable() {
        let config = SemanticConfig::default().with_sentence_words(3, 6);
        let selector = CentroidSelector::with_config(Arc::new(HashingEmbedder::default()), config);

        assert!(selector.screen("Only a few words here.").is_ok());
        assert_eq!(selector.screen("Too short."), Err(Rejection::WordCount));
        assert_eq!(selector.screen(THESIS), Err(Rejection::WordCount));
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_embedded() {
        let embedder = Arc::new(ScriptedEmbedder::new(&[], vec![1.0, 0.0, 0.0]));
        let builder = WeightedVectorBuilder::new(embedder.clone());

        let err = builder.build(&WeightedPayload::default()).await.unwrap_err();
        assert!(matches!(err, PagesenseError::EmptyInput));
        assert!(embedder.calls().is_empty());

        let payload = WeightedPayload { h1: "Heading".to_string(), ..Default::default() };
        assert_eq!(builder.build(&payload).await.unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(embedder.calls().len(), 1);
    }

    #[test]
    fn test_repeated_phrase_rejected() {
        let repeated = "The quick brown fox jumps over the lazy dog and then the quick brown fox sleeps.";
        let rearranged = "The quick brown fox jumps over the lazy dog and then a brown quick fox sleeps.";
        assert!(has_repeated_phrase(repeated, 4, 8));
        assert!(!has_repeated_phrase(rearranged, 4, 8));
    }

    #[test]
    fn test_check_reports_repetition() {
        let selector = CentroidSelector::new(Arc::new(HashingEmbedder::default()));
        let repeated = "The quick brown fox jumps over the lazy dog and then the quick brown fox sleeps in the sun.";
        assert_eq!(selector.check(repeated), Err(Rejection::RepeatedPhrase));
        assert!(selector.check(THESIS).is_ok());
    }

    #[test]
    fn test_repetition_ignores_case_and_punctuation() {
        assert!(has_repeated_phrase("Go to the shop, then GO TO THE SHOP again today.", 4, 8));
    }

    #[test]
    fn test_short_sentences_skip_repetition_check() {
        assert!(!has_repeated_phrase("a b c d a b c", 4, 8));
        assert!(!has_repeated_phrase("to be to be to be to", 2, 8));
    }

    #[test]
    fn test_candidates_apply_both_stages() {
        let selector = CentroidSelector::new(Arc::new(HashingEmbedder::default()));
        let repeated = "The quick brown fox jumps over the lazy dog and then the quick brown fox sleeps in the sun.";
        let text = format!("{} Read time: five minutes. {} {}", repeated, THESIS, OTHER);

        let texts: Vec<String> = selector.candidates(&text).into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec![THESIS.to_string(), OTHER.to_string()]);
    }

    #[test]
    fn test_weighted_text_repeats_title_and_h1() {
        let payload = WeightedPayload {
            title: "T".to_string(),
            meta_description: "M".to_string(),
            h1: "H".to_string(),
            body: "B".to_string(),
        };
        assert_eq!(payload.weighted_text(), "T T H H M B");
    }

    #[test]
    fn test_weighted_payload_from_document() {
        let paragraphs = "<p>Paragraph text that is long enough to count toward the density rule for articles here.</p>"
            .repeat(8);
        let html = format!(
            r#"<html><head><title>Guide</title><meta name="description" content="About guides"></head>
            <body><nav>Menu</nav><article><h1>Main <span>Heading</span></h1>{}
            <div class="cookie-banner">Accept cookies</div></article></body></html>"#,
            paragraphs
        );
        let doc = Document::parse(&html).unwrap();
        let payload = weighted_payload(&doc);

        assert_eq!(payload.title, "Guide");
        assert_eq!(payload.meta_description, "About guides");
        assert_eq!(payload.h1, "Main Heading");
        assert!(payload.body.starts_with("Main Heading Paragraph text"));
        assert!(!payload.body.contains("cookies"));
        assert!(!payload.body.contains("Menu"));
    }

    #[test]
    fn test_payload_body_is_capped() {
        let html = format!("<html><body><p>{}</p></body></html>", "x".repeat(4000));
        let doc = Document::parse(&html).unwrap();
        assert_eq!(weighted_payload(&doc).body.chars().count(), WEIGHTED_BODY_MAX_CHARS);

        let analyzer = SemanticAnalyzer::with_config(
            Arc::new(HashingEmbedder::default()),
            SemanticConfig::default().with_body_max_chars(100),
        );
        assert_eq!(analyzer.payload(&doc).body.chars().count(), 100);
    }

    #[tokio::test]
    async fn test_summarize_with_alignment() {
        let embedder = Arc::new(HashingEmbedder::new(256));
        embedder.init().await.unwrap();
        let analyzer = SemanticAnalyzer::new(embedder);

        let payload = WeightedPayload {
            title: "Stable pages".to_string(),
            h1: "Reading stable pages".to_string(),
            body: format!("{} {}", THESIS, OTHER),
            ..Default::default()
        };
        let headings = vec!["Reading stable pages".to_string(), "  ".to_string(), "Unrelated bananas".to_string()];
        let result = analyzer.summarize(&payload, &payload.body, &headings).await.unwrap();

        assert_eq!(result.vector.len(), 256);
        assert!(result.centroid.is_some());
        assert_eq!(result.heading_alignment.len(), 2);
        assert!(result.heading_alignment[0].score > result.heading_alignment[1].score);

        let mean = (result.heading_alignment[0].score + result.heading_alignment[1].score) / 2.0;
        assert!((result.alignment_score.unwrap() - mean).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_summarize_without_headings_has_no_alignment() {
        let analyzer = SemanticAnalyzer::new(Arc::new(ScriptedEmbedder::new(&[], vec![1.0, 0.0, 0.0])));
        let payload = WeightedPayload { title: "T".to_string(), ..Default::default() };

        let result = analyzer.summarize(&payload, "", &[]).await.unwrap();
        assert!(result.centroid.is_none());
        assert!(result.alignment_score.is_none());
    }

    #[tokio::test]
    async fn test_summarize_embedding_failure_is_none() {
        let embedder = Arc::new(ScriptedEmbedder::failing());
        let analyzer = SemanticAnalyzer::new(embedder.clone());
        let payload = WeightedPayload { title: "T".to_string(), ..Default::default() };

        assert!(analyzer.summarize(&payload, THESIS, &[]).await.is_none());
        assert_eq!(embedder.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_uninitialized_embedder_fails_summary() {
        let analyzer = SemanticAnalyzer::new(Arc::new(HashingEmbedder::default()));
        let payload = WeightedPayload { title: "T".to_string(), ..Default::default() };
        assert!(analyzer.summarize(&payload, THESIS, &[]).await.is_none());
    }
}
