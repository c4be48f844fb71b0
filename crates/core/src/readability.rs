//! Flesch-Kincaid readability scoring.
//!
//! The grade is computed from sentence, word and syllable counts:
//!
//! ```text
//! grade = 0.39 * (words / sentences) + 11.8 * (syllables / words) - 15.59
//! ```
//!
//! then rounded to one decimal and clamped to `[0, 18]` so that markup noise
//! cannot produce grades like 42.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::readability::{GradeBand, calculate_readability};
//!
//! let result = calculate_readability("The cat sat on the mat. It was happy.");
//! assert_eq!(result.grade, GradeBand::Easy);
//!
//! let empty = calculate_readability("   ");
//! assert_eq!(empty.score, 0.0);
//! assert_eq!(empty.label, "N/A");
//! ```

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Upper bound of the reported grade.
pub const MAX_GRADE: f64 = 18.0;

static SENTENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence pattern"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("valid line break pattern"));
static SILENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").expect("valid suffix pattern"));
static LEADING_Y: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^y").expect("valid leading y pattern"));
static VOWEL_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[aeiouy]{1,2}").expect("valid vowel pattern"));

/// Reading difficulty bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBand {
    /// Grade 6 or below.
    Easy,
    /// Above 6, up to 10.
    Standard,
    /// Above 10, up to 14.
    Complex,
    /// Above 14.
    Difficult,
    /// No countable words.
    NotApplicable,
}

impl GradeBand {
    /// Maps a clamped score to its band.
    pub fn from_score(score: f64) -> Self {
        if score <= 6.0 {
            GradeBand::Easy
        } else if score <= 10.0 {
            GradeBand::Standard
        } else if score <= 14.0 {
            GradeBand::Complex
        } else {
            GradeBand::Difficult
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::Easy => "Easy (Elem)",
            GradeBand::Standard => "Standard (HS)",
            GradeBand::Complex => "Complex (College)",
            GradeBand::Difficult => "Difficult (Grad+)",
            GradeBand::NotApplicable => "N/A",
        }
    }

    /// Display color for report surfaces.
    pub fn color(&self) -> &'static str {
        match self {
            GradeBand::Easy => "#22c55e",
            GradeBand::Standard => "#f59e0b",
            GradeBand::Complex | GradeBand::Difficult => "#d9534f",
            GradeBand::NotApplicable => "#999",
        }
    }
}

/// Readability of a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadabilityResult {
    /// Grade level in `[0, 18]`, one decimal.
    pub score: f64,
    pub grade: GradeBand,
    /// Human-readable band label.
    pub label: &'static str,
    pub color: &'static str,
}

impl ReadabilityResult {
    fn not_applicable() -> Self {
        let grade = GradeBand::NotApplicable;
        Self { score: 0.0, grade, label: grade.label(), color: grade.color() }
    }
}

/// Raw counts behind a grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
}

impl TextStats {
    /// Counts sentences, words and syllables.
    ///
    /// Line breaks act as sentence terminators; the sentence count never drops
    /// below one. Words are whitespace tokens with at least one word character.
    pub fn from_text(text: &str) -> Self {
        let terminated = LINE_BREAK.replace_all(text, " . ");
        let sentences = SENTENCE.find_iter(&terminated).count().max(1);

        let words: Vec<&str> = text
            .split_whitespace()
            .filter(|w| w.chars().any(|c| c.is_ascii_alphanumeric() || c == '_'))
            .collect();
        let syllables = words.iter().map(|w| count_syllables(w)).sum();

        Self { sentences, words: words.len(), syllables }
    }

    /// Unrounded, unclamped Flesch-Kincaid grade. `None` without words.
    pub fn raw_grade(&self) -> Option<f64> {
        if self.words == 0 {
            return None;
        }
        let words = self.words as f64;
        Some(0.39 * (words / self.sentences as f64) + 11.8 * (self.syllables as f64 / words) - 15.59)
    }
}

/// Estimates the syllables in one word token.
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    if word.chars().count() <= 3 {
        return 1;
    }

    let stripped = SILENT_SUFFIX.replace(&word, "");
    let stripped = LEADING_Y.replace(&stripped, "");
    match VOWEL_GROUP.find_iter(&stripped).count() {
        0 => 1,
        n => n,
    }
}

/// Scores a text. Empty text, or text without countable words, scores 0 / N/A.
pub fn calculate_readability(text: &str) -> ReadabilityResult {
    if text.trim().is_empty() {
        return ReadabilityResult::not_applicable();
    }

    let Some(raw) = TextStats::from_text(text).raw_grade() else {
        return ReadabilityResult::not_applicable();
    };

    let score = ((raw * 10.0).round() / 10.0).clamp(0.0, MAX_GRADE);
    let grade = GradeBand::from_score(score);

    ReadabilityResult { score, grade, label: grade.label(), color: grade.color() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("the", 1)]
    #[case("cat", 1)]
    #[case("water", 2)]
    #[case("table", 2)]
    #[case("make", 1)]
    #[case("hopped", 1)]
    #[case("happy", 2)]
    #[case("yellow", 2)]
    #[case("rhythm", 1)]
    fn test_count_syllables(#[case] word: &str, #[case] expected: usize) {
        assert_eq!(count_syllables(word), expected);
    }

    #[rstest]
    #[case(0.0, GradeBand::Easy)]
    #[case(6.0, GradeBand::Easy)]
    #[case(6.1, GradeBand::Standard)]
    #[case(10.0, GradeBand::Standard)]
    #[case(14.0, GradeBand::Complex)]
    #[case(14.1, GradeBand::Difficult)]
    #[case(18.0, GradeBand::Difficult)]
    fn test_grade_bands(#[case] score: f64, #[case] expected: GradeBand) {
        assert_eq!(GradeBand::from_score(score), expected);
    }

    #[test]
    fn test_empty_text_is_not_applicable() {
        for text in ["", "   \n\t "] {
            let result = calculate_readability(text);
            assert_eq!(result.score, 0.0);
            assert_eq!(result.grade, GradeBand::NotApplicable);
            assert_eq!(result.label, "N/A");
        }
    }

    #[test]
    fn test_punctuation_only_is_not_applicable() {
        let result = calculate_readability("... --- !!!");
        assert_eq!(result.grade, GradeBand::NotApplicable);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_line_breaks_count_as_sentences() {
        let stats = TextStats::from_text("first line\nsecond line\nthird line.");
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.words, 6);
    }

    #[test]
    fn test_sentence_count_floors_at_one() {
        let stats = TextStats::from_text("no terminator here");
        assert_eq!(stats.sentences, 1);
    }

    #[test]
    fn test_simple_text_is_easy() {
        let result = calculate_readability("The cat sat on the mat. The dog ran to the park. We had fun.");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.grade, GradeBand::Easy);
    }

    #[test]
    fn test_dense_text_is_clamped() {
        let sentence = "Institutionalization notwithstanding, interdisciplinary epistemological considerations \
            characteristically necessitate comprehensive phenomenological reconceptualization ";
        let text = sentence.repeat(6);
        let result = calculate_readability(&text);
        assert_eq!(result.score, MAX_GRADE);
        assert_eq!(result.grade, GradeBand::Difficult);
    }

    #[test]
    fn test_score_always_in_range() {
        let samples = [
            "a.",
            "Go! Run! Now!",
            "One two three four five six seven eight nine ten eleven twelve.",
            "Unquestionably, understanding organizational communication requires consideration.",
            "x y z | > < 2024 ... ## ##",
        ];
        for text in samples {
            let score = calculate_readability(text).score;
            assert!((0.0..=MAX_GRADE).contains(&score), "{} out of range for {:?}", score, text);
        }
    }

    #[test]
    fn test_more_syllables_never_lowers_raw_grade() {
        let simple = TextStats::from_text("The dog ran far. The cat sat down.");
        let complex = TextStats::from_text("The elephant wandered purposefully. The tiger meditated quietly.");
        assert_eq!(simple.sentences, complex.sentences);

        let a = TextStats { sentences: 2, words: 8, syllables: 8 };
        let b = TextStats { syllables: 14, ..a };
        assert!(b.raw_grade().unwrap() >= a.raw_grade().unwrap());
        assert!(complex.raw_grade().unwrap() >= simple.raw_grade().unwrap());
    }
}
