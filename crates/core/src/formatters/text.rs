use std::fmt::Write;

use crate::Result;
use crate::formatters::Report;
use crate::stability::StableReason;

/// Configuration for plain text output
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// List every internal and external link
    pub include_links: bool,

    /// Print the section text under each heading
    pub include_sections: bool,

    /// Wrap long values at specified width (0 = no wrapping)
    pub line_width: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { include_links: false, include_sections: false, line_width: 80 }
    }
}

/// Plain text formatter for page reports
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, report: &Report<'_>) -> Result<String> {
        convert_to_text(report, &self.config)
    }
}

/// Render a report as plain text with specified configuration
pub fn convert_to_text(report: &Report<'_>, config: &TextConfig) -> Result<String> {
    let mut out = String::new();
    let analysis = report.analysis;

    let title = if analysis.title.is_empty() { "(untitled)" } else { analysis.title.as_str() };
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push_str("\n\n");

    if let Some(url) = &analysis.url {
        field(&mut out, "URL", url);
    }
    if !analysis.meta_description.is_empty() {
        field(&mut out, "Description", &wrap_text(&analysis.meta_description, config.line_width));
    }
    let robots = if analysis.robots.content.is_empty() { "(missing)" } else { analysis.robots.content.as_str() };
    field(
        &mut out,
        "Robots",
        &format!("{} ({})", robots, if analysis.robots.is_indexable { "indexable" } else { "noindex" }),
    );
    if analysis.canonical.href.is_empty() {
        field(&mut out, "Canonical", "(missing)");
    } else {
        let verdict = if analysis.canonical.is_match { "matches" } else { "differs" };
        field(&mut out, "Canonical", &format!("{} ({})", analysis.canonical.href, verdict));
    }
    if let Some(reason) = report.stable_reason {
        field(&mut out, "Stable", reason_label(reason));
    }

    out.push_str("\nContent\n-------\n");
    field(&mut out, "Words", &analysis.word_count.to_string());
    if !analysis.content_strategy.is_empty() {
        field(&mut out, "Root", &analysis.content_strategy);
    }
    field(
        &mut out,
        "Readability",
        &format!("{} ({:.1})", analysis.readability.label, analysis.readability.score),
    );

    out.push_str("\nHeadings\n--------\n");
    if analysis.headings.is_empty() {
        out.push_str("(none)\n");
    }
    for heading in &analysis.headings {
        let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
        let _ = writeln!(out, "{}{}: {}", indent, heading.tag.to_uppercase(), heading.text);
        if let Some(error) = &heading.error {
            let _ = writeln!(out, "{}  ! {}", indent, error);
        }
        if config.include_sections && !heading.content.is_empty() {
            for line in wrap_text(&heading.content, config.line_width).lines() {
                let _ = writeln!(out, "{}    {}", indent, line);
            }
        }
    }

    let counts = &analysis.links.counts;
    let _ = write!(
        out,
        "\nLinks\n-----\n{} total, {} internal, {} external\n",
        counts.total, counts.internal, counts.external
    );
    if config.include_links {
        for (kind, items) in [("internal", &analysis.links.internal), ("external", &analysis.links.external)] {
            for link in items {
                let _ = writeln!(out, "  [{}] {} -> {}", kind, link.anchor, link.href);
            }
        }
    }

    let social = &analysis.social;
    out.push_str("\nSocial\n------\n");
    field(&mut out, "Open Graph", presence(social.open_graph.exists));
    field(&mut out, "Twitter", presence(social.twitter_card.exists));
    field(&mut out, "JSON-LD", &format!("{} item(s)", social.schema_org.data.len()));

    if let Some(semantic) = report.semantic {
        out.push_str("\nSemantics\n---------\n");
        match &semantic.centroid {
            Some(centroid) => {
                field(&mut out, "Thesis", &format!("{:.3}", centroid.score));
                out.push_str(&wrap_text(&centroid.sentence, config.line_width));
                out.push('\n');
            }
            None => field(&mut out, "Thesis", "(none)"),
        }
        for heading in &semantic.heading_alignment {
            let _ = writeln!(out, "  {:.3}  {}", heading.score, heading.text);
        }
        if let Some(score) = semantic.alignment_score {
            field(&mut out, "Alignment", &format!("{:.3}", score));
        }
    }

    Ok(out.trim_end().to_string())
}

fn field(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "{}: {}", name, value);
}

fn presence(exists: bool) -> &'static str {
    if exists { "present" } else { "missing" }
}

fn reason_label(reason: StableReason) -> &'static str {
    match reason {
        StableReason::Debounce => "quiet period elapsed",
        StableReason::WordCountJump => "word count jumped",
        StableReason::KillSwitch => "kill switch",
    }
}

/// Wrap text to specified width
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let len = current.chars().count();
        if len > 0 && len + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_with_url;
    use crate::semantic::{Centroid, HeadingAlignment, SemanticResult};

    const PAGE_HTML: &str = r#"<html><head><title>Guide</title>
        <meta name="description" content="How to read the guide.">
        <meta name="robots" content="noindex">
        <meta property="og:title" content="Guide">
        </head><body>
        <h1>Guide</h1> <p>Intro text.</p>
        <h3>Deep</h3> <p>Body text.</p>
        <a href="/about">About</a> <a href="https://other.example/">Other</a>
        </body></html>"#;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three four", 9), "one two\nthree\nfour");
        assert_eq!(wrap_text("one two", 0), "one two");
        assert_eq!(wrap_text("", 10), "");
    }

    #[test]
    fn test_report_sections() {
        let analysis = analyze_with_url(PAGE_HTML, "https://example.com/guide").unwrap();
        let text = convert_to_text(&Report::new(&analysis), &TextConfig::default()).unwrap();

        assert!(text.starts_with("Guide\n=====\n"));
        assert!(text.contains("URL: https://example.com/guide"));
        assert!(text.contains("Description: How to read the guide."));
        assert!(text.contains("Robots: noindex (noindex)"));
        assert!(text.contains("Canonical: (missing)"));
        assert!(text.contains("H1: Guide"));
        assert!(text.contains("    H3: Deep"));
        assert!(text.contains("! Skipped heading level: H1 -> H3"));
        assert!(text.contains("2 total, 1 internal, 1 external"));
        assert!(text.contains("Open Graph: present"));
        assert!(text.contains("Twitter: missing"));
        assert!(!text.contains("Semantics"));
        assert!(!text.contains("[internal]"));
    }

    #[test]
    fn test_links_and_semantics() {
        let analysis = analyze_with_url(PAGE_HTML, "https://example.com/guide").unwrap();
        let semantic = SemanticResult {
            vector: vec![1.0],
            centroid: Some(Centroid { sentence: "Intro text.".to_string(), score: 0.8123 }),
            heading_alignment: vec![HeadingAlignment { text: "Guide".to_string(), score: 0.5 }],
            alignment_score: Some(0.5),
        };
        let report = Report::new(&analysis)
            .with_semantic(Some(&semantic))
            .with_stable_reason(Some(StableReason::KillSwitch));
        let config = TextConfig { include_links: true, ..Default::default() };
        let text = TextFormatter::new(config).convert(&report).unwrap();

        assert!(text.contains("Stable: kill switch"));
        assert!(text.contains("[internal] About -> https://example.com/about"));
        assert!(text.contains("[external] Other -> https://other.example/"));
        assert!(text.contains("Thesis: 0.812\nIntro text."));
        assert!(text.contains("  0.500  Guide"));
        assert!(text.contains("Alignment: 0.500"));
    }

    #[test]
    fn test_untitled_page() {
        let analysis = crate::analyzer::analyze("").unwrap();
        let text = convert_to_text(&Report::new(&analysis), &TextConfig::default()).unwrap();
        assert!(text.starts_with("(untitled)\n"));
        assert!(text.contains("Headings\n--------\n(none)"));
    }
}
