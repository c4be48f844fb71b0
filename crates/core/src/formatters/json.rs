use serde::Serialize;

use crate::Result;
use crate::analyzer::PageAnalysis;
use crate::formatters::Report;
use crate::semantic::{Centroid, HeadingAlignment};
use crate::stability::StableReason;

/// Complete JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    pub analysis: &'a PageAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable_reason: Option<StableReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<JsonSemantic<'a>>,
}

/// Semantic summary for JSON output
#[derive(Debug, Serialize)]
pub struct JsonSemantic<'a> {
    pub dimension: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<&'a [f32]>,
    pub centroid: Option<&'a Centroid>,
    pub heading_alignment: &'a [HeadingAlignment],
    pub alignment_score: Option<f32>,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Include the full document vector
    pub include_vector: bool,
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Convert a report to JSON
pub fn convert_to_json(report: &Report<'_>, config: &JsonConfig) -> Result<String> {
    let semantic = report.semantic.map(|s| JsonSemantic {
        dimension: s.vector.len(),
        vector: if config.include_vector { Some(s.vector.as_slice()) } else { None },
        centroid: s.centroid.as_ref(),
        heading_alignment: &s.heading_alignment,
        alignment_score: s.alignment_score,
    });

    let output = JsonOutput { analysis: report.analysis, stable_reason: report.stable_reason, semantic };

    if config.pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, report: &Report<'_>) -> Result<String> {
        convert_to_json(report, &self.config)
    }
}
