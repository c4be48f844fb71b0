pub mod json;
pub mod text;

pub use json::{JsonConfig, JsonFormatter, convert_to_json};
pub use text::{TextConfig, TextFormatter, convert_to_text};

use crate::analyzer::PageAnalysis;
use crate::semantic::SemanticResult;
use crate::stability::StableReason;

/// Everything a report renders for one page.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub analysis: &'a PageAnalysis,
    pub stable_reason: Option<StableReason>,
    pub semantic: Option<&'a SemanticResult>,
}

impl<'a> Report<'a> {
    pub fn new(analysis: &'a PageAnalysis) -> Self {
        Self { analysis, stable_reason: None, semantic: None }
    }

    pub fn with_stable_reason(mut self, reason: Option<StableReason>) -> Self {
        self.stable_reason = reason;
        self
    }

    pub fn with_semantic(mut self, semantic: Option<&'a SemanticResult>) -> Self {
        self.semantic = semantic;
        self
    }
}
