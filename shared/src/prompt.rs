//! Instruction template sent to the model as the system prompt.

use std::path::Path;

use crate::knowledge_base::Passage;
use crate::{Error, Result};

/// Placeholder replaced with the numbered retrieval results.
pub const SEARCH_RESULTS_PLACEHOLDER: &str = "$search_results$";
/// Placeholder replaced with the answer formatting rules.
pub const OUTPUT_FORMAT_PLACEHOLDER: &str = "$output_format_instructions$";

/// Location reported for passages whose source has no S3 URI.
pub const UNKNOWN_SOURCE: &str = "N/A";

const DEFAULT_TEMPLATE: &str = include_str!("../prompts/system_prompt.txt");

const DEFAULT_OUTPUT_FORMAT: &str = "\
FORMATTING
- Always break the answer down when it has multiple parts.
- Put every subheading in bold on its own line and keep indentation consistent.
- Highlight important terms in bold where helpful.
- When listing information, use bullet points.";

/// Instruction document with search-result and output-format placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    output_format: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Build a template from custom text.
    ///
    /// The text must contain [`SEARCH_RESULTS_PLACEHOLDER`], otherwise the
    /// model would answer without any retrieved context.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(SEARCH_RESULTS_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "System prompt must contain the {} placeholder",
                SEARCH_RESULTS_PLACEHOLDER
            )));
        }
        Ok(Self {
            template,
            ..Self::default()
        })
    }

    /// Load a template from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read system prompt {}: {}", path.display(), e)))?;
        Self::new(text)
    }

    /// Resolve both placeholders against the passages for this question.
    pub fn render(&self, passages: &[Passage]) -> String {
        self.template
            .replace(SEARCH_RESULTS_PLACEHOLDER, &format_search_results(passages))
            .replace(OUTPUT_FORMAT_PLACEHOLDER, &self.output_format)
    }
}

/// Format passages as numbered result blocks.
pub fn format_search_results(passages: &[Passage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            format!(
                "[Result #{}]\nContent:\n{}\nSource: {}\n\n",
                i + 1,
                passage.text,
                passage.uri.as_deref().unwrap_or(UNKNOWN_SOURCE)
            )
        })
        .collect()
}
