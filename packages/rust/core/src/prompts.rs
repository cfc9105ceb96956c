//! Prompt templates with named `{placeholder}` slots.

use analyst_shared::{AnalystError, Result};

/// Summarise internal documents and web results into market insights.
pub const INSIGHT_PROMPT: PromptTemplate = PromptTemplate::new(
    "insights",
    "Using the internal documents and web results, summarize market insights:\n\
     Internal:\n{internal}\n\
     Web:\n{web}",
);

/// Turn insights into a four-section SWOT report.
pub const SWOT_PROMPT: PromptTemplate = PromptTemplate::new(
    "swot",
    "Generate a SWOT Analysis based on the following:\n\
     {insights}\n\
     Format as:\n\
     Strengths:\n...\n\
     Weaknesses:\n...\n\
     Opportunities:\n...\n\
     Threats:\n...",
);

/// A prompt with `{name}` placeholders (lowercase ASCII and `_`).
///
/// Braces that do not enclose a placeholder name are copied through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Substitute every placeholder in a single pass.
    ///
    /// Substituted values are never rescanned, so text containing braces is
    /// inserted verbatim. A placeholder without a value is a validation
    /// error.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let values_len: usize = values.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(self.text.len() + values_len);
        let mut rest = self.text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if is_placeholder(&after[..close]) => {
                    let key = &after[..close];
                    let value = values
                        .iter()
                        .find(|(k, _)| *k == key)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            AnalystError::validation(format!(
                                "prompt '{}' has no value for {{{key}}}",
                                self.name
                            ))
                        })?;
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}
