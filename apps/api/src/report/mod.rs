//! Report Composer — renders the journal prompt and issues exactly one
//! backend call per submission.
//!
//! The composer interpolates collected fields verbatim and returns the
//! generated text unmodified: no post-processing, truncation, or validation
//! of the model's output. The wizard guarantees `actions` is non-empty
//! before calling in.

pub mod prompts;

use chrono::NaiveDate;

use crate::llm_client::{LlmError, TextGenerator};
use crate::models::visit::VisitRecord;
use crate::report::prompts::REPORT_PROMPT_TEMPLATE;

/// Interpolated for an absent visit date.
pub const NO_DATE_PROVIDED: &str = "No date provided";

/// The fully rendered request handed to the backend. Assembled immediately
/// before the call and never persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Formats a visit date as `YYYY-MM-DD`, or the fixed fallback literal when
/// the user left the date empty.
pub fn format_visit_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => NO_DATE_PROVIDED.to_string(),
    }
}

pub struct ReportComposer {
    template: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl ReportComposer {
    /// `template` overrides the built-in prompt when provided (deployments
    /// have historically tuned the wording without a code change).
    pub fn new(template: Option<String>, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            template: template.unwrap_or_else(|| REPORT_PROMPT_TEMPLATE.to_string()),
            temperature,
            max_output_tokens,
        }
    }

    /// Renders the prompt for a record. Optional fields interpolate as the
    /// empty string; the prior summary is whatever the summarizer produced,
    /// including the empty string for a document with no extractable text.
    pub fn render_prompt(&self, record: &VisitRecord, prior_summary: &str) -> String {
        self.template
            .replace("{project}", record.project.label())
            .replace("{visit_number}", record.visit_number.label())
            .replace("{visit_date}", &format_visit_date(record.visit_date))
            .replace("{actions}", &record.actions)
            .replace("{previous_report_summary}", prior_summary)
            .replace(
                "{media_description}",
                record.media_description.as_deref().unwrap_or_default(),
            )
    }

    /// Assembles the generation request and performs the single backend
    /// call. The returned text is the model output, untouched.
    pub async fn compose(
        &self,
        backend: &dyn TextGenerator,
        credential: &str,
        record: &VisitRecord,
        prior_summary: &str,
    ) -> Result<String, LlmError> {
        let request = GenerationRequest {
            prompt: self.render_prompt(record, prior_summary),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        backend
            .generate(
                credential,
                &request.prompt,
                request.temperature,
                request.max_output_tokens,
            )
            .await
    }
}
