// Summarizer LLM prompt templates.
// All prompts for the summarize module are defined here.

/// Per-chunk "map" prompt. Replace `{chunk}` before sending.
pub const CHUNK_SUMMARY_PROMPT: &str = r#"The following is an excerpt from a field-visit journal report submitted after a previous community-service visit.

Write a concise summary of this excerpt in 2-3 sentences. Keep concrete facts: places, dates, activities carried out, observations, and planned follow-ups.

EXCERPT:
{chunk}"#;

/// Final "reduce" prompt over the joined partial summaries.
/// Replace `{partial_summaries}` before sending.
pub const COMBINE_SUMMARY_PROMPT: &str = r#"The following are partial summaries of consecutive sections of a previous field-visit journal report.

Synthesize them into one coherent summary of at most 200 words. Preserve the activities carried out, the observations made, and anything the author planned to do on the next visit. Do not add information that is not in the partial summaries.

PARTIAL SUMMARIES:
{partial_summaries}"#;
