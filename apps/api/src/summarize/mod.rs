//! Summarizer — bounds a prior report's extracted text to a short synopsis.
//!
//! Flow: split into overlapping fixed-size chunks → one backend call per
//! chunk ("map") → one backend call over the joined partials ("reduce").
//! Results are memoized by exact input text for the process lifetime, with
//! at-most-once execution per key under concurrent access.

pub mod prompts;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::llm_client::{LlmError, TextGenerator};
use crate::summarize::prompts::{CHUNK_SUMMARY_PROMPT, COMBINE_SUMMARY_PROMPT};

/// Chunk length in characters.
pub const CHUNK_SIZE: usize = 2000;
/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 200;

/// Splits `text` into overlapping chunks of at most `chunk_size` characters,
/// stepping by `chunk_size - overlap`, preserving order. Deterministic for a
/// given input and constants. Sizes are in characters, never bytes, so
/// multi-byte input cannot split a code point.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let stride = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }
    chunks
}

/// Map-reduce summarizer with a process-lifetime memo cache.
///
/// The cache maps exact input text to its finished summary; each key's
/// map-reduce runs at most once even if identical inputs arrive concurrently
/// (per-key `OnceCell` behind the map lock).
pub struct Summarizer {
    chunk_size: usize,
    overlap: usize,
    temperature: f32,
    max_output_tokens: u32,
    cache: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl Summarizer {
    pub fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self::with_limits(CHUNK_SIZE, CHUNK_OVERLAP, temperature, max_output_tokens)
    }

    pub fn with_limits(
        chunk_size: usize,
        overlap: usize,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            chunk_size,
            overlap,
            temperature,
            max_output_tokens,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Summarizes `text`, reusing the cached result for an input already
    /// summarized in this process. Empty or whitespace-only input yields the
    /// empty string with zero backend calls. Backend failures propagate to
    /// the caller; nothing is cached for a failed key.
    pub async fn summarize(
        &self,
        backend: &dyn TextGenerator,
        credential: &str,
        text: &str,
    ) -> Result<String, LlmError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let cell = {
            let mut cache = self.cache.lock().unwrap();
            cache
                .entry(text.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let summary = cell
            .get_or_try_init(|| self.run_map_reduce(backend, credential, text))
            .await?;

        Ok(summary.clone())
    }

    async fn run_map_reduce(
        &self,
        backend: &dyn TextGenerator,
        credential: &str,
        text: &str,
    ) -> Result<String, LlmError> {
        let chunks = chunk_text(text, self.chunk_size, self.overlap);
        debug!(chunks = chunks.len(), "summarizing prior report");

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let prompt = CHUNK_SUMMARY_PROMPT.replace("{chunk}", chunk);
            let partial = backend
                .generate(credential, &prompt, self.temperature, self.max_output_tokens)
                .await?;
            partials.push(partial);
        }

        let combine_prompt =
            COMBINE_SUMMARY_PROMPT.replace("{partial_summaries}", &partials.join("\n\n"));
        backend
            .generate(
                credential,
                &combine_prompt,
                self.temperature,
                self.max_output_tokens,
            )
            .await
    }
}
