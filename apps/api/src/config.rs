use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
///
/// Nothing here is strictly required: a missing `GEMINI_API_KEY` only means
/// every session starts at the credential step and the user types one in.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub report_temperature: f32,
    pub report_max_output_tokens: u32,
    /// Full replacement for the built-in report prompt template. Placeholders
    /// must be kept; see `report::prompts`.
    pub report_prompt_template: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            report_temperature: std::env::var("REPORT_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse::<f32>()
                .context("REPORT_TEMPERATURE must be a number")?,
            report_max_output_tokens: std::env::var("REPORT_MAX_OUTPUT_TOKENS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u32>()
                .context("REPORT_MAX_OUTPUT_TOKENS must be a positive integer")?,
            report_prompt_template: optional_env("REPORT_PROMPT_TEMPLATE"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
