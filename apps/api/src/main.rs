mod config;
mod errors;
mod extract;
mod llm_client;
mod models;
mod report;
mod routes;
mod state;
mod summarize;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::report::ReportComposer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::summarize::Summarizer;
use crate::wizard::store::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging uses the configured level
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Journal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the text-generation backend
    let llm = GeminiClient::new(config.gemini_base_url.clone(), config.gemini_model.clone());
    info!("LLM client initialized (model: {})", llm.model());
    if config.gemini_api_key.is_some() {
        info!("Gemini API key pre-loaded; sessions will skip the credential step");
    }

    // Summarizer and composer share the configured sampling parameters
    let summarizer = Summarizer::new(config.report_temperature, config.report_max_output_tokens);
    let composer = ReportComposer::new(
        config.report_prompt_template.clone(),
        config.report_temperature,
        config.report_max_output_tokens,
    );

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        summarizer: Arc::new(summarizer),
        composer: Arc::new(composer),
        sessions: SessionStore::new(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
