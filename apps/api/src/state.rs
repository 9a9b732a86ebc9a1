use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::report::ReportComposer;
use crate::summarize::Summarizer;
use crate::wizard::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The one text-generation backend, behind the trait seam so tests can
    /// substitute a scripted mock.
    pub llm: Arc<dyn TextGenerator>,
    pub summarizer: Arc<Summarizer>,
    pub composer: Arc<ReportComposer>,
    pub sessions: SessionStore,
}
