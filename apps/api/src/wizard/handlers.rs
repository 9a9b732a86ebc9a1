//! Axum route handlers for the wizard steps.
//!
//! Handlers stay thin: parse the submission, look up the session, delegate
//! to the state machine, shape the response. All sequencing rules live in
//! `session.rs`.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::visit::{Project, VisitNumber};
use crate::state::AppState;
use crate::wizard::session::{
    StepOutcome, VisitDetailsInput, WizardServices, WizardSession, WizardStep,
};
use crate::wizard::store::SharedSession;

/// Literal filename of the download artifact.
pub const REPORT_FILE_NAME: &str = "journal_report.txt";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub credential: String,
}

#[derive(Debug, Deserialize)]
pub struct GeneralInfoRequest {
    pub project: Project,
    pub visit_number: VisitNumber,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub session_id: Uuid,
    pub step: WizardStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_files: Vec<String>,
}

impl StepResponse {
    fn from_outcome(session_id: Uuid, outcome: StepOutcome) -> Self {
        Self {
            session_id,
            step: outcome.step,
            warning: outcome.warning,
            media_files: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub step: WizardStep,
    pub project: Option<Project>,
    pub visit_number: Option<VisitNumber>,
    pub visit_date: Option<NaiveDate>,
    pub has_prior_summary: bool,
    pub report_ready: bool,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Opens a new wizard session. With `GEMINI_API_KEY` pre-loaded the session
/// starts past the credential step.
pub async fn handle_create_session(State(state): State<AppState>) -> Json<StepResponse> {
    let session = WizardSession::new(state.config.gemini_api_key.clone());
    let step = session.step();
    let session_id = state.sessions.insert(session);

    Json(StepResponse {
        session_id,
        step,
        warning: None,
        media_files: Vec::new(),
    })
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let shared = lookup(&state, session_id)?;
    let session = shared.lock().await;

    Ok(Json(SessionStatusResponse {
        session_id,
        step: session.step(),
        project: session.project(),
        visit_number: session.visit_number(),
        visit_date: session.visit_date(),
        has_prior_summary: session.prior().is_some(),
        report_ready: session.report().is_some(),
        created_at: session.created_at,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.sessions.remove(session_id) {
        return Err(AppError::SessionNotFound(session_id));
    }
    Ok(Json(serde_json::json!({ "deleted": session_id })))
}

/// POST /api/v1/sessions/:id/credential
pub async fn handle_submit_credential(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CredentialRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let shared = lookup(&state, session_id)?;
    let mut session = shared.lock().await;

    let outcome = session.submit_credential(&request.credential)?;
    Ok(Json(StepResponse::from_outcome(session_id, outcome)))
}

/// POST /api/v1/sessions/:id/general-info
pub async fn handle_submit_general_info(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GeneralInfoRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let shared = lookup(&state, session_id)?;
    let mut session = shared.lock().await;

    let outcome = session.submit_general_info(request.project, request.visit_number)?;
    Ok(Json(StepResponse::from_outcome(session_id, outcome)))
}

/// POST /api/v1/sessions/:id/prior-report
///
/// Multipart with an optional `document` PDF field. Extraction and
/// summarization run synchronously before the response.
pub async fn handle_submit_prior_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<StepResponse>, AppError> {
    let mut document: Option<Bytes> = None;
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("document") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("could not read document field: {e}")))?;
            if !bytes.is_empty() {
                document = Some(bytes);
            }
        }
    }

    let shared = lookup(&state, session_id)?;
    let mut session = shared.lock().await;

    let outcome = session
        .submit_prior_report(document.as_deref(), &services(&state))
        .await?;
    Ok(Json(StepResponse::from_outcome(session_id, outcome)))
}

/// POST /api/v1/sessions/:id/visit-details
///
/// Multipart: `actions` text (required), `visit_date` text (`YYYY-MM-DD`,
/// optional), repeated `media` file fields. Only media filenames are used;
/// file contents are never analyzed.
pub async fn handle_submit_visit_details(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<StepResponse>, AppError> {
    let mut actions: Option<String> = None;
    let mut visit_date: Option<NaiveDate> = None;
    let mut media_files: Vec<String> = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("actions") => {
                actions = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("could not read actions field: {e}"))
                })?);
            }
            Some("visit_date") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::Validation(format!("could not read visit_date field: {e}"))
                })?;
                let raw = raw.trim().to_string();
                if !raw.is_empty() {
                    visit_date = Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(
                        |_| {
                            AppError::Validation(format!(
                                "visit_date must be formatted YYYY-MM-DD, got '{raw}'"
                            ))
                        },
                    )?);
                }
            }
            Some("media") => {
                if let Some(name) = field.file_name() {
                    media_files.push(name.to_string());
                }
            }
            _ => {}
        }
    }

    let actions =
        actions.ok_or_else(|| AppError::Validation("actions field is required".to_string()))?;

    let shared = lookup(&state, session_id)?;
    let mut session = shared.lock().await;

    let input = VisitDetailsInput {
        actions,
        visit_date,
        media_files: media_files.clone(),
    };
    let outcome = session
        .submit_visit_details(input, &services(&state))
        .await?;

    let mut response = StepResponse::from_outcome(session_id, outcome);
    response.media_files = media_files;
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/report
///
/// Serves the generated report as a `text/plain` attachment, byte for byte.
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = lookup(&state, session_id)?;
    let session = shared.lock().await;

    let report = session.report().ok_or_else(|| {
        AppError::WrongStep(format!(
            "the report has not been generated yet (step {})",
            session.step()
        ))
    })?;

    let headers = [
        (header::CONTENT_TYPE, "text/plain".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
        ),
    ];
    Ok((headers, report.to_string()).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn lookup(state: &AppState, session_id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(session_id)
        .ok_or(AppError::SessionNotFound(session_id))
}

fn services(state: &AppState) -> WizardServices<'_> {
    WizardServices {
        backend: state.llm.as_ref(),
        summarizer: &state.summarizer,
        composer: &state.composer,
    }
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))
}
