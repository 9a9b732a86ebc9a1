//! The wizard state machine.
//!
//! Steps: AwaitCredential → AwaitGeneralInfo → AwaitPriorVisitUpload
//! (skipped for a first visit) → AwaitCurrentVisitDetails → ReportReady.
//!
//! Every transition adds to the collected fields, never overwrites them:
//! re-submitting a completed step with identical values is a no-op, with
//! different values a rejected overwrite. A quota failure during report
//! generation is recovered by exactly one retry after the user supplies an
//! alternate credential; the retry must carry an identical record.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_pdf_text, ExtractError};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::visit::{PriorReportContext, Project, VisitNumber, VisitRecord};
use crate::report::ReportComposer;
use crate::summarize::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    AwaitCredential,
    AwaitGeneralInfo,
    AwaitPriorVisitUpload,
    AwaitCurrentVisitDetails,
    ReportReady,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardStep::AwaitCredential => "await_credential",
            WizardStep::AwaitGeneralInfo => "await_general_info",
            WizardStep::AwaitPriorVisitUpload => "await_prior_visit_upload",
            WizardStep::AwaitCurrentVisitDetails => "await_current_visit_details",
            WizardStep::ReportReady => "report_ready",
        })
    }
}

/// Collaborators a step may invoke. Handlers borrow these out of `AppState`.
pub struct WizardServices<'a> {
    pub backend: &'a dyn TextGenerator,
    pub summarizer: &'a Summarizer,
    pub composer: &'a ReportComposer,
}

/// What a successful step submission reports back to the client.
#[derive(Debug)]
pub struct StepOutcome {
    pub step: WizardStep,
    pub warning: Option<String>,
}

/// Parsed body of the visit-details submission.
#[derive(Debug, Clone)]
pub struct VisitDetailsInput {
    pub actions: String,
    pub visit_date: Option<NaiveDate>,
    pub media_files: Vec<String>,
}

/// One user interaction's accumulated state. Owned exclusively by its
/// interaction; destroyed when the session is deleted.
#[derive(Debug)]
pub struct WizardSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    step: WizardStep,
    credential: Option<String>,
    project: Option<Project>,
    visit_number: Option<VisitNumber>,
    visit_date: Option<NaiveDate>,
    actions: Option<String>,
    media_description: Option<String>,
    prior: Option<PriorReportContext>,
    generated_report: Option<String>,
    /// Set when a quota failure requires an alternate credential before the
    /// backend may be called again.
    awaiting_retry_credential: bool,
    /// The one-shot quota retry has been offered; the next quota failure of
    /// the report submission is reported verbatim instead.
    quota_retry_offered: bool,
}

impl WizardSession {
    /// A credential pre-loaded from the environment skips the credential
    /// step entirely.
    pub fn new(preloaded_credential: Option<String>) -> Self {
        let step = if preloaded_credential.is_some() {
            WizardStep::AwaitGeneralInfo
        } else {
            WizardStep::AwaitCredential
        };
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            step,
            credential: preloaded_credential,
            project: None,
            visit_number: None,
            visit_date: None,
            actions: None,
            media_description: None,
            prior: None,
            generated_report: None,
            awaiting_retry_credential: false,
            quota_retry_offered: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn project(&self) -> Option<Project> {
        self.project
    }

    pub fn visit_number(&self) -> Option<VisitNumber> {
        self.visit_number
    }

    pub fn visit_date(&self) -> Option<NaiveDate> {
        self.visit_date
    }

    pub fn prior(&self) -> Option<&PriorReportContext> {
        self.prior.as_ref()
    }

    pub fn report(&self) -> Option<&str> {
        self.generated_report.as_deref()
    }

    fn outcome(&self, warning: Option<String>) -> StepOutcome {
        StepOutcome {
            step: self.step,
            warning,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Transitions
    // ────────────────────────────────────────────────────────────────────

    /// Accepts the credential at session start, or a replacement credential
    /// when a quota failure asked for one.
    pub fn submit_credential(&mut self, credential: &str) -> Result<StepOutcome, AppError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AppError::Validation(
                "credential must not be empty".to_string(),
            ));
        }

        match self.step {
            WizardStep::AwaitCredential => {
                self.credential = Some(credential.to_string());
                self.step = WizardStep::AwaitGeneralInfo;
                Ok(self.outcome(None))
            }
            _ if self.awaiting_retry_credential => {
                self.credential = Some(credential.to_string());
                self.awaiting_retry_credential = false;
                Ok(self.outcome(None))
            }
            // Identical re-submission of a completed step is a no-op.
            _ if self.credential.as_deref() == Some(credential) => Ok(self.outcome(None)),
            _ => Err(AppError::WrongStep(
                "a credential was already provided for this session".to_string(),
            )),
        }
    }

    /// Records project and visit number. A first visit has no prior report
    /// to upload, so the wizard skips straight to the visit details.
    pub fn submit_general_info(
        &mut self,
        project: Project,
        visit_number: VisitNumber,
    ) -> Result<StepOutcome, AppError> {
        match self.step {
            WizardStep::AwaitCredential => Err(AppError::WrongStep(
                "a credential must be provided before general info".to_string(),
            )),
            WizardStep::AwaitGeneralInfo => {
                self.project = Some(project);
                self.visit_number = Some(visit_number);
                self.step = if visit_number.is_first() {
                    WizardStep::AwaitCurrentVisitDetails
                } else {
                    WizardStep::AwaitPriorVisitUpload
                };
                Ok(self.outcome(None))
            }
            WizardStep::AwaitPriorVisitUpload | WizardStep::AwaitCurrentVisitDetails
                if self.project == Some(project) && self.visit_number == Some(visit_number) =>
            {
                Ok(self.outcome(None))
            }
            _ => Err(AppError::WrongStep(
                "general info was already recorded and cannot be changed".to_string(),
            )),
        }
    }

    /// Accepts the optional prior-visit report. A supplied document is
    /// extracted and summarized synchronously; a malformed document is
    /// downgraded to a warning and the wizard proceeds with no prior
    /// context.
    pub async fn submit_prior_report(
        &mut self,
        document: Option<&[u8]>,
        svc: &WizardServices<'_>,
    ) -> Result<StepOutcome, AppError> {
        self.apply_prior_report(document.map(extract_pdf_text), svc)
            .await
    }

    async fn apply_prior_report(
        &mut self,
        extracted: Option<Result<String, ExtractError>>,
        svc: &WizardServices<'_>,
    ) -> Result<StepOutcome, AppError> {
        if self.step != WizardStep::AwaitPriorVisitUpload {
            return Err(AppError::WrongStep(format!(
                "a prior-report upload is not accepted at step {}",
                self.step
            )));
        }

        let mut warning = None;
        match extracted {
            None => {}
            Some(Ok(raw_text)) => {
                let credential = self.credential.clone().ok_or(AppError::MissingCredential)?;
                let summary = match svc
                    .summarizer
                    .summarize(svc.backend, &credential, &raw_text)
                    .await
                {
                    Ok(summary) => summary,
                    Err(e) => return Err(self.backend_failure(e)),
                };
                self.prior = Some(PriorReportContext { raw_text, summary });
            }
            Some(Err(e)) => {
                warn!("prior report extraction failed: {e}");
                warning = Some(format!(
                    "Could not read the uploaded document ({e}); continuing without prior report context."
                ));
            }
        }

        self.step = WizardStep::AwaitCurrentVisitDetails;
        Ok(self.outcome(warning))
    }

    /// Records the visit details and composes the report. On success the
    /// session reaches `ReportReady`; on failure it stays here with nothing
    /// partial recorded, and a quota failure arms the one-shot
    /// new-credential retry.
    pub async fn submit_visit_details(
        &mut self,
        input: VisitDetailsInput,
        svc: &WizardServices<'_>,
    ) -> Result<StepOutcome, AppError> {
        if self.step != WizardStep::AwaitCurrentVisitDetails {
            return Err(AppError::WrongStep(format!(
                "visit details are not accepted at step {}",
                self.step
            )));
        }

        let actions = input.actions.trim().to_string();
        if actions.is_empty() {
            return Err(AppError::Validation(
                "actions must not be empty; describe what was done during the visit".to_string(),
            ));
        }

        let media_description = media_description(&input.media_files);

        // Fields from a failed earlier attempt stay authoritative: a retry
        // must carry identical values.
        if let Some(existing) = &self.actions {
            if *existing != actions
                || self.visit_date != input.visit_date
                || self.media_description != media_description
            {
                return Err(AppError::WrongStep(
                    "visit details were already recorded; a retry must resubmit identical values"
                        .to_string(),
                ));
            }
        } else {
            self.actions = Some(actions);
            self.visit_date = input.visit_date;
            self.media_description = media_description;
        }

        if self.awaiting_retry_credential {
            return Err(AppError::QuotaExceeded(
                "The generation quota for the current API key is exhausted.".to_string(),
            ));
        }

        let credential = self.credential.clone().ok_or(AppError::MissingCredential)?;
        let record = self.visit_record()?;
        let prior_summary = self
            .prior
            .as_ref()
            .map(|p| p.summary.clone())
            .unwrap_or_default();

        match svc
            .composer
            .compose(svc.backend, &credential, &record, &prior_summary)
            .await
        {
            Ok(text) => {
                self.generated_report = Some(text);
                self.step = WizardStep::ReportReady;
                Ok(self.outcome(None))
            }
            Err(LlmError::QuotaExceeded { message }) if !self.quota_retry_offered => {
                self.quota_retry_offered = true;
                self.awaiting_retry_credential = true;
                Err(AppError::QuotaExceeded(message))
            }
            Err(e) => Err(AppError::Llm(e.to_string())),
        }
    }

    fn backend_failure(&mut self, error: LlmError) -> AppError {
        match error {
            LlmError::QuotaExceeded { message } => {
                self.awaiting_retry_credential = true;
                AppError::QuotaExceeded(message)
            }
            other => AppError::Llm(other.to_string()),
        }
    }

    fn visit_record(&self) -> Result<VisitRecord, AppError> {
        let (Some(project), Some(visit_number), Some(actions)) =
            (self.project, self.visit_number, self.actions.clone())
        else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "visit record incomplete despite step ordering"
            )));
        };
        Ok(VisitRecord {
            project,
            visit_number,
            visit_date: self.visit_date,
            actions,
            media_description: self.media_description.clone(),
        })
    }
}

fn media_description(files: &[String]) -> Option<String> {
    if files.is_empty() {
        None
    } else {
        Some(format!("Uploaded media files: {}", files.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::MockBackend;

    struct Fixture {
        backend: MockBackend,
        summarizer: Summarizer,
        composer: ReportComposer,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: MockBackend::new(),
                summarizer: Summarizer::new(0.7, 5000),
                composer: ReportComposer::new(None, 0.7, 5000),
            }
        }

        fn services(&self) -> WizardServices<'_> {
            WizardServices {
                backend: &self.backend,
                summarizer: &self.summarizer,
                composer: &self.composer,
            }
        }
    }

    fn details(actions: &str) -> VisitDetailsInput {
        VisitDetailsInput {
            actions: actions.to_string(),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            media_files: Vec::new(),
        }
    }

    /// Walks a session up to AwaitCurrentVisitDetails for a second visit
    /// with no prior document.
    async fn session_at_details(fixture: &Fixture) -> WizardSession {
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();
        session
            .submit_prior_report(None, &fixture.services())
            .await
            .unwrap();
        session
    }

    // ── Credential step ─────────────────────────────────────────────────

    #[test]
    fn test_preloaded_credential_skips_credential_step() {
        let session = WizardSession::new(Some("env-key".to_string()));
        assert_eq!(session.step(), WizardStep::AwaitGeneralInfo);
    }

    #[test]
    fn test_session_without_credential_starts_at_credential_step() {
        let session = WizardSession::new(None);
        assert_eq!(session.step(), WizardStep::AwaitCredential);
    }

    #[test]
    fn test_empty_credential_is_rejected_without_losing_state() {
        let mut session = WizardSession::new(None);
        let err = session.submit_credential("   ").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.step(), WizardStep::AwaitCredential);
    }

    #[test]
    fn test_credential_advances_to_general_info() {
        let mut session = WizardSession::new(None);
        let outcome = session.submit_credential("typed-key").unwrap();
        assert_eq!(outcome.step, WizardStep::AwaitGeneralInfo);
    }

    #[test]
    fn test_general_info_before_credential_is_out_of_order() {
        let mut session = WizardSession::new(None);
        let err = session
            .submit_general_info(Project::HealthCamp, VisitNumber::First)
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));
    }

    // ── General-info step and the first-visit skip ──────────────────────

    #[test]
    fn test_first_visit_skips_prior_upload() {
        let mut session = WizardSession::new(Some("env-key".to_string()));
        let outcome = session
            .submit_general_info(Project::HealthCamp, VisitNumber::First)
            .unwrap();
        assert_eq!(outcome.step, WizardStep::AwaitCurrentVisitDetails);
        assert!(session.prior().is_none());
    }

    #[test]
    fn test_later_visit_goes_through_prior_upload() {
        let mut session = WizardSession::new(Some("env-key".to_string()));
        let outcome = session
            .submit_general_info(Project::ElderCare, VisitNumber::Third)
            .unwrap();
        assert_eq!(outcome.step, WizardStep::AwaitPriorVisitUpload);
    }

    #[tokio::test]
    async fn test_first_visit_never_accepts_a_prior_document() {
        let fixture = Fixture::new();
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::First)
            .unwrap();

        let err = session
            .submit_prior_report(Some(b"%PDF-1.4 anything"), &fixture.services())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));
        assert!(session.prior().is_none(), "a first visit has no prior context");
        assert_eq!(fixture.backend.call_count(), 0);
    }

    #[test]
    fn test_identical_general_info_resubmission_is_a_noop() {
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();
        let outcome = session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();
        assert_eq!(outcome.step, WizardStep::AwaitPriorVisitUpload);
    }

    #[test]
    fn test_divergent_general_info_resubmission_is_rejected() {
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();
        let err = session
            .submit_general_info(Project::ElderCare, VisitNumber::Second)
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));
        assert_eq!(session.project(), Some(Project::HealthCamp));
    }

    // ── Prior-report step ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_skipped_upload_leaves_no_prior_context() {
        let fixture = Fixture::new();
        let session = session_at_details(&fixture).await;
        assert!(session.prior().is_none());
        assert_eq!(fixture.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_document_warns_and_proceeds() {
        let fixture = Fixture::new();
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();

        let outcome = session
            .submit_prior_report(Some(b"not a pdf at all"), &fixture.services())
            .await
            .unwrap();

        assert_eq!(outcome.step, WizardStep::AwaitCurrentVisitDetails);
        assert!(outcome.warning.is_some(), "extraction failure must be surfaced");
        assert!(session.prior().is_none());
        assert_eq!(fixture.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extracted_text_is_summarized_into_prior_context() {
        let fixture = Fixture::new();
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();

        let outcome = session
            .apply_prior_report(
                Some(Ok("The previous camp registered 60 patients.".to_string())),
                &fixture.services(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.step, WizardStep::AwaitCurrentVisitDetails);
        let prior = session.prior().expect("prior context must be recorded");
        assert_eq!(prior.raw_text, "The previous camp registered 60 patients.");
        assert!(!prior.summary.is_empty());
        assert_eq!(fixture.backend.call_count(), 2, "1 map call + 1 reduce call");
    }

    #[tokio::test]
    async fn test_empty_extracted_text_yields_empty_summary_without_backend_calls() {
        let fixture = Fixture::new();
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();

        session
            .apply_prior_report(Some(Ok(String::new())), &fixture.services())
            .await
            .unwrap();

        let prior = session.prior().expect("prior context must be recorded");
        assert_eq!(prior.summary, "");
        assert_eq!(fixture.backend.call_count(), 0);

        // The composer proceeds without error on the empty summary.
        let outcome = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap();
        assert_eq!(outcome.step, WizardStep::ReportReady);

        let prompts = fixture.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Summary of the Previous Visit Report: \n"));
    }

    #[tokio::test]
    async fn test_summarization_backend_failure_keeps_upload_step() {
        let fixture = Fixture::new();
        fixture
            .backend
            .push_result(Err(MockBackend::quota_error()));
        let mut session = WizardSession::new(Some("env-key".to_string()));
        session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap();

        let err = session
            .apply_prior_report(Some(Ok("previous report text".to_string())), &fixture.services())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(session.step(), WizardStep::AwaitPriorVisitUpload);
        assert!(session.prior().is_none());
    }

    // ── Visit-details step and report generation ────────────────────────

    #[tokio::test]
    async fn test_happy_path_generates_report_with_one_backend_call() {
        let fixture = Fixture::new();
        let mut session = session_at_details(&fixture).await;

        let outcome = session
            .submit_visit_details(details("Distributed medicine to 40 villagers."), &fixture.services())
            .await
            .unwrap();

        assert_eq!(outcome.step, WizardStep::ReportReady);
        assert!(session.report().is_some());
        assert_eq!(fixture.backend.call_count(), 1, "exactly one composition call");

        let prompts = fixture.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Distributed medicine to 40 villagers."));
        assert!(prompts[0].contains("Project: Health Camp"));
        assert!(prompts[0].contains("Visit Number: 2nd"));
    }

    #[tokio::test]
    async fn test_empty_actions_never_reach_the_composer() {
        let fixture = Fixture::new();
        let mut session = session_at_details(&fixture).await;

        let err = session
            .submit_visit_details(details("   "), &fixture.services())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.step(), WizardStep::AwaitCurrentVisitDetails);
        assert_eq!(fixture.backend.call_count(), 0, "validation gate holds");
    }

    #[tokio::test]
    async fn test_media_filenames_fold_into_the_prompt() {
        let fixture = Fixture::new();
        let mut session = session_at_details(&fixture).await;

        let mut input = details("Ran the afternoon clinic.");
        input.media_files = vec!["camp.jpg".to_string(), "queue.mp4".to_string()];
        session
            .submit_visit_details(input, &fixture.services())
            .await
            .unwrap();

        let prompts = fixture.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Uploaded media files: camp.jpg, queue.mp4"));
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_no_partial_report() {
        let fixture = Fixture::new();
        fixture.backend.push_result(Err(LlmError::Unavailable {
            status: 503,
            message: "model overloaded".to_string(),
        }));
        let mut session = session_at_details(&fixture).await;

        let err = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();

        match err {
            AppError::Llm(message) => assert!(message.contains("model overloaded")),
            other => panic!("expected verbatim Llm error, got {other:?}"),
        }
        assert_eq!(session.step(), WizardStep::AwaitCurrentVisitDetails);
        assert!(session.report().is_none(), "no partial report may be shown");
    }

    #[tokio::test]
    async fn test_quota_failure_prompts_credential_reentry_then_one_retry() {
        let fixture = Fixture::new();
        fixture
            .backend
            .push_result(Err(MockBackend::quota_error()));
        let mut session = session_at_details(&fixture).await;

        let err = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(fixture.backend.call_count(), 1);

        // Resubmitting before a new credential does not touch the backend.
        let err = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(fixture.backend.call_count(), 1);

        // Alternate credential, identical resubmission: exactly one more call.
        session.submit_credential("fresh-key").unwrap();
        let outcome = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap();

        assert_eq!(outcome.step, WizardStep::ReportReady);
        assert_eq!(fixture.backend.call_count(), 2);
        let credentials = fixture.backend.credentials.lock().unwrap();
        assert_eq!(credentials[1], "fresh-key");
    }

    #[tokio::test]
    async fn test_retry_with_divergent_details_is_rejected() {
        let fixture = Fixture::new();
        fixture
            .backend
            .push_result(Err(MockBackend::quota_error()));
        let mut session = session_at_details(&fixture).await;

        session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();
        session.submit_credential("fresh-key").unwrap();

        let err = session
            .submit_visit_details(details("Something different."), &fixture.services())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));
        assert_eq!(fixture.backend.call_count(), 1, "divergent retry must not reach the backend");
    }

    #[tokio::test]
    async fn test_second_quota_failure_is_terminal_and_verbatim() {
        let fixture = Fixture::new();
        fixture
            .backend
            .push_result(Err(MockBackend::quota_error()));
        fixture
            .backend
            .push_result(Err(MockBackend::quota_error()));
        let mut session = session_at_details(&fixture).await;

        session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();
        session.submit_credential("fresh-key").unwrap();

        let err = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();

        match err {
            AppError::Llm(message) => {
                assert!(message.contains("exhausted"), "second failure reported verbatim")
            }
            other => panic!("expected Llm, got {other:?}"),
        }
        assert_eq!(fixture.backend.call_count(), 2);
        assert!(session.report().is_none());
    }

    // ── Terminal state ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_report_ready_accepts_no_further_submissions() {
        let fixture = Fixture::new();
        let mut session = session_at_details(&fixture).await;
        session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap();

        let err = session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));

        let err = session
            .submit_general_info(Project::HealthCamp, VisitNumber::Second)
            .unwrap_err();
        assert!(matches!(err, AppError::WrongStep(_)));
        assert_eq!(fixture.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_report_text_is_preserved_byte_for_byte() {
        let fixture = Fixture::new();
        fixture
            .backend
            .push_result(Ok("Journal report.\n\nWith two paragraphs.".to_string()));
        let mut session = session_at_details(&fixture).await;

        session
            .submit_visit_details(details("Ran the clinic."), &fixture.services())
            .await
            .unwrap();

        assert_eq!(
            session.report().unwrap().as_bytes(),
            b"Journal report.\n\nWith two paragraphs."
        );
    }
}
