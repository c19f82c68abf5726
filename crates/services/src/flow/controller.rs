use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use skillpath_core::Clock;
use skillpath_core::model::{
    AssessmentConfiguration, AssessmentId, AssessmentResult, ConfigurationBuilder,
};
use skillpath_core::reconcile::SubmissionPayload;
use skillpath_core::session::{
    Advance, AnswerOutcome, AnswerPolicy, AssessmentSession, SessionFailure,
};

use super::route::{Navigator, RoadmapTarget, Route};
use crate::api::{AssessmentApi, GeneratedAssessment, RoadmapRequest};
use crate::configuration_service::ConfigurationService;
use crate::error::{ApiError, FlowError};
use crate::session_store::SessionStore;

//
// ─── TYPES ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Configure,
    Assess,
    Result,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowStage::Configure => "configure",
            FlowStage::Assess => "assess",
            FlowStage::Result => "result",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Topics,
    Generate,
    Fetch,
    Submit,
    Roadmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    /// How long the score stays on screen before the roadmap hand-off.
    pub display_delay: Duration,
    pub answer_policy: AnswerPolicy,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            display_delay: Duration::from_secs(2),
            answer_policy: AnswerPolicy::default(),
        }
    }
}

/// Identity of an in-flight submission: the session it was reconciled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    assessment_id: AssessmentId,
    attempt: u32,
}

/// Outcome of delivering a submission response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Scored(AssessmentResult),
    /// The response belonged to a session that has since been retried or closed.
    Stale,
}

#[derive(Debug, Clone)]
struct PendingSubmission {
    ticket: SubmissionTicket,
    payload: SubmissionPayload,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Sequences configuration, assessment, scoring and the roadmap hand-off.
///
/// Owns the only `AssessmentSession` of the flow, the outstanding-request flag and
/// the error banner. Every method takes `&mut self`; remote responses that may arrive
/// out of band go through the ticketed `begin_*`/`finish_*` pairs.
pub struct FlowController {
    api: Arc<dyn AssessmentApi>,
    configuration_service: ConfigurationService,
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<SessionStore>>,
    clock: Clock,
    settings: FlowSettings,
    stage: FlowStage,
    builder: ConfigurationBuilder,
    configuration: Option<AssessmentConfiguration>,
    session: Option<AssessmentSession>,
    pending: Option<PendingSubmission>,
    result: Option<AssessmentResult>,
    outstanding: Option<Request>,
    banner: Option<String>,
}

impl FlowController {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, navigator: Arc<dyn Navigator>, clock: Clock) -> Self {
        Self {
            configuration_service: ConfigurationService::new(Arc::clone(&api)),
            api,
            navigator,
            store: None,
            clock,
            settings: FlowSettings::default(),
            stage: FlowStage::Configure,
            builder: ConfigurationBuilder::new(""),
            configuration: None,
            session: None,
            pending: None,
            result: None,
            outstanding: None,
            banner: None,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    // ─── Status ────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    /// Whether a remote request is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    #[must_use]
    pub fn error_banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.banner = None;
    }

    #[must_use]
    pub fn builder(&self) -> &ConfigurationBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut ConfigurationBuilder {
        &mut self.builder
    }

    /// The configuration most recently submitted or used to skip.
    #[must_use]
    pub fn configuration(&self) -> Option<&AssessmentConfiguration> {
        self.configuration.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&AssessmentSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    // ─── Configure ─────────────────────────────────────────────────────────────

    /// Start a configuration from the learner's goal and load topic suggestions.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::RequestOutstanding`, `FlowError::WrongStage` outside the
    /// configure stage, or the suggestion failure (also shown on the banner).
    pub async fn load_topics(&mut self, prompt: &str) -> Result<(), FlowError> {
        let res = self.load_topics_inner(prompt).await;
        self.surface(res)
    }

    async fn load_topics_inner(&mut self, prompt: &str) -> Result<(), FlowError> {
        self.ensure_idle()?;
        self.ensure_stage(FlowStage::Configure)?;

        self.builder = ConfigurationBuilder::new(prompt);
        self.outstanding = Some(Request::Topics);
        let res = self
            .configuration_service
            .suggest_topics(&mut self.builder)
            .await;
        self.outstanding = None;
        Ok(res?)
    }

    /// Submit the configuration and open the generated assessment.
    ///
    /// The questions come back with the generation response, so no further fetch
    /// is made. On failure the builder stays editable.
    ///
    /// # Errors
    ///
    /// Returns configuration, generation or question-validation failures.
    pub async fn submit_configuration(&mut self) -> Result<AssessmentId, FlowError> {
        let res = self.submit_configuration_inner().await;
        self.surface(res)
    }

    async fn submit_configuration_inner(&mut self) -> Result<AssessmentId, FlowError> {
        self.ensure_idle()?;
        self.ensure_stage(FlowStage::Configure)?;

        self.outstanding = Some(Request::Generate);
        let res = self.configuration_service.submit(&self.builder).await;
        self.outstanding = None;
        let (configuration, generated) = res?;

        self.configuration = Some(configuration);
        let assessment_id = generated.assessment_id.clone();
        self.navigator.navigate(&Route::Assessment {
            assessment_id: assessment_id.clone(),
        });
        self.open_generated(generated).await?;
        Ok(assessment_id)
    }

    /// Skip the assessment and hand the configuration straight to the roadmap.
    ///
    /// # Errors
    ///
    /// Returns configuration errors locally, or the roadmap request failure.
    pub async fn skip_assessment(&mut self) -> Result<Route, FlowError> {
        let res = self.skip_assessment_inner().await;
        self.surface(res)
    }

    async fn skip_assessment_inner(&mut self) -> Result<Route, FlowError> {
        self.ensure_idle()?;
        self.ensure_stage(FlowStage::Configure)?;

        let configuration = self.builder.build()?;
        self.configuration = Some(configuration.clone());

        self.outstanding = Some(Request::Roadmap);
        let res = self
            .api
            .generate_roadmap(&RoadmapRequest::Unassessed { configuration })
            .await;
        self.outstanding = None;
        res?;

        let route = Route::Roadmap(RoadmapTarget::Unassessed);
        info!("assessment skipped");
        self.navigator.navigate(&route);
        Ok(route)
    }

    // ─── Assess ────────────────────────────────────────────────────────────────

    /// Open an assessment by id (resume path).
    ///
    /// The source is decided once: the session already held in memory, then a saved
    /// snapshot, then a remote fetch.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::RequestOutstanding` or the fetch/validation failure; in
    /// the latter case the session is left in its `Error` phase.
    pub async fn open_assessment(&mut self, assessment_id: AssessmentId) -> Result<(), FlowError> {
        let res = self.open_assessment_inner(assessment_id).await;
        self.surface(res)
    }

    async fn open_assessment_inner(&mut self, assessment_id: AssessmentId) -> Result<(), FlowError> {
        self.ensure_idle()?;

        if self
            .session
            .as_ref()
            .is_some_and(|s| *s.assessment_id() == assessment_id && !s.questions().is_empty())
        {
            debug!(assessment = %assessment_id, "assessment already open");
            self.stage = self.stage_for_open_session();
            return Ok(());
        }

        self.reset_assessment();
        if let Some(session) = self.load_saved(&assessment_id).await {
            info!(assessment = %assessment_id, phase = %session.phase(), "assessment resumed from snapshot");
            self.session = Some(session);
            self.stage = FlowStage::Assess;
            return Ok(());
        }

        self.stage = FlowStage::Assess;
        self.session = Some(
            AssessmentSession::loading(assessment_id.clone(), self.clock.now())
                .with_policy(self.settings.answer_policy),
        );
        self.outstanding = Some(Request::Fetch);
        let res = self.api.fetch_assessment(&assessment_id).await;
        self.outstanding = None;

        match res {
            Ok(generated) if generated.assessment_id == assessment_id => {
                self.load_into_session(generated).await
            }
            Ok(generated) => {
                let failure = SessionFailure::Validation(format!(
                    "expected assessment {assessment_id}, received {}",
                    generated.assessment_id
                ));
                let message = failure.to_string();
                if let Some(session) = self.session.as_mut() {
                    session.fail(failure);
                }
                Err(FlowError::Api(ApiError::Decode(message)))
            }
            Err(err) => {
                if let Some(session) = self.session.as_mut() {
                    session.fail(SessionFailure::Fetch(err.to_string()));
                }
                Err(err.into())
            }
        }
    }

    async fn open_generated(&mut self, generated: GeneratedAssessment) -> Result<(), FlowError> {
        self.reset_assessment();
        self.stage = FlowStage::Assess;
        self.session = Some(
            AssessmentSession::loading(generated.assessment_id.clone(), self.clock.now())
                .with_policy(self.settings.answer_policy),
        );
        self.load_into_session(generated).await
    }

    async fn load_into_session(&mut self, generated: GeneratedAssessment) -> Result<(), FlowError> {
        let session = self.session.as_mut().ok_or(FlowError::NoSession)?;
        session.load_questions(generated.questions)?;
        self.persist().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError::NoSession` or the session's rejection.
    pub async fn select_answer(&mut self, option: &str) -> Result<AnswerOutcome, FlowError> {
        let res = self
            .session_mut()
            .and_then(|s| s.select_answer(option).map_err(FlowError::from));
        if res.is_ok() {
            self.persist().await;
        }
        self.surface(res)
    }

    /// # Errors
    ///
    /// Returns `FlowError::NoSession` or the session's rejection, including the
    /// incomplete diagnostic on the last question.
    pub async fn advance(&mut self) -> Result<Advance, FlowError> {
        let now = self.clock.now();
        let res = self
            .session_mut()
            .and_then(|s| s.advance(now).map_err(FlowError::from));
        self.persist().await;
        self.surface(res)
    }

    /// Jump back to the first unanswered question after an incomplete diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoSession` or `SessionError::NothingToResume`.
    pub async fn resume_unanswered(&mut self) -> Result<usize, FlowError> {
        let res = self
            .session_mut()
            .and_then(|s| s.resume_unanswered().map_err(FlowError::from));
        if res.is_ok() {
            self.banner = None;
            self.stage = FlowStage::Assess;
            self.persist().await;
        }
        self.surface(res)
    }

    /// Restart the assessment on the same questions.
    ///
    /// Never re-submits: any earlier submission, finished or in flight, is discarded.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoSession` or the session's rejection.
    pub async fn retry_assessment(&mut self) -> Result<(), FlowError> {
        let res = self
            .session_mut()
            .and_then(|s| s.retry().map_err(FlowError::from));
        if res.is_ok() {
            if self.outstanding == Some(Request::Submit) {
                self.outstanding = None;
            }
            self.pending = None;
            self.result = None;
            self.banner = None;
            self.stage = FlowStage::Assess;
            self.persist().await;
        }
        self.surface(res)
    }

    // ─── Submit ────────────────────────────────────────────────────────────────

    /// Reconcile the completed session and mark the submission as outstanding.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::RequestOutstanding`, `FlowError::NoSession`, or a
    /// reconciliation failure; nothing is marked outstanding in that case.
    pub fn begin_submission(&mut self) -> Result<(SubmissionTicket, SubmissionPayload), FlowError> {
        let res = self.begin_submission_inner();
        self.surface(res)
    }

    fn begin_submission_inner(&mut self) -> Result<(SubmissionTicket, SubmissionPayload), FlowError> {
        self.ensure_idle()?;
        let session = self.session.as_ref().ok_or(FlowError::NoSession)?;
        let payload = session.submission()?;
        let ticket = SubmissionTicket {
            assessment_id: session.assessment_id().clone(),
            attempt: session.attempt(),
        };

        self.pending = Some(PendingSubmission {
            ticket: ticket.clone(),
            payload: payload.clone(),
        });
        self.outstanding = Some(Request::Submit);
        debug!(assessment = %ticket.assessment_id, attempt = ticket.attempt, "submission started");
        Ok((ticket, payload))
    }

    /// Deliver the scoring response for a ticket.
    ///
    /// Responses for a session that has since been retried or closed are ignored.
    /// A failed submission keeps its payload for `retry_submission`.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Api` if the scoring call failed.
    pub async fn finish_submission(
        &mut self,
        ticket: &SubmissionTicket,
        response: Result<AssessmentResult, ApiError>,
    ) -> Result<SubmissionStatus, FlowError> {
        if !self.is_current(ticket) {
            debug!(
                assessment = %ticket.assessment_id,
                attempt = ticket.attempt,
                "stale submission response ignored"
            );
            return Ok(SubmissionStatus::Stale);
        }
        self.outstanding = None;

        match response {
            Ok(result) => {
                info!(
                    assessment = %result.assessment_id,
                    score = result.score,
                    max_score = result.max_score,
                    "assessment scored"
                );
                self.pending = None;
                self.banner = None;
                self.result = Some(result.clone());
                self.stage = FlowStage::Result;
                self.record(&result).await;
                Ok(SubmissionStatus::Scored(result))
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                let res = Err(FlowError::Api(err));
                self.surface(res)
            }
        }
    }

    /// Reconcile, submit and deliver in one step.
    ///
    /// # Errors
    ///
    /// Returns the errors of `begin_submission` and `finish_submission`.
    pub async fn submit(&mut self) -> Result<AssessmentResult, FlowError> {
        let (ticket, payload) = self.begin_submission()?;
        let response = self.api.submit_assessment(&payload).await;
        self.deliver(&ticket, response).await
    }

    /// Re-issue the last failed submission with the same payload.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NothingToRetry` without a failed submission, or the
    /// errors of `finish_submission`.
    pub async fn retry_submission(&mut self) -> Result<AssessmentResult, FlowError> {
        let pending = match (&self.pending, self.outstanding) {
            (_, Some(_)) => Err(FlowError::RequestOutstanding),
            (Some(pending), None) if self.result.is_none() => Ok(pending.clone()),
            _ => Err(FlowError::NothingToRetry),
        };
        let pending = self.surface(pending)?;

        self.outstanding = Some(Request::Submit);
        self.banner = None;
        let response = self.api.submit_assessment(&pending.payload).await;
        self.deliver(&pending.ticket, response).await
    }

    async fn deliver(
        &mut self,
        ticket: &SubmissionTicket,
        response: Result<AssessmentResult, ApiError>,
    ) -> Result<AssessmentResult, FlowError> {
        match self.finish_submission(ticket, response).await? {
            SubmissionStatus::Scored(result) => Ok(result),
            SubmissionStatus::Stale => Err(FlowError::Stale),
        }
    }

    fn is_current(&self, ticket: &SubmissionTicket) -> bool {
        let session_matches = self.session.as_ref().is_some_and(|s| {
            *s.assessment_id() == ticket.assessment_id && s.attempt() == ticket.attempt
        });
        let pending_matches = self.pending.as_ref().is_some_and(|p| p.ticket == *ticket);
        session_matches && pending_matches && self.outstanding == Some(Request::Submit)
    }

    // ─── Result ────────────────────────────────────────────────────────────────

    /// Mark the roadmap hand-off as outstanding and return its request.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::RequestOutstanding` while any request is in flight, or
    /// `FlowError::WrongStage` before a result is available.
    pub fn begin_roadmap(&mut self) -> Result<RoadmapRequest, FlowError> {
        let res = self.ensure_idle().and_then(|()| {
            self.result
                .as_ref()
                .map(RoadmapRequest::from_result)
                .ok_or(FlowError::WrongStage { stage: self.stage })
        });
        let request = self.surface(res)?;
        self.outstanding = Some(Request::Roadmap);
        Ok(request)
    }

    /// Complete the roadmap hand-off and navigate on success.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Api` if the roadmap request failed.
    pub fn finish_roadmap(&mut self, response: Result<(), ApiError>) -> Result<Route, FlowError> {
        if self.outstanding == Some(Request::Roadmap) {
            self.outstanding = None;
        }
        let res = response.map_err(FlowError::from).and_then(|()| {
            self.result
                .as_ref()
                .map(|result| {
                    Route::Roadmap(RoadmapTarget::Assessed {
                        assessment_id: result.assessment_id.clone(),
                        personalization_id: result.personalization_id.clone(),
                    })
                })
                .ok_or(FlowError::WrongStage { stage: self.stage })
        });
        let route = self.surface(res)?;
        self.navigator.navigate(&route);
        Ok(route)
    }

    /// Show the score for the display delay, then request the roadmap and navigate.
    ///
    /// # Errors
    ///
    /// Returns the errors of `begin_roadmap` and `finish_roadmap`.
    pub async fn proceed_to_roadmap(&mut self) -> Result<Route, FlowError> {
        let request = self.begin_roadmap()?;
        tokio::time::sleep(self.settings.display_delay).await;
        let response = self.api.generate_roadmap(&request).await;
        self.finish_roadmap(response)
    }

    /// Abandon the current assessment and return to the configuration step.
    ///
    /// The builder keeps its choices; a new submission starts a new session.
    pub fn back_to_configuration(&mut self) {
        self.reset_assessment();
        self.outstanding = None;
        self.banner = None;
        self.stage = FlowStage::Configure;
        self.navigator.navigate(&Route::Configuration);
    }

    // ─── Helpers ───────────────────────────────────────────────────────────────

    fn reset_assessment(&mut self) {
        self.session = None;
        self.pending = None;
        self.result = None;
    }

    fn stage_for_open_session(&self) -> FlowStage {
        if self.result.is_some() {
            FlowStage::Result
        } else {
            FlowStage::Assess
        }
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        if self.outstanding.is_some() {
            return Err(FlowError::RequestOutstanding);
        }
        Ok(())
    }

    fn ensure_stage(&self, expected: FlowStage) -> Result<(), FlowError> {
        if self.stage != expected {
            return Err(FlowError::WrongStage { stage: self.stage });
        }
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut AssessmentSession, FlowError> {
        self.session.as_mut().ok_or(FlowError::NoSession)
    }

    /// Mirror the outcome onto the banner: set on error, cleared on success.
    fn surface<T>(&mut self, res: Result<T, FlowError>) -> Result<T, FlowError> {
        self.banner = res.as_ref().err().map(ToString::to_string);
        res
    }

    async fn load_saved(&self, assessment_id: &AssessmentId) -> Option<AssessmentSession> {
        let store = self.store.as_ref()?;
        match store.load(assessment_id).await {
            Ok(Some(session)) if session.questions().is_empty() => {
                warn!(assessment = %assessment_id, "discarding snapshot without questions");
                if let Err(err) = store.discard(assessment_id).await {
                    warn!(assessment = %assessment_id, error = %err, "failed to discard snapshot");
                }
                None
            }
            Ok(session) => session,
            Err(err) => {
                warn!(assessment = %assessment_id, error = %err, "ignoring unusable snapshot");
                None
            }
        }
    }

    async fn persist(&self) {
        let (Some(store), Some(session)) = (self.store.as_ref(), self.session.as_ref()) else {
            return;
        };
        if let Err(err) = store.save(session).await {
            warn!(assessment = %session.assessment_id(), error = %err, "failed to save session");
        }
    }

    async fn record(&self, result: &AssessmentResult) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(err) = store.record_result(result).await {
            warn!(assessment = %result.assessment_id, error = %err, "failed to record result");
        }
        if let Err(err) = store.discard(&result.assessment_id).await {
            warn!(assessment = %result.assessment_id, error = %err, "failed to discard snapshot");
        }
    }
}

impl fmt::Debug for FlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("stage", &self.stage)
            .field("session", &self.session)
            .field("outstanding", &self.outstanding)
            .field("banner", &self.banner)
            .finish_non_exhaustive()
    }
}
