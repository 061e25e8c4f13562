// SPDX-License-Identifier: MIT

//! Supervisor: the onboarding state machine
//!
//! Each turn loads the session, runs the agent for the first incomplete
//! category, merges what validated, optionally verifies a category that has
//! just become complete, and persists the result. Turns on the same session
//! are serialized with a per-session lock; different sessions run in
//! parallel. Every saved turn is announced on the [`EventBus`].

use crate::onboarding::agent::{CategoryOutcome, DomainAgent};
use crate::onboarding::category::Category;
use crate::onboarding::config::OnboardingConfig;
use crate::onboarding::error::OnboardingError;
use crate::onboarding::events::{EventBus, SessionEvent};
use crate::onboarding::extract::Extractor;
use crate::onboarding::schema::schema_for;
use crate::onboarding::session::{Session, SessionSummary, TurnResult, VerificationOutcome};
use crate::onboarding::store::{SessionLocks, SessionStore, StoreError};
use crate::onboarding::validation::{Issue, IssueKind};
use crate::onboarding::verify::{Verification, VerifierRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Supervisor {
    agents: HashMap<Category, DomainAgent>,
    extractor: Arc<dyn Extractor>,
    verifiers: VerifierRegistry,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    events: EventBus,
    verification_timeout: Duration,
}

impl Supervisor {
    pub fn new(store: Arc<dyn SessionStore>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            agents: build_agents(&extractor, DEFAULT_EXTRACTION_TIMEOUT),
            extractor,
            verifiers: VerifierRegistry::new(),
            store,
            locks: SessionLocks::new(),
            events: EventBus::new(),
            verification_timeout: DEFAULT_VERIFICATION_TIMEOUT,
        }
    }

    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = verifiers;
        self
    }

    /// Bound the extractor and verifier calls
    pub fn with_timeouts(mut self, extraction: Duration, verification: Duration) -> Self {
        self.agents = build_agents(&self.extractor, extraction);
        self.verification_timeout = verification;
        self
    }

    /// Wire store, extractor and verifiers from configuration
    pub async fn from_config(config: &OnboardingConfig) -> Result<Self, OnboardingError> {
        let supervisor = Self::new(config.build_store(), config.build_extractor()?)
            .with_verifiers(config.build_verifiers().await?)
            .with_timeouts(config.extraction_timeout(), config.verification_timeout());
        Ok(supervisor)
    }

    /// Receive an event for every turn saved from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Process one user message.
    ///
    /// A missing `session_id` starts a new session under a generated id.
    /// Only store faults fail the turn; field and verification problems are
    /// reported in the result.
    pub async fn process_turn(
        &self,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<TurnResult, OnboardingError> {
        let session_id = match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let _guard = self.locks.acquire(&session_id).await;

        let mut session = match self.store.load(&session_id).await? {
            Some(s) => s,
            None => {
                log::info!("Starting onboarding session {}", session_id);
                Session::new(session_id.as_str())
            }
        };

        if session.is_completed() {
            log::info!("Session {} already completed; ignoring turn", session_id);
            let message = format!(
                "Onboarding is already complete. Your onboarding ID is {}.",
                session.onboarding_id.as_deref().unwrap_or_default()
            );
            return Ok(TurnResult::from_session(&session, message, Vec::new()));
        }

        let mut issues = Vec::new();
        let mut verification_note = None;
        let mut completed = None;

        if let Some(category) = session.active_category() {
            let agent = self.agents.get(&category).ok_or_else(|| {
                OnboardingError::config(format!("no agent registered for {}", category))
            })?;
            log::info!("Session {} turn {} on {}", session_id, session.turns + 1, category);

            let outcome = agent.process(message, &session.fields(category)).await;
            session.merge_fields(category, &outcome.valid);
            issues.extend(outcome.issues.iter().cloned());

            if outcome.complete {
                match self.verify(&mut session, &outcome).await {
                    Ok(note) => {
                        session.complete_category(category);
                        completed = Some(category);
                        log::info!("Session {} completed {}", session_id, category);
                        verification_note = note;
                    }
                    Err(issue) => issues.push(issue),
                }
            }
        }

        let finalized = session.refresh_status();
        if finalized {
            log::info!(
                "Session {} finalized with onboarding id {}",
                session_id,
                session.onboarding_id.as_deref().unwrap_or_default()
            );
        }

        session.turns += 1;
        session.touch();
        if let Err(e) = self.store.save(&session).await {
            log::error!("Failed to save session {}: {}", session_id, e);
            return Err(e.into());
        }
        for event in SessionEvent::for_turn(&session, completed, finalized) {
            self.events.publish(event);
        }

        if let Some(note) = verification_note {
            issues.push(note);
        }
        let message = guidance(&session, &issues, finalized);
        Ok(TurnResult::from_session(&session, message, issues))
    }

    /// Run the configured verifier for a freshly completed category.
    ///
    /// `Ok` means the category may be marked complete, optionally with an
    /// informational issue when verification was skipped. `Err` carries the
    /// rejection to show the user.
    async fn verify(
        &self,
        session: &mut Session,
        outcome: &CategoryOutcome,
    ) -> Result<Option<Issue>, Issue> {
        let category = outcome.category;
        let Some(verifier) = self.verifiers.get(category).await else {
            return Ok(None);
        };

        let fields = session.fields(category);
        let result = match tokio::time::timeout(
            self.verification_timeout,
            verifier.verify(category, &fields),
        )
        .await
        {
            Ok(v) => v,
            Err(_) => Verification::Unavailable(format!(
                "no answer within {:?}",
                self.verification_timeout
            )),
        };

        match result {
            Verification::Verified => {
                session.record_verification(category, VerificationOutcome::Verified, None);
                Ok(None)
            }
            Verification::Failed(reason) => {
                log::info!(
                    "Verification of {} rejected for session {}: {}",
                    category,
                    session.session_id,
                    reason
                );
                session.record_verification(
                    category,
                    VerificationOutcome::Failed,
                    Some(reason.clone()),
                );
                Err(Issue::general(
                    IssueKind::VerificationFailed,
                    format!("Could not verify your {}: {}", category.label(), reason),
                ))
            }
            Verification::Unavailable(reason) => {
                log::warn!(
                    "Verification of {} skipped for session {}: {}",
                    category,
                    session.session_id,
                    reason
                );
                session.record_verification(
                    category,
                    VerificationOutcome::Skipped,
                    Some(reason),
                );
                Ok(Some(Issue::general(
                    IssueKind::VerificationUnavailable,
                    format!(
                        "{} verification is temporarily unavailable; continuing without it",
                        category.label()
                    ),
                )))
            }
        }
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, OnboardingError> {
        match self.store.load(session_id).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) | Err(StoreError::InvalidSessionId(_)) => {
                Err(OnboardingError::UnknownSession(session_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, OnboardingError> {
        Ok(self.store.list().await?)
    }
}

fn build_agents(
    extractor: &Arc<dyn Extractor>,
    timeout: Duration,
) -> HashMap<Category, DomainAgent> {
    Category::ORDER
        .into_iter()
        .map(|c| (c, DomainAgent::new(c, extractor.clone(), timeout)))
        .collect()
}

/// Human-readable next step for the user
fn guidance(session: &Session, issues: &[Issue], finalized: bool) -> String {
    if finalized {
        return format!(
            "Onboarding complete! Your onboarding ID is {}.",
            session.onboarding_id.as_deref().unwrap_or_default()
        );
    }
    let Some(category) = session.active_category() else {
        return "Onboarding is already complete.".to_string();
    };

    let mut lines = Vec::new();
    let problems: Vec<&Issue> = issues
        .iter()
        .filter(|i| {
            !matches!(
                i.kind,
                IssueKind::MissingField | IssueKind::VerificationUnavailable
            )
        })
        .collect();
    if !problems.is_empty() {
        lines.push("There were problems with your details:".to_string());
        lines.extend(problems.iter().map(|i| format!("- {}", i)));
    }

    let schema = schema_for(category);
    let stored = session.fields(category);
    let wanted: Vec<String> = schema
        .required_fields()
        .filter(|f| !stored.contains_key(f.name))
        .map(|f| format!("{} ({})", f.name, f.hint))
        .collect();

    if wanted.is_empty() {
        lines.push(format!(
            "Please resubmit your {} once the problem above is fixed.",
            category.label()
        ));
    } else {
        lines.push(format!(
            "To continue with {}, please provide: {}.",
            category.label(),
            wanted.join(", ")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::extract::PatternExtractor;
    use crate::onboarding::session::Status;
    use crate::onboarding::store::MemoryStore;

    fn supervisor() -> Supervisor {
        Supervisor::new(
            Arc::new(MemoryStore::new()),
            Arc::new(PatternExtractor::new()),
        )
    }

    #[tokio::test]
    async fn test_generates_session_id() {
        let sup = supervisor();
        let result = sup.process_turn(None, "hello").await.unwrap();
        assert!(!result.session_id.is_empty());
        assert_eq!(result.status, Status::InProgress);
        assert!(result.message.contains("signup"));

        let session = sup.get_session(&result.session_id).await.unwrap();
        assert_eq!(session.turns, 1);
    }

    #[tokio::test]
    async fn test_signup_then_company_prompt() {
        let sup = supervisor();
        let result = sup
            .process_turn(
                Some("s1"),
                "Name: John Doe, Email: john@example.com, Phone: 5551234",
            )
            .await
            .unwrap();
        assert!(result.progress.signup);
        assert_eq!(result.active_category, Some(Category::Company));
        assert!(result.message.contains("company_name"));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_field_reported() {
        let sup = supervisor();
        let result = sup
            .process_turn(Some("s2"), "Name: Jo, Email: not-an-email, Phone: 5551234")
            .await
            .unwrap();
        assert!(!result.progress.signup);
        assert!(result
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::InvalidFormat && i.field.as_deref() == Some("email")));
        assert!(result.message.contains("email"));

        let session = sup.get_session("s2").await.unwrap();
        assert!(!session.fields(Category::Signup).contains_key("email"));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let sup = supervisor();
        assert!(matches!(
            sup.get_session("nobody").await,
            Err(OnboardingError::UnknownSession(_))
        ));
        assert!(matches!(
            sup.get_session("../etc").await,
            Err(OnboardingError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn test_any_session_id_accepted() {
        let sup = supervisor();
        for id in ["a/b", "user@example.com", "two words"] {
            let result = sup.process_turn(Some(id), "hi").await.unwrap();
            assert_eq!(result.session_id, id);
            assert_eq!(sup.get_session(id).await.unwrap().turns, 1);
        }
    }

    #[tokio::test]
    async fn test_session_locks_released_after_turns() {
        let sup = supervisor();
        for i in 0..50 {
            let id = format!("tmp-{}", i);
            sup.process_turn(Some(&id), "hello").await.unwrap();
        }
        assert_eq!(sup.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_events_follow_saved_turns() {
        let sup = supervisor();
        let mut rx = sup.subscribe();
        sup.process_turn(
            Some("ev"),
            "Name: John Doe, Email: john@example.com, Phone: 5551234",
        )
        .await
        .unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::SessionUpdated { active_category: Some(Category::Company), .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::CategoryCompleted { category: Category::Signup, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_fail_turn() {
        let sup = supervisor();
        drop(sup.subscribe());
        assert!(sup.process_turn(Some("quiet"), "hello").await.is_ok());
    }

    #[test]
    fn test_guidance_lists_missing_fields() {
        let session = Session::new("g");
        let text = guidance(&session, &[], false);
        assert!(text.contains("name"));
        assert!(text.contains("email"));
        assert!(text.contains("phone"));
    }
}
