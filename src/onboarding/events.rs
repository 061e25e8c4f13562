// SPDX-License-Identifier: MIT

//! Session lifecycle notifications
//!
//! Published after a turn has been saved. Delivery is best effort: nobody
//! listening, or a receiver that falls behind, never affects the turn.

use crate::onboarding::category::Category;
use crate::onboarding::session::{Progress, Session};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A turn was saved
    SessionUpdated {
        session_id: String,
        active_category: Option<Category>,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// A category passed validation and verification
    CategoryCompleted {
        session_id: String,
        category: Category,
        timestamp: DateTime<Utc>,
    },
    /// The last category completed and an onboarding id was issued
    OnboardingCompleted {
        session_id: String,
        onboarding_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::SessionUpdated { session_id, .. }
            | SessionEvent::CategoryCompleted { session_id, .. }
            | SessionEvent::OnboardingCompleted { session_id, .. } => session_id,
        }
    }

    /// Events describing one saved turn, in publication order
    pub fn for_turn(
        session: &Session,
        completed: Option<Category>,
        finalized: bool,
    ) -> Vec<SessionEvent> {
        let timestamp = session.updated_at;
        let mut events = vec![SessionEvent::SessionUpdated {
            session_id: session.session_id.clone(),
            active_category: session.active_category(),
            progress: session.progress,
            timestamp,
        }];
        if let Some(category) = completed {
            events.push(SessionEvent::CategoryCompleted {
                session_id: session.session_id.clone(),
                category,
                timestamp,
            });
        }
        if let (true, Some(onboarding_id)) = (finalized, &session.onboarding_id) {
            events.push(SessionEvent::OnboardingCompleted {
                session_id: session.session_id.clone(),
                onboarding_id: onboarding_id.clone(),
                timestamp,
            });
        }
        events
    }
}

/// Fan-out of [`SessionEvent`]s to any number of subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            log::debug!("No subscribers for {} event", e.0.session_id());
        }
    }
}
