// SPDX-License-Identifier: MIT

//! Session record and turn result types
//!
//! A session is the durable record of one onboarding attempt. Its progress
//! flags only ever move from false to true, and `status == Completed` holds
//! exactly when all four flags are set and an onboarding id is assigned.

use crate::onboarding::category::Category;
use crate::onboarding::validation::{FieldMap, Issue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current persisted layout version
pub const STATE_VERSION: &str = "1.0";

pub const ONBOARDING_ID_PREFIX: &str = "ONB_";

fn default_state_version() -> String {
    STATE_VERSION.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InProgress,
    Completed,
}

/// Per-category completion flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub signup: bool,
    pub company: bool,
    pub kyc: bool,
    pub bank: bool,
}

impl Progress {
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Signup => self.signup,
            Category::Company => self.company,
            Category::Kyc => self.kyc,
            Category::Bank => self.bank,
        }
    }

    /// Set a flag. Flags are monotonic, so there is no way to clear one.
    fn mark(&mut self, category: Category) {
        match category {
            Category::Signup => self.signup = true,
            Category::Company => self.company = true,
            Category::Kyc => self.kyc = true,
            Category::Bank => self.bank = true,
        }
    }

    pub fn all_complete(&self) -> bool {
        Category::ORDER.iter().all(|c| self.get(*c))
    }

    /// First category in processing order that is not yet complete
    pub fn active(&self) -> Option<Category> {
        Category::ORDER.into_iter().find(|c| !self.get(*c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Failed,
    Skipped,
}

/// Append-only audit entry for a verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub category: Category,
    pub outcome: VerificationOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "default_state_version")]
    pub state_version: String,
    pub session_id: String,
    pub status: Status,
    pub progress: Progress,
    pub collected_fields: BTreeMap<Category, FieldMap>,
    pub onboarding_id: Option<String>,
    #[serde(default)]
    pub turns: u64,
    #[serde(default)]
    pub verifications: Vec<VerificationRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            state_version: default_state_version(),
            session_id: session_id.into(),
            status: Status::InProgress,
            progress: Progress::default(),
            collected_fields: Category::ORDER
                .into_iter()
                .map(|c| (c, FieldMap::new()))
                .collect(),
            onboarding_id: None,
            turns: 0,
            verifications: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn active_category(&self) -> Option<Category> {
        if self.is_completed() {
            None
        } else {
            self.progress.active()
        }
    }

    pub fn fields(&self, category: Category) -> FieldMap {
        self.collected_fields
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    /// Union `valid` into the stored fields of `category`.
    ///
    /// Callers must only pass values that passed validation.
    pub fn merge_fields(&mut self, category: Category, valid: &FieldMap) {
        let stored = self.collected_fields.entry(category).or_default();
        for (k, v) in valid {
            stored.insert(k.clone(), v.clone());
        }
    }

    pub fn complete_category(&mut self, category: Category) {
        self.progress.mark(category);
    }

    pub fn record_verification(
        &mut self,
        category: Category,
        outcome: VerificationOutcome,
        detail: Option<String>,
    ) {
        self.verifications.push(VerificationRecord {
            category,
            outcome,
            detail,
            at: Utc::now(),
        });
    }

    /// Recompute status; assigns the onboarding id on first completion.
    ///
    /// Returns true when this call finalized the session.
    pub fn refresh_status(&mut self) -> bool {
        if !self.progress.all_complete() {
            self.status = Status::InProgress;
            return false;
        }
        self.status = Status::Completed;
        if self.onboarding_id.is_none() {
            self.onboarding_id = Some(generate_onboarding_id());
            return true;
        }
        false
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            status: self.status,
            progress: self.progress,
            onboarding_id: self.onboarding_id.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// `ONB_` followed by 8 upper-case hexadecimal characters
pub fn generate_onboarding_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", ONBOARDING_ID_PREFIX, &hex[..8])
}

/// Lightweight listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: Status,
    pub progress: Progress,
    pub onboarding_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// What a caller gets back from one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub session_id: String,
    pub message: String,
    pub status: Status,
    pub progress: Progress,
    pub onboarding_id: Option<String>,
    /// Category the next turn will work on, if any
    pub active_category: Option<Category>,
    pub errors: Vec<String>,
    pub issues: Vec<Issue>,
}

impl TurnResult {
    pub fn from_session(session: &Session, message: String, issues: Vec<Issue>) -> Self {
        Self {
            session_id: session.session_id.clone(),
            message,
            status: session.status,
            progress: session.progress,
            onboarding_id: session.onboarding_id.clone(),
            active_category: session.active_category(),
            errors: issues.iter().map(|i| i.to_string()).collect(),
            issues,
        }
    }
}
