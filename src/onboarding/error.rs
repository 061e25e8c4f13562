// SPDX-License-Identifier: MIT

//! Top-level errors for the onboarding service
//!
//! Field problems are not errors; they travel as [`Issue`](crate::onboarding::validation::Issue)
//! values in the turn result. These variants cover the faults a caller
//! cannot recover from by rephrasing a message.

use crate::adk::error::ModelError;
use crate::onboarding::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl OnboardingError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
