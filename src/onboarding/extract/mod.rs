// SPDX-License-Identifier: MIT

//! Extraction adapters
//!
//! An extractor maps free text to raw field values for one category's
//! schema. It performs no validation: everything it returns is treated as
//! untrusted input. Fields it cannot find are simply absent.
//!
//! - [`PatternExtractor`] - deterministic label and shape matching
//! - [`LlmExtractor`] - prompt-driven extraction through a [`Model`](crate::adk::model::Model)

mod llm;
mod pattern;

pub use llm::LlmExtractor;
pub use pattern::PatternExtractor;

use crate::adk::error::ModelError;
use crate::onboarding::schema::CategorySchema;
use crate::onboarding::validation::FieldMap;
use async_trait::async_trait;
use thiserror::Error;

/// Failures an extractor may report. The supervisor degrades all of them to
/// "no new fields this turn".
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("malformed extraction output: {0}")]
    Malformed(String),
}

/// Text to structured fields, for one category at a time
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Extract values for the fields of `schema` from `text`
    async fn extract(
        &self,
        text: &str,
        schema: &CategorySchema,
    ) -> Result<FieldMap, ExtractionError>;
}
