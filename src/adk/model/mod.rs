// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and implementations
//!
//! The onboarding layer only needs single-shot text generation, so the
//! trait is narrow. Implementations live in submodules:
//! - [gemini] - Google's Gemini API
//! - [openai] - OpenAI's Chat Completions API

pub mod gemini;
pub mod openai;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Ask the provider for a JSON-only response where supported
    #[serde(default)]
    pub json_output: bool,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models, never forwarded
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError>;
}

/// Build a model from a provider name and model name.
///
/// Provider matching follows the CLI convention: `gemini`/`google`,
/// `openai`. Credentials come from the environment.
pub fn from_provider(provider: &str, model_name: &str) -> Result<Arc<dyn Model>, ModelError> {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(gemini::GeminiModel::new(model_name.to_string())?)),
        "openai" => Ok(Arc::new(openai::OpenAIModel::new(model_name.to_string())?)),
        other => Err(ModelError::UnsupportedProvider(other.to_string())),
    }
}
