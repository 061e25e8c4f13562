// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key =
            env::var("GOOGLE_API_KEY").map_err(|_| ModelError::ApiKeyMissing("gemini".into()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
        })
    }

    /// Gemini has no system role in `contents`; system text goes into
    /// `systemInstruction` instead.
    fn build_body(history: &[Content], config: Option<&GenerationConfig>) -> Value {
        let mut system_text = Vec::new();
        let mut contents = Vec::new();

        for c in history {
            let text = c.text();
            if c.role == "system" {
                system_text.push(text);
                continue;
            }
            let role = if c.role == "model" { "model" } else { "user" };
            contents.push(json!({ "role": role, "parts": [{ "text": text }] }));
        }

        let mut body = json!({ "contents": contents });
        if !system_text.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_text.join("\n\n") }] });
        }

        if let Some(cfg) = config {
            let mut generation = json!({});
            if let Some(t) = cfg.temperature {
                generation["temperature"] = json!(t);
            }
            if let Some(m) = cfg.max_output_tokens {
                generation["maxOutputTokens"] = json!(m);
            }
            if cfg.json_output {
                generation["responseMimeType"] = json!("application/json");
            }
            body["generationConfig"] = generation;
        }

        body
    }

    fn parse_response(resp_json: &Value) -> Result<Content, ModelError> {
        let candidate = resp_json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::invalid_response("no candidates in Gemini response"))?;

        if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
            log::debug!("Gemini finish reason: {}", finish_reason);
            if finish_reason == "SAFETY" {
                return Err(ModelError::api(
                    "gemini",
                    "response blocked by safety filters",
                ));
            }
        }

        let parts_json = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                ModelError::invalid_response(format!("no parts in candidate: {}", candidate))
            })?;

        let mut parts = Vec::new();
        for p in parts_json {
            let is_thought = p.get("thought").and_then(|t| t.as_bool()).unwrap_or(false);
            if let Some(text) = p["text"].as_str() {
                if is_thought {
                    parts.push(Part::Thinking(text.to_string()));
                } else {
                    parts.push(Part::Text(text.to_string()));
                }
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model_name, self.api_key
        );

        let body = Self::build_body(history, config);
        log::debug!("Gemini request for model {}", self.model_name);

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api("gemini", text));
        }

        let resp_json: Value = resp.json().await?;
        Self::parse_response(&resp_json)
    }
}
