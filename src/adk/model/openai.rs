// SPDX-License-Identifier: MIT

//! OpenAI Model - Chat Completions API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

/// OpenAI chat model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for compatible endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| ModelError::ApiKeyMissing("openai".into()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    fn content_to_message(content: &Content) -> Value {
        let role = match content.role.as_str() {
            "model" => "assistant",
            "system" => "system",
            _ => "user",
        };
        json!({ "role": role, "content": content.text() })
    }

    fn build_body(model_name: &str, history: &[Content], config: Option<&GenerationConfig>) -> Value {
        let messages: Vec<Value> = history.iter().map(Self::content_to_message).collect();
        let mut body = json!({ "model": model_name, "messages": messages });

        if let Some(cfg) = config {
            if let Some(t) = cfg.temperature {
                body["temperature"] = json!(t);
            }
            if let Some(m) = cfg.max_output_tokens {
                body["max_tokens"] = json!(m);
            }
            if cfg.json_output {
                body["response_format"] = json!({ "type": "json_object" });
            }
        }
        body
    }

    fn parse_response(response: &Value) -> Result<Content, ModelError> {
        let message = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| ModelError::invalid_response("no choices in OpenAI response"))?;

        let text = message["content"].as_str().unwrap_or_default();
        Ok(Content {
            role: "model".to_string(),
            parts: vec![Part::Text(text.to_string())],
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&self.model_name, history, config);

        log::debug!("OpenAI request for model {}", self.model_name);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api("openai", text));
        }

        let resp_json: Value = resp.json().await?;
        Self::parse_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_body_maps_roles_and_json_mode() {
        let history = vec![Content::system("extract"), Content::user("PAN: ABCDE1234F")];
        let body = OpenAIModel::build_body(
            "gpt-4o-mini",
            &history,
            Some(&GenerationConfig {
                temperature: Some(0.0),
                json_output: true,
                ..Default::default()
            }),
        );

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "PAN: ABCDE1234F");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_parse_response() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": "{}"}}]});
        assert_eq!(OpenAIModel::parse_response(&resp).unwrap().text(), "{}");
    }
}
