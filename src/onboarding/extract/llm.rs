// SPDX-License-Identifier: MIT

//! Model-backed extractor
//!
//! Sends a per-category extraction prompt to a [`Model`] and parses the JSON
//! object it returns. Model calls are retried with exponential backoff.

use super::{ExtractionError, Extractor};
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::onboarding::schema::CategorySchema;
use crate::onboarding::validation::FieldMap;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;

pub struct LlmExtractor {
    model: Arc<dyn Model>,
    max_retries: u32,
    backoff_base: Duration,
}

impl LlmExtractor {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff_base = backoff_base;
        self
    }

    fn instruction(schema: &CategorySchema) -> String {
        let mut prompt = format!(
            "You are a data extraction specialist for {} information.\n\
             Extract the following fields from the user's message:\n\n",
            schema.category.label()
        );
        for field in schema.fields {
            prompt.push_str(&format!("- {}: {}\n", field.name, field.hint));
        }
        prompt.push_str(
            "\nReturn ONLY a JSON object keyed by the field names above. \
             Use null for fields that are not present. Copy values exactly as written; \
             do not correct or invent them. No additional text.",
        );
        prompt
    }

    async fn generate(&self, history: &[Content]) -> Result<Content, ExtractionError> {
        let config = GenerationConfig {
            temperature: Some(0.0),
            json_output: true,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.model.generate_content(history, Some(&config)).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    attempt += 1;
                    log::warn!(
                        "Extraction model call attempt {}/{} failed: {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    if attempt >= self.max_retries {
                        return Err(e.into());
                    }
                    tokio::time::sleep(self.backoff_base * 2u32.pow(attempt - 1)).await;
                }
            }
        }
    }
}

/// Parse a model reply into schema fields, tolerating markdown code fences.
pub(crate) fn parse_reply(reply: &str, schema: &CategorySchema) -> Result<FieldMap, ExtractionError> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &cleaned[s..=e],
        _ => return Err(ExtractionError::Malformed("no JSON object in reply".into())),
    };

    let json: Value =
        serde_json::from_str(body).map_err(|e| ExtractionError::Malformed(e.to_string()))?;
    let obj = json
        .as_object()
        .ok_or_else(|| ExtractionError::Malformed("reply is not a JSON object".into()))?;

    let mut fields = FieldMap::new();
    for spec in schema.fields {
        let value = match obj.get(spec.name) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if !value.is_empty() {
            fields.insert(spec.name.to_string(), value);
        }
    }
    Ok(fields)
}

#[async_trait]
impl Extractor for LlmExtractor {
    fn name(&self) -> &str {
        "llm"
    }

    async fn extract(
        &self,
        text: &str,
        schema: &CategorySchema,
    ) -> Result<FieldMap, ExtractionError> {
        let history = vec![
            Content::system(Self::instruction(schema)),
            Content::user(text),
        ];
        let reply = self.generate(&history).await?;
        parse_reply(&reply.text(), schema)
    }
}
