// SPDX-License-Identifier: MIT

//! Service configuration
//!
//! Loaded from YAML, then overridden from the environment. Every section
//! has defaults, so an empty document (or no file at all) is a working
//! configuration: pattern extraction, file-backed sessions, no verifiers.

use crate::adk::model;
use crate::onboarding::category::Category;
use crate::onboarding::error::OnboardingError;
use crate::onboarding::extract::{Extractor, LlmExtractor, PatternExtractor};
use crate::onboarding::store::{FileStore, MemoryStore, SessionStore};
use crate::onboarding::verify::{HttpVerifier, VerifierRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "onboarding.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    pub store: StoreConfig,
    pub extraction: ExtractionConfig,
    pub verification: VerificationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::File,
            path: PathBuf::from(".onboarding/sessions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Pattern,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub kind: ExtractorKind,
    pub provider: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            kind: ExtractorKind::Pattern,
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Verification endpoint per category; categories without one are not verified
    pub endpoints: BTreeMap<Category, String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            endpoints: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl OnboardingConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present and defaults are used otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, OnboardingError> {
        let mut config = match path {
            Some(p) => Self::parse_yaml(&std::fs::read_to_string(p)?)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::parse_yaml(&std::fs::read_to_string(DEFAULT_CONFIG_FILE)?)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.endpoint_urls()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, OnboardingError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: OnboardingConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment-style overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), OnboardingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ONBOARDING_STORE_PATH").filter(|p| !p.is_empty()) {
            self.store.kind = StoreKind::File;
            self.store.path = PathBuf::from(path);
        }
        if let Some(kind) = lookup("ONBOARDING_EXTRACTOR") {
            self.extraction.kind = match kind.to_lowercase().as_str() {
                "pattern" => ExtractorKind::Pattern,
                "llm" => ExtractorKind::Llm,
                other => {
                    return Err(OnboardingError::config(format!(
                        "ONBOARDING_EXTRACTOR must be 'pattern' or 'llm', got '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(port) = lookup("ONBOARDING_PORT") {
            self.server.port = port.parse().map_err(|_| {
                OnboardingError::config(format!("ONBOARDING_PORT is not a port: '{}'", port))
            })?;
        }
        if let Some(provider) = lookup("MODEL_PROVIDER").filter(|p| !p.is_empty()) {
            self.extraction.provider = provider;
        }
        if let Some(model) = lookup("MODEL_NAME").filter(|m| !m.is_empty()) {
            self.extraction.model = model;
        }
        Ok(())
    }

    /// Parsed verification endpoints
    pub fn endpoint_urls(&self) -> Result<Vec<(Category, Url)>, OnboardingError> {
        self.verification
            .endpoints
            .iter()
            .map(|(category, raw)| {
                Url::parse(raw).map(|url| (*category, url)).map_err(|e| {
                    OnboardingError::config(format!(
                        "invalid verification endpoint for {}: {} ({})",
                        category, raw, e
                    ))
                })
            })
            .collect()
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction.timeout_secs)
    }

    pub fn verification_timeout(&self) -> Duration {
        Duration::from_secs(self.verification.timeout_secs)
    }

    pub fn build_store(&self) -> Arc<dyn SessionStore> {
        match self.store.kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::File => Arc::new(FileStore::new(self.store.path.clone())),
        }
    }

    pub fn build_extractor(&self) -> Result<Arc<dyn Extractor>, OnboardingError> {
        match self.extraction.kind {
            ExtractorKind::Pattern => Ok(Arc::new(PatternExtractor::new())),
            ExtractorKind::Llm => {
                let model = model::from_provider(&self.extraction.provider, &self.extraction.model)?;
                Ok(Arc::new(LlmExtractor::new(model).with_retries(
                    self.extraction.max_retries,
                    Duration::from_secs(1),
                )))
            }
        }
    }

    pub async fn build_verifiers(&self) -> Result<VerifierRegistry, OnboardingError> {
        let registry = VerifierRegistry::new();
        for (category, url) in self.endpoint_urls()? {
            log::info!("Verification enabled for {} via {}", category, url);
            let verifier = HttpVerifier::new(url)
                .with_retries(self.verification.max_retries, Duration::from_secs(1));
            registry.register(category, Arc::new(verifier)).await;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = OnboardingConfig::parse_yaml("").unwrap();
        assert_eq!(config, OnboardingConfig::default());
        assert_eq!(config.store.kind, StoreKind::File);
        assert_eq!(config.extraction.kind, ExtractorKind::Pattern);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
store:
  kind: memory
extraction:
  kind: llm
  provider: openai
  model: gpt-4o-mini
  timeout_secs: 5
verification:
  timeout_secs: 2
  endpoints:
    kyc: https://verify.example.com/kyc
    bank: https://verify.example.com/bank
server:
  port: 9000
"#;
        let config = OnboardingConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.extraction.kind, ExtractorKind::Llm);
        assert_eq!(config.extraction.provider, "openai");
        assert_eq!(config.extraction.max_retries, 3);
        assert_eq!(config.extraction_timeout(), Duration::from_secs(5));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);

        let urls = config.endpoint_urls().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].0, Category::Kyc);
        assert_eq!(urls[1].0, Category::Bank);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let yaml = "verification:\n  endpoints:\n    passport: https://x.example.com\n";
        assert!(matches!(
            OnboardingConfig::parse_yaml(yaml),
            Err(OnboardingError::Yaml(_))
        ));
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let yaml = "verification:\n  endpoints:\n    bank: not a url\n";
        let config = OnboardingConfig::parse_yaml(yaml).unwrap();
        assert!(matches!(
            config.endpoint_urls(),
            Err(OnboardingError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OnboardingConfig::default();
        config
            .apply_overrides(env(&[
                ("ONBOARDING_STORE_PATH", "/tmp/sessions"),
                ("ONBOARDING_EXTRACTOR", "LLM"),
                ("ONBOARDING_PORT", "9090"),
                ("MODEL_PROVIDER", "openai"),
            ]))
            .unwrap();

        assert_eq!(config.store.path, PathBuf::from("/tmp/sessions"));
        assert_eq!(config.extraction.kind, ExtractorKind::Llm);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.extraction.provider, "openai");
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = OnboardingConfig::default();
        assert!(config
            .apply_overrides(env(&[("ONBOARDING_PORT", "eighty")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("ONBOARDING_EXTRACTOR", "magic")]))
            .is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("onboarding.yaml");
        std::fs::write(&path, "store:\n  kind: memory\n").unwrap();

        let config = OnboardingConfig::load(Some(&path)).unwrap();
        assert_eq!(config.store.kind, StoreKind::Memory);

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            OnboardingConfig::load(Some(&missing)),
            Err(OnboardingError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_build_verifiers() {
        let yaml = "verification:\n  endpoints:\n    kyc: http://127.0.0.1:9/kyc\n";
        let config = OnboardingConfig::parse_yaml(yaml).unwrap();
        let registry = config.build_verifiers().await.unwrap();
        assert!(registry.get(Category::Kyc).await.is_some());
        assert!(registry.get(Category::Bank).await.is_none());
    }
}
