// SPDX-License-Identifier: MIT

//! Remote verification of already-valid category data
//!
//! A [`Verifier`] is consulted only after local validation passes. Its
//! outcome is three-valued: verified, rejected with a reason, or
//! unavailable. Unavailability never blocks onboarding.

use crate::onboarding::category::Category;
use crate::onboarding::validation::FieldMap;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// Outcome of a verification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Failed(String),
    Unavailable(String),
}

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, category: Category, fields: &FieldMap) -> Verification;
}

/// Verifiers keyed by the category they check
#[derive(Clone, Default)]
pub struct VerifierRegistry {
    verifiers: Arc<RwLock<HashMap<Category, Arc<dyn Verifier>>>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, category: Category, verifier: Arc<dyn Verifier>) {
        let mut verifiers = self.verifiers.write().await;
        verifiers.insert(category, verifier);
    }

    pub async fn get(&self, category: Category) -> Option<Arc<dyn Verifier>> {
        let verifiers = self.verifiers.read().await;
        verifiers.get(&category).cloned()
    }
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    category: Category,
    fields: &'a FieldMap,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Verifier backed by an HTTP endpoint.
///
/// Posts `{category, fields}` and expects `{verified, reason?}`. Client
/// errors are rejections; server errors and transport failures are retried
/// with exponential backoff and end up as [`Verification::Unavailable`].
pub struct HttpVerifier {
    client: Client,
    endpoint: Url,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpVerifier {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff_base = backoff_base;
        self
    }

    async fn attempt(&self, category: Category, fields: &FieldMap) -> Attempt {
        let resp = match self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest { category, fields })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(format!("transport error: {}", e)),
        };

        let status = resp.status();
        if status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            return Attempt::Retry(format!("verification service returned {}", status));
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<VerifyResponse>(&body);

        if status.is_client_error() {
            let reason = parsed
                .ok()
                .and_then(|r| r.reason)
                .unwrap_or_else(|| format!("rejected with status {}", status));
            return Attempt::Done(Verification::Failed(reason));
        }

        match parsed {
            Ok(VerifyResponse { verified: true, .. }) => Attempt::Done(Verification::Verified),
            Ok(VerifyResponse { reason, .. }) => Attempt::Done(Verification::Failed(
                reason.unwrap_or_else(|| "rejected by verification service".to_string()),
            )),
            Err(e) => Attempt::Done(Verification::Unavailable(format!(
                "malformed verification response: {}",
                e
            ))),
        }
    }
}

enum Attempt {
    Done(Verification),
    Retry(String),
}

#[async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, category: Category, fields: &FieldMap) -> Verification {
        let mut last_error = String::new();
        for attempt in 0..self.max_retries {
            match self.attempt(category, fields).await {
                Attempt::Done(v) => return v,
                Attempt::Retry(reason) => {
                    log::warn!(
                        "Verification of {} attempt {}/{} failed: {}",
                        category,
                        attempt + 1,
                        self.max_retries,
                        reason
                    );
                    last_error = reason;
                }
            }
            if attempt + 1 < self.max_retries {
                tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
            }
        }
        Verification::Unavailable(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn spawn(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}/verify", addr)).unwrap()
    }

    fn fields() -> FieldMap {
        FieldMap::from([("pan".to_string(), "ABCDE1234F".to_string())])
    }

    fn verifier(url: Url) -> HttpVerifier {
        HttpVerifier::new(url).with_retries(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_verified() {
        let url = spawn(Router::new().route(
            "/verify",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["category"], "kyc");
                assert_eq!(body["fields"]["pan"], "ABCDE1234F");
                Json(json!({ "verified": true }))
            }),
        ))
        .await;

        let outcome = verifier(url).verify(Category::Kyc, &fields()).await;
        assert_eq!(outcome, Verification::Verified);
    }

    #[tokio::test]
    async fn test_rejected_with_reason() {
        let url = spawn(Router::new().route(
            "/verify",
            post(|| async { Json(json!({ "verified": false, "reason": "PAN not found" })) }),
        ))
        .await;

        let outcome = verifier(url).verify(Category::Kyc, &fields()).await;
        assert_eq!(outcome, Verification::Failed("PAN not found".to_string()));
    }

    #[tokio::test]
    async fn test_client_error_is_rejection() {
        let url = spawn(Router::new().route(
            "/verify",
            post(|| async {
                (
                    AxumStatus::UNPROCESSABLE_ENTITY,
                    Json(json!({ "verified": false, "reason": "name mismatch" })),
                )
            }),
        ))
        .await;

        let outcome = verifier(url).verify(Category::Bank, &fields()).await;
        assert_eq!(outcome, Verification::Failed("name mismatch".to_string()));
    }

    #[tokio::test]
    async fn test_server_errors_retry_then_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let url = spawn(Router::new().route(
            "/verify",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::SERVICE_UNAVAILABLE
                }
            }),
        ))
        .await;

        let outcome = verifier(url).verify(Category::Kyc, &fields()).await;
        assert!(matches!(outcome, Verification::Unavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let url = spawn(Router::new().route(
            "/verify",
            post(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(AxumStatus::BAD_GATEWAY)
                    } else {
                        Ok(Json(json!({ "verified": true })))
                    }
                }
            }),
        ))
        .await;

        let outcome = verifier(url).verify(Category::Kyc, &fields()).await;
        assert_eq!(outcome, Verification::Verified);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let url = Url::parse("http://127.0.0.1:9/verify").unwrap();
        let outcome = HttpVerifier::new(url)
            .with_retries(1, Duration::from_millis(0))
            .verify(Category::Bank, &fields())
            .await;
        assert!(matches!(outcome, Verification::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = VerifierRegistry::new();
        let url = Url::parse("http://127.0.0.1:9/verify").unwrap();
        registry
            .register(Category::Bank, Arc::new(HttpVerifier::new(url)))
            .await;

        assert!(registry.get(Category::Bank).await.is_some());
        assert!(registry.get(Category::Kyc).await.is_none());

        let cloned = registry.clone();
        assert!(cloned.get(Category::Bank).await.is_some());
    }
}
