// SPDX-License-Identifier: MIT

//! Domain agent
//!
//! One agent type serves all four categories; the category schema is the
//! only thing that differs. An agent extracts fields from the message,
//! merges them over what earlier turns already validated, and validates the
//! result.

use crate::onboarding::category::Category;
use crate::onboarding::extract::Extractor;
use crate::onboarding::schema::{schema_for, CategorySchema};
use crate::onboarding::validation::{self, FieldMap, Issue, IssueKind};
use std::sync::Arc;
use std::time::Duration;

/// Result of processing one category for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: Category,
    /// Raw values the extractor returned, restricted to the schema
    pub extracted: FieldMap,
    /// Valid values after merging with prior fields
    pub valid: FieldMap,
    pub issues: Vec<Issue>,
    /// Every mandatory field is present and valid
    pub complete: bool,
    /// Mandatory fields still lacking a valid value
    pub outstanding: Vec<&'static str>,
}

pub struct DomainAgent {
    schema: &'static CategorySchema,
    extractor: Arc<dyn Extractor>,
    timeout: Duration,
}

impl DomainAgent {
    pub fn new(category: Category, extractor: Arc<dyn Extractor>, timeout: Duration) -> Self {
        Self {
            schema: schema_for(category),
            extractor,
            timeout,
        }
    }

    pub fn category(&self) -> Category {
        self.schema.category
    }

    pub fn schema(&self) -> &'static CategorySchema {
        self.schema
    }

    /// Extract, merge over `prior`, validate.
    pub async fn process(&self, text: &str, prior: &FieldMap) -> CategoryOutcome {
        let category = self.category();
        let mut issues = Vec::new();

        let extracted = match tokio::time::timeout(
            self.timeout,
            self.extractor.extract(text, self.schema),
        )
        .await
        {
            Ok(Ok(fields)) => fields,
            Ok(Err(e)) => {
                log::warn!(
                    "Extractor {} failed for {}: {}",
                    self.extractor.name(),
                    category,
                    e
                );
                issues.push(Issue::general(
                    IssueKind::ExtractionUnavailable,
                    "Could not read details from that message; please try again",
                ));
                FieldMap::new()
            }
            Err(_) => {
                log::warn!(
                    "Extractor {} timed out after {:?} for {}",
                    self.extractor.name(),
                    self.timeout,
                    category
                );
                issues.push(Issue::general(
                    IssueKind::ExtractionUnavailable,
                    "Reading that message took too long; please try again",
                ));
                FieldMap::new()
            }
        };

        let extracted: FieldMap = extracted
            .into_iter()
            .filter(|(k, _)| self.schema.field(k).is_some())
            .collect();
        log::debug!(
            "{} extracted fields: {:?}",
            category,
            extracted.keys().collect::<Vec<_>>()
        );

        let mut merged = prior.clone();
        merged.extend(extracted.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.retain(|k, _| self.schema.field(k).is_some());

        let mut report = validation::validate(self.schema, &merged);
        // A rejected correction must not erase a value validated earlier.
        for (k, v) in prior {
            if self.schema.field(k).is_some() {
                report.valid.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        report.issues.retain(|issue| match (&issue.kind, &issue.field) {
            (IssueKind::MissingField, Some(f)) => !report.valid.contains_key(f),
            _ => true,
        });

        let complete = report.is_complete(self.schema);
        let outstanding = report.outstanding(self.schema);
        issues.extend(report.issues);

        CategoryOutcome {
            category,
            extracted,
            valid: report.valid,
            issues,
            complete,
            outstanding,
        }
    }
}
