// SPDX-License-Identifier: MIT

//! Validation subgraph
//!
//! Aggregates the field validators of one category into a single
//! `validate(schema, fields) -> (valid fields, issues)` contract. Values that
//! fail their validator never appear in the valid set.

use super::schema::CategorySchema;
use super::validators::FieldError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to value
pub type FieldMap = BTreeMap<String, String>;

/// Classification of a user-visible problem raised during a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    InvalidFormat,
    VerificationFailed,
    VerificationUnavailable,
    ExtractionUnavailable,
}

/// A single problem, optionally tied to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn for_field(field: &str, err: &FieldError) -> Self {
        let kind = match err {
            FieldError::Missing => IssueKind::MissingField,
            FieldError::InvalidFormat { .. } => IssueKind::InvalidFormat,
        };
        Self {
            kind,
            field: Some(field.to_string()),
            message: format!("{} {}", field, err),
        }
    }

    pub fn general(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of validating one category's fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: FieldMap,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// True when every mandatory field of `schema` passed validation
    pub fn is_complete(&self, schema: &CategorySchema) -> bool {
        schema
            .required_fields()
            .all(|f| self.valid.contains_key(f.name))
    }

    /// Names of mandatory fields still lacking a valid value
    pub fn outstanding(&self, schema: &CategorySchema) -> Vec<&'static str> {
        schema
            .required_fields()
            .filter(|f| !self.valid.contains_key(f.name))
            .map(|f| f.name)
            .collect()
    }
}

/// Validate `fields` against `schema`.
///
/// Optional fields are checked only when a non-empty value is present.
/// Fields unknown to the schema pass through untouched.
pub fn validate(schema: &CategorySchema, fields: &FieldMap) -> ValidationReport {
    let mut report = ValidationReport::default();

    for spec in schema.fields {
        let result = match fields.get(spec.name) {
            Some(raw) => spec.kind.validate(raw),
            None => Err(FieldError::Missing),
        };

        match result {
            Ok(value) => {
                report.valid.insert(spec.name.to_string(), value);
            }
            Err(FieldError::Missing) if !spec.required => {}
            Err(err) => report.issues.push(Issue::for_field(spec.name, &err)),
        }
    }

    for (name, value) in fields {
        if schema.field(name).is_none() {
            report.valid.insert(name.clone(), value.clone());
        }
    }

    report
}
