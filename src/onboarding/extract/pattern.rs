// SPDX-License-Identifier: MIT

//! Deterministic extractor: `label: value` segments plus shape detectors

use super::{ExtractionError, Extractor};
use crate::onboarding::schema::{CategorySchema, FieldSpec};
use crate::onboarding::validation::FieldMap;
use crate::onboarding::validators::FieldKind;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static IS_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)\s+(?:is|are)\s+(.+)$").expect("valid clause regex"));
static AND_JOINER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+and\s+").expect("valid joiner regex"));

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});
static GST_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{2}[A-Z]{5}\d{4}[A-Z]\d[A-Z]\d\b").expect("valid GST regex")
});
static PAN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z]{5}\d{4}[A-Z]\b").expect("valid PAN regex"));
static IFSC_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z]{4}0\d{6}\b").expect("valid IFSC regex"));
static AADHAR_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4} ?\d{4} ?\d{4}\b").expect("valid Aadhar regex"));

const LABEL_FILLERS: &[&str] = &["my ", "our ", "the ", "and "];

/// Extracts labelled values ("Email: a@b.com", "my name is Ann") and falls
/// back to shape detection for distinctive formats such as GST or PAN.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run extraction synchronously
    pub fn extract_fields(&self, text: &str, schema: &CategorySchema) -> FieldMap {
        let mut found = FieldMap::new();

        for segment in text.split([',', ';', '\n']) {
            for clause in split_clauses(segment, schema) {
                let Some((spec, value)) = labelled_field(schema, clause) else {
                    continue;
                };
                let value = clean_value(value);
                if !value.is_empty() && !found.contains_key(spec.name) {
                    found.insert(spec.name.to_string(), value);
                }
            }
        }

        // A labelled value that does not look like its kind can still be
        // replaced by a well-formed match elsewhere in the text.
        for spec in schema.fields {
            let labelled_ok = found.get(spec.name).map(|v| spec.kind.validate(v).is_ok());
            if labelled_ok == Some(true) {
                continue;
            }
            if let Some(value) = detect_shape(spec.kind, text) {
                if labelled_ok.is_none() || spec.kind.validate(&value).is_ok() {
                    found.insert(spec.name.to_string(), value);
                }
            }
        }

        found
    }
}

/// Split "X is a and Y is b" at each "and" that starts another known field,
/// leaving values such as "Smith and Sons" intact.
fn split_clauses<'a>(segment: &'a str, schema: &CategorySchema) -> Vec<&'a str> {
    let joiners: Vec<_> = AND_JOINER.find_iter(segment).collect();
    let mut clauses = Vec::new();
    let mut start = 0;
    for (i, joiner) in joiners.iter().enumerate() {
        let end = joiners.get(i + 1).map_or(segment.len(), |next| next.start());
        if labelled_field(schema, &segment[joiner.end()..end]).is_some() {
            clauses.push(&segment[start..joiner.start()]);
            start = joiner.end();
        }
    }
    clauses.push(&segment[start..]);
    clauses
}

fn labelled_field<'a>(
    schema: &CategorySchema,
    clause: &'a str,
) -> Option<(&'static FieldSpec, &'a str)> {
    let (label, value) = split_segment(clause)?;
    Some((match_label(schema, &label)?, value))
}

fn split_segment(segment: &str) -> Option<(String, &str)> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    if let Some(idx) = segment.find([':', '=']) {
        let (label, rest) = segment.split_at(idx);
        return Some((normalize_label(label), &rest[1..]));
    }

    let caps = IS_CLAUSE.captures(segment)?;
    let label = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str();
    Some((normalize_label(label), value))
}

fn normalize_label(label: &str) -> String {
    let mut label = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    loop {
        let before = label.len();
        for filler in LABEL_FILLERS {
            if let Some(rest) = label.strip_prefix(filler) {
                label = rest.to_string();
            }
        }
        if label.len() == before {
            break;
        }
    }
    label
}

fn match_label(schema: &CategorySchema, label: &str) -> Option<&'static FieldSpec> {
    schema
        .fields
        .iter()
        .find(|f| f.aliases.contains(&label) || f.name == label)
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

fn detect_shape(kind: FieldKind, text: &str) -> Option<String> {
    let re: &Regex = match kind {
        FieldKind::Email => &*EMAIL_SHAPE,
        FieldKind::Gst => &*GST_SHAPE,
        FieldKind::Pan => &*PAN_SHAPE,
        FieldKind::Ifsc => &*IFSC_SHAPE,
        FieldKind::Aadhar => &*AADHAR_SHAPE,
        FieldKind::Text | FieldKind::Phone | FieldKind::AccountNumber => return None,
    };
    re.find(text).map(|m| m.as_str().to_string())
}

#[async_trait]
impl Extractor for PatternExtractor {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn extract(
        &self,
        text: &str,
        schema: &CategorySchema,
    ) -> Result<FieldMap, ExtractionError> {
        Ok(self.extract_fields(text, schema))
    }
}
