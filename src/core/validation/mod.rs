//! Validation and sanitization
//!
//! Validators check a field value without altering it; filters rewrite a
//! value into its canonical form during `Model::sanitize`. Both are plain
//! closures attached to a field declaration at build time.
//!
//! Validation failures are never thrown one at a time: a model collects every
//! failing field into [`ValidationErrors`] so callers get the complete
//! picture in a single round trip.

pub mod filters;
pub mod validators;

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    /// Transfer name of the offending field
    pub field: String,
    /// Human-readable reason
    pub reason: String,
    /// The value that was rejected
    pub value: Value,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, reason: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            value,
        }
    }
}

/// Every validation failure found on a model, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationFailure>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.0.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.0
    }

    /// Failure recorded for a given field, if any
    pub fn for_field(&self, field: &str) -> Option<&ValidationFailure> {
        self.0.iter().find(|f| f.field == field)
    }

    pub fn into_inner(self) -> Vec<ValidationFailure> {
        self.0
    }
}

impl From<Vec<ValidationFailure>> for ValidationErrors {
    fn from(failures: Vec<ValidationFailure>) -> Self {
        Self(failures)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, failure) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{}{} ({})", sep, failure.field, failure.reason)?;
        }
        Ok(())
    }
}
