//! Per-field outcomes of one step and the gate that decides whether the step
//! may be submitted.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::form::field::FieldDescriptor;
use crate::form::matcher::MatchRule;
use crate::steps::Step;

/// Why a field could not be filled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FillFailure {
    #[error("required field '{label}' has no answer in the profile")]
    UnmatchedRequiredField { label: String },

    #[error("required field '{label}' uses a control the filler cannot operate")]
    UnsupportedRequiredField { label: String },

    #[error("no option matches '{wanted}' (available: {})", .options.join(", "))]
    NoMatchingOption { wanted: String, options: Vec<String> },

    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("answer '{value}' does not fit a {kind} field")]
    IncompatibleValue { value: String, kind: String },

    #[error("page interaction failed: {message}")]
    Interaction { message: String },
}

/// What happened to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    Filled {
        key: String,
        rule: MatchRule,
        value: String,
    },
    /// No profile answer; the field was left untouched.
    Unmatched,
    Skipped {
        reason: String,
    },
    Failed {
        key: String,
        failure: FillFailure,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: FieldDescriptor,
    pub outcome: FieldOutcome,
}

impl FieldReport {
    /// The failure this field contributes to the step, if any. Unmatched or
    /// skipped optional fields are not failures.
    pub fn failure(&self) -> Option<FillFailure> {
        let label = || self.field.label.clone();
        match &self.outcome {
            FieldOutcome::Unmatched if self.field.required => {
                Some(FillFailure::UnmatchedRequiredField { label: label() })
            }
            FieldOutcome::Skipped { .. } if self.field.required => {
                Some(FillFailure::UnsupportedRequiredField { label: label() })
            }
            FieldOutcome::Failed { failure, .. } => Some(failure.clone()),
            _ => None,
        }
    }

    /// Failures that make submitting the step pointless: a required field
    /// left empty, a missing upload, or any failure on a required field.
    pub fn blocks_submit(&self) -> bool {
        match self.failure() {
            Some(FillFailure::UnmatchedRequiredField { .. }) => true,
            Some(FillFailure::FileNotFound { .. }) => true,
            Some(_) => self.field.required,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub filled: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything the filler did on one visit of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub fields: Vec<FieldReport>,
}

impl StepReport {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, field: FieldDescriptor, outcome: FieldOutcome) {
        self.fields.push(FieldReport { field, outcome });
    }

    /// Append the outcomes of another pass over the same step.
    pub fn absorb(&mut self, other: StepReport) {
        self.fields.extend(other.fields);
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary::default();
        for report in &self.fields {
            match report.outcome {
                FieldOutcome::Filled { .. } => s.filled += 1,
                FieldOutcome::Unmatched => s.unmatched += 1,
                FieldOutcome::Skipped { .. } => s.skipped += 1,
                FieldOutcome::Failed { .. } => s.failed += 1,
            }
        }
        s
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields
            .iter()
            .filter(|r| matches!(r.outcome, FieldOutcome::Unmatched))
    }

    /// Every failure of the step, in field order.
    pub fn failures(&self) -> Vec<(&FieldDescriptor, FillFailure)> {
        self.fields
            .iter()
            .filter_map(|r| r.failure().map(|f| (&r.field, f)))
            .collect()
    }

    pub fn is_submittable(&self) -> bool {
        !self.fields.iter().any(FieldReport::blocks_submit)
    }

    /// Refuse to continue past a step with blocking failures.
    pub fn ensure_submittable(&self) -> Result<()> {
        let blocking: Vec<String> = self
            .fields
            .iter()
            .filter(|r| r.blocks_submit())
            .filter_map(|r| r.failure().map(|f| f.to_string()))
            .collect();
        if blocking.is_empty() {
            return Ok(());
        }
        Err(Error::StepBlocked {
            step: self.step,
            reason: blocking.join("; "),
        })
    }

    /// Log the matched/unmatched summary. Called before any Next/Submit click.
    pub fn log_summary(&self) {
        let s = self.summary();
        info!(
            step = %self.step,
            filled = s.filled,
            unmatched = s.unmatched,
            skipped = s.skipped,
            failed = s.failed,
            "step summary"
        );
        for report in self.unmatched() {
            warn!(
                step = %self.step,
                label = %report.field.label,
                id = %report.field.identifier,
                required = report.field.required,
                "unmatched field"
            );
        }
        for (field, failure) in self.failures() {
            if !matches!(failure, FillFailure::UnmatchedRequiredField { .. }) {
                warn!(step = %self.step, label = %field.label, error = %failure, "field failed");
            }
        }
    }
}
