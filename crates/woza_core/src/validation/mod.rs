use serde::Serialize;
use std::fmt;

use crate::models::collection::CollectionDraft;
use crate::rates::RateTable;

pub mod rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks submission
    Error,
    Warning,
}

// The structure of a failure
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub code: String,          // e.g., "COL-002"
    pub severity: Severity,
    pub message: String,       // "At least one material needs a weight above zero"
    pub field: Option<String>, // Which form field failed?
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// The contract every rule must fulfill
pub trait ValidationRule: Send + Sync {
    fn check(&self, draft: &CollectionDraft, rates: &RateTable) -> Vec<ValidationError>;
    fn rule_id(&self) -> &str;
}

// The Engine that holds the registry of all rules
#[derive(Default)]
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule<R: ValidationRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Runs every rule; failures are collected, not short-circuited.
    pub fn run(&self, draft: &CollectionDraft, rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            let mut rule_errors = rule.check(draft, rates);
            errors.append(&mut rule_errors);
        }
        errors
    }
}

pub fn has_blocking(errors: &[ValidationError]) -> bool {
    errors.iter().any(|e| e.severity == Severity::Error)
}
