use thiserror::Error;

/// Errors that can occur while building payment orders or generating files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LastschriftError {
    /// A precondition for an operation or state transition is not met.
    /// The affected records keep their previous state.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The data cannot be turned into a schema-valid pain.008 document.
    /// No partial document is persisted.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Payment lines sharing a grouping key disagree on mandate or partner.
    #[error("inconsistent payment line group: {0}")]
    InconsistentGroup(String),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Payment mode configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "creditor.iban").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// Rule tag if applicable (e.g. "SEPA-CI").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule tag.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error with a rule tag.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

/// Join collected validation errors into one message.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
