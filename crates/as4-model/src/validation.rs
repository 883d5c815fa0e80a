//! Accumulator for validation findings.
//!
//! Validators append to an [`ErrorList`] instead of returning on the first
//! problem, so a caller sees every violation in one round-trip.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorLevel {
    Warning,
    Error,
}

/// A single finding, attributed to a field path such as `leg1.protocol.address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub level: ErrorLevel,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            ErrorLevel::Warning => "warning",
            ErrorLevel::Error => "error",
        };
        write!(f, "[{level}] {}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    items: Vec<ValidationError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(ValidationError {
            field: field.into(),
            message: message.into(),
            level: ErrorLevel::Error,
        });
    }

    pub fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(ValidationError {
            field: field.into(),
            message: message.into(),
            level: ErrorLevel::Warning,
        });
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.items.extend(other.items);
    }

    /// True if any entry is an error rather than a warning.
    pub fn contains_errors(&self) -> bool {
        self.items.iter().any(|e| e.level == ErrorLevel::Error)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.items.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.items.iter()
    }

    /// All entries joined into one line, for fault details and logs.
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl IntoIterator for ErrorList {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_not_errors() {
        let mut list = ErrorList::new();
        list.warn("leg1.security", "no signing algorithm");
        assert!(!list.is_empty());
        assert!(!list.contains_errors());

        list.error("initiator", "missing");
        assert!(list.contains_errors());
        assert_eq!(list.len(), 2);
        assert!(list.contains_field("initiator"));
    }

    #[test]
    fn test_summary_keeps_order() {
        let mut list = ErrorList::new();
        list.error("a", "first");
        list.error("b", "second");
        assert_eq!(list.summary(), "[error] a: first; [error] b: second");
    }
}
