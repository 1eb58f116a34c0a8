use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure raised by a calculator's `compute`.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[error("{code}: {message}")]
pub struct CalculatorError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingRequiredField,
    InvalidFieldType,
    InvalidFieldValue,
    MissingContext,
    NotTerminal,
    BusinessRuleViolation,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldType => "INVALID_FIELD_TYPE",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::MissingContext => "MISSING_CONTEXT",
            ErrorCode::NotTerminal => "NOT_TERMINAL",
            ErrorCode::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
        };
        f.write_str(code)
    }
}

impl CalculatorError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn missing_field(name: &str) -> Self {
        Self::new(ErrorCode::MissingRequiredField, format!("required option '{name}' was not found"))
    }

    pub fn invalid_type(name: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFieldType,
            format!("option '{name}' must be {expected}, got {actual}"),
        )
    }

    pub fn invalid_value(name: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, format!("option '{name}' is invalid: {reason}"))
    }

    pub fn missing_context(what: &str) -> Self {
        Self::new(ErrorCode::MissingContext, format!("pipeline context has no {what}"))
    }

    pub fn not_terminal(code: &str) -> Self {
        Self::new(
            ErrorCode::NotTerminal,
            format!("calculator '{code}' can only run as the last stage"),
        )
    }

    pub fn rule_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BusinessRuleViolation, message)
    }
}
