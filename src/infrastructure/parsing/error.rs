//! Parsing error types for HTML extraction

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No valid selectors compiled for '{field}'")]
    NoSelectors { field: String },

    #[error("HTML parsing failed: {message}")]
    HtmlParsingFailed { message: String, url: Option<String> },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Configuration errors (bad selectors or patterns) fail every page the
    /// same way; only document-level failures are worth moving past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::HtmlParsingFailed { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
