//! Catalog parse errors.

use std::fmt;

/// An error raised while reading stored catalog SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Byte offset in the statement where matching failed.
    pub position: usize,
    /// What was being matched at that point.
    pub matcher: &'static str,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(matcher: &'static str, message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
            matcher,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} while matching {} at position {}",
            self.message, self.matcher, self.position
        )
    }
}

impl std::error::Error for ParseError {}
