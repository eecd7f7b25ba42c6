//! Identifier parsing errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// An identifier was not in the expected format.
    #[error("invalid identifier: {0}")]
    Invalid(String),
}

impl IdError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
