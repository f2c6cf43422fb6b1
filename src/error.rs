//! Domain errors shared by every research-core component.

use thiserror::Error;

/// Errors raised by the research core.
///
/// Every user-visible failure carries the offending field name where one
/// applies, so callers can surface structured messages.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A parameter fell outside its declared domain.
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// A candle reached the execution gateway without a usable field.
    #[error("candle is missing required field `{0}`")]
    MissingField(&'static str),

    /// The broker cannot honor a BUY.
    #[error("insufficient funds: need {needed:.6}, have {available:.6}")]
    InsufficientFunds { needed: f64, available: f64 },

    /// The broker cannot honor a SELL.
    #[error("insufficient position: need {requested}, have {held}")]
    InsufficientPosition { requested: f64, held: f64 },

    /// An external collaborator (data provider, ranking dependency) failed.
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// Shorthand for the most common error kind.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_names_field() {
        let err = EngineError::invalid("simulations", "must be >= 1, got 0");
        assert_eq!(
            err.to_string(),
            "invalid argument `simulations`: must be >= 1, got 0"
        );
    }

    #[test]
    fn test_missing_field_message() {
        let err = EngineError::MissingField("close");
        assert!(err.to_string().contains("close"));
    }
}
