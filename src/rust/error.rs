// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types
//!
//! Only genuine failures live here. Expected proof outcomes (no proof
//! found, budgets exhausted, inconsistent axioms) are reported through
//! `ProofStatus` on the result instead.

use thiserror::Error;

/// Failure to turn formula text into a `Formula`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Malformed input: unexpected token, dangling operator, unbalanced parentheses
    #[error("syntax error at offset {position}: {message}")]
    SyntaxError { position: usize, message: String },

    /// Nesting exceeded the configured limit
    #[error("maximum nesting depth {limit} exceeded at offset {position}")]
    MaxDepthExceeded { limit: usize, position: usize },

    /// Character sequence that is not part of the operator set
    #[error("unknown operator '{symbol}' at offset {position}")]
    UnknownOperator { symbol: String, position: usize },
}

impl ParseError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        ParseError::SyntaxError { position, message: message.into() }
    }

    /// Byte offset in the input where the error was detected
    pub fn position(&self) -> usize {
        match self {
            ParseError::SyntaxError { position, .. }
            | ParseError::MaxDepthExceeded { position, .. }
            | ParseError::UnknownOperator { position, .. } => *position,
        }
    }
}

/// Invalid configuration. Raised immediately by constructors and loaders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level failure of a router call
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The chosen prover could not produce a result (Auto strategy only)
    #[error("prover '{prover}' unavailable: {reason}")]
    ProverUnavailable { prover: String, reason: String },

    /// The registry holds no provers at all
    #[error("no prover registered")]
    NoCandidates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::syntax(4, "unexpected end of input");
        assert_eq!(err.to_string(), "syntax error at offset 4: unexpected end of input");
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_router_error_wraps_parse_error() {
        let err: RouterError = ParseError::UnknownOperator { symbol: "#".to_string(), position: 2 }.into();
        assert!(matches!(err, RouterError::Parse(ParseError::UnknownOperator { .. })));
        assert_eq!(err.to_string(), "unknown operator '#' at offset 2");
    }
}
