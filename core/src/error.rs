//! Parse error taxonomy.
//!
//! Every way a parse attempt can fail is a [`ParseError`] variant. Failures
//! inside one option/subcommand attempt are caught at that node's boundary
//! and treated as "try the next candidate"; once a level's candidates are
//! exhausted the error surfaces one level up unchanged in kind. By default a
//! top-level failure is carried *inside* the returned
//! [`ParseResult`](crate::ParseResult); only strict grammars propagate it as
//! `Err`.

use thiserror::Error;

/// Errors produced while matching input against a grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The token buffer ran out while a read was requested.
    #[error("input exhausted")]
    ExhaustedInput,

    /// A pattern rejected a token and no default/optional fallback applied.
    #[error("argument {param:?} does not accept token {token:?}")]
    ParamsUnmatched { param: String, token: String },

    /// A required argument was absent and carries no default.
    #[error("required argument missing: {name}")]
    ArgumentMissing { name: String },

    /// No branch at the current level accepts the token.
    #[error("unmatched token {token:?} at position {position}")]
    UnmatchedToken { token: String, position: usize },

    /// The leading text did not match any configured header candidate.
    ///
    /// When fuzzy matching found a candidate within the configured edit
    /// distance, `suggestion` carries it; the input is never auto-corrected.
    #[error("unknown header {input:?}{hint}", hint = suggestion
        .as_ref()
        .map(|s| format!(", did you mean {s:?}?"))
        .unwrap_or_default())]
    HeaderMismatch {
        input: String,
        suggestion: Option<String>,
    },

    /// A shortcut template without placeholders received a trailing suffix.
    #[error("shortcut accepts no suffix, got {suffix:?}")]
    ReservedSuffix { suffix: String },

    /// A post-parse behavior explicitly aborted the whole parse.
    #[error("parse aborted: {reason}")]
    OutOfBounds { reason: String },
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
