//! Core grammar model and result types for declarative command parsing.
//!
//! This crate defines the immutable grammar objects a command is described
//! with, and the per-parse result objects the matching engine produces:
//!
//! - [`Pattern`] — a typed matcher + converter + validator over tokens,
//!   composable via chaining and negation.
//! - [`Args`] / [`Arg`] — ordered argument slots with defaults, separators,
//!   and [`Cardinality`] (single, bounded/unbounded variadic, keyword-value).
//! - [`OptionSpec`] / [`SubcommandSpec`] / [`CommandNode`] — the recursive
//!   node tree, sharing a common capability set (names, Args, `requires`,
//!   priority, defaults, help).
//! - [`CommandGrammar`] — the root grammar, with [`CommandMeta`] and
//!   [`ParserConfig`] supplied as already-resolved immutable values.
//! - [`Action`] — merge semantics for repeated node occurrences.
//! - [`ParseResult`] with [`HeadMatch`], [`OptionResult`], and
//!   [`SubcommandResult`] — the structured, dotted-path-queryable result.
//! - [`ParseError`] — the full failure taxonomy, carried as a value inside
//!   non-strict results.
//!
//! Validation ([`validate_grammar`]) catches structural errors such as
//! ambiguous siblings and ill-placed variadic slots before compilation.
//!
//! Grammar objects are built once and never mutated mid-parse; independent
//! parse calls may share them freely across threads.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let grammar = CommandGrammar::new("deploy")
//!     .with_prefix("/")
//!     .with_args(Args::new().add(Arg::new("target", Pattern::str())))
//!     .with_option(
//!         OptionSpec::new("--env")
//!             .with_alias("-e")
//!             .with_args(Args::new().add(Arg::new("name", Pattern::str()))),
//!     )
//!     .with_subcommand(
//!         SubcommandSpec::new("scale")
//!             .with_args(Args::new().add(Arg::new("replicas", Pattern::int()))),
//!     );
//!
//! assert!(validate_grammar(&grammar).is_empty());
//! ```

mod action;
mod args;
mod behavior;
mod error;
mod grammar;
mod meta;
mod node;
mod pattern;
mod result;
mod validate;
mod value;

pub use action::Action;
pub use args::{Arg, Args, Cardinality};
pub use behavior::{Behavior, BehaviorControl};
pub use error::{ParseError, Result};
pub use grammar::CommandGrammar;
pub use meta::{CommandMeta, ParserConfig};
pub use node::{CommandNode, OptionSpec, SubcommandSpec};
pub use pattern::{Converter, MatchFailure, Pattern, TokenPredicate, Validator};
pub use result::{HeadMatch, OptionResult, ParseResult, SubcommandResult};
pub use validate::{ValidationError, validate_grammar};
pub use value::{ObjectUnit, RawInput, Token, Value};
