//! Backtracking matching engine, shortcuts, and interactive completion.
//!
//! This crate turns a [`CommandGrammar`](command_grammar_core::CommandGrammar)
//! into a compiled [`Analyser`] and runs input against it:
//!
//! - [`TokenBuffer`] — the indexed unit buffer with O(1) snapshot/restore
//!   backtracking.
//! - [`HeaderSpec`] — prefix × name header matching, `{ident:pat}`
//!   placeholders, and fuzzy "did you mean" suggestions.
//! - [`Analyser`] — the recursive BODY loop: options, subcommands, sentence
//!   words, and positional Args, with priority-ordered overload resolution.
//! - [`Shortcut`] / [`ShortcutTable`] — textual alias expansion ahead of
//!   parsing.
//! - [`CompletionSession`] — pause-at-trigger interactive completion.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::{Arg, Args, CommandGrammar, OptionSpec, Pattern, Value};
//! use command_grammar_engine::compile;
//!
//! let analyser = compile(
//!     CommandGrammar::new("deploy")
//!         .with_args(Args::new().add(Arg::new("target", Pattern::str())))
//!         .with_option(
//!             OptionSpec::new("--env")
//!                 .with_args(Args::new().add(Arg::new("name", Pattern::str()))),
//!         ),
//! )
//! .unwrap();
//!
//! let result = analyser.parse("deploy --env staging prod").unwrap();
//! assert!(result.matched);
//! assert_eq!(result.query("target"), Some(&Value::Str("prod".into())));
//! assert_eq!(result.query("--env.name"), Some(&Value::Str("staging".into())));
//! ```

mod analyser;
mod buffer;
mod completion;
mod header;
mod shortcut;

pub use analyser::{Analyser, CompileError, compile};
pub use buffer::{Snapshot, TokenBuffer};
pub use completion::{CompletionSession, SessionState};
pub use header::HeaderSpec;
pub use shortcut::{Shortcut, ShortcutTable};
