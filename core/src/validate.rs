//! Grammar validation.
//!
//! Validates structural invariants of a [`CommandGrammar`] before it is
//! compiled: empty names, ambiguous sibling nodes, duplicate argument slots,
//! and ill-placed variadic/rest slots. Sibling nodes may share a trigger
//! spelling only when their `requires` sentences differ (the positional
//! disambiguation the engine resolves by priority).
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let good = CommandGrammar::new("app")
//!     .with_option(OptionSpec::new("--verbose"));
//! assert!(validate_grammar(&good).is_empty());
//!
//! let bad = CommandGrammar::new("app")
//!     .with_option(OptionSpec::new("--verbose"))
//!     .with_option(OptionSpec::new("--verbose"));
//! assert!(!validate_grammar(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Args, Cardinality, CommandGrammar, CommandNode};

/// Grammar validation errors.
///
/// Each variant describes a specific structural problem; `path` locates the
/// offending scope as a space-joined node path from the command name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("grammar command name cannot be empty")]
    EmptyCommandName,
    /// A node in the scope at `path` has an empty name.
    #[error("empty node name at {path}")]
    EmptyNodeName { path: String },
    /// Two sibling nodes share a trigger spelling and the same `requires`
    /// sentence.
    #[error("ambiguous sibling node {name:?} at {path}")]
    AmbiguousNode { path: String, name: String },
    /// An argument slot has an empty name.
    #[error("empty argument name at {path}")]
    EmptyArgName { path: String },
    /// Two argument slots in one Args share a name.
    #[error("duplicate argument {name:?} at {path}")]
    DuplicateArg { path: String, name: String },
    /// More than one variadic slot in one Args.
    #[error("multiple variadic arguments at {path}")]
    MultipleVariadic { path: String },
    /// A rest slot is not the final slot of its Args.
    #[error("rest argument must be last at {path}")]
    RestNotLast { path: String },
}

/// Validates a command grammar.
///
/// Returns all structural errors found, or an empty vector for a
/// well-formed grammar. Validation stops at the first error within each
/// scope but continues across scopes.
pub fn validate_grammar(grammar: &CommandGrammar) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if grammar.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    let mut path = vec![grammar.name.clone()];
    errors.extend(validate_args(&grammar.args, &path));
    errors.extend(validate_scope(&grammar.nodes, &mut path));
    errors
}

fn validate_scope(nodes: &[CommandNode], path: &mut Vec<String>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let here = path.join(" ");

    // (trigger, sorted requires) pairs must be unique within one scope
    let mut seen: HashSet<(String, Vec<String>)> = HashSet::new();
    for node in nodes {
        if node.name().trim().is_empty() {
            errors.push(ValidationError::EmptyNodeName { path: here.clone() });
            return errors;
        }

        let mut requires: Vec<String> = node.requires().to_vec();
        requires.sort();
        for trigger in node.trigger_names() {
            if !seen.insert((trigger.to_string(), requires.clone())) {
                errors.push(ValidationError::AmbiguousNode {
                    path: here.clone(),
                    name: trigger.to_string(),
                });
                return errors;
            }
        }
    }

    for node in nodes {
        path.push(node.name().to_string());
        errors.extend(validate_args(node.args(), path));
        if let CommandNode::Subcommand(sub) = node {
            errors.extend(validate_scope(&sub.children, path));
        }
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_args(args: &Args, path: &[String]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let here = path.join(" ");

    let mut seen: HashSet<&str> = HashSet::new();
    let mut variadics = 0usize;
    let last = args.len().saturating_sub(1);

    for (index, arg) in args.slots().iter().enumerate() {
        if arg.name.trim().is_empty() {
            errors.push(ValidationError::EmptyArgName { path: here.clone() });
            return errors;
        }
        if !seen.insert(arg.name.as_str()) {
            errors.push(ValidationError::DuplicateArg {
                path: here.clone(),
                name: arg.name.clone(),
            });
            return errors;
        }
        if matches!(
            arg.cardinality,
            Cardinality::Variadic { .. } | Cardinality::VariadicKeyValue { .. },
        ) {
            variadics += 1;
            if variadics > 1 {
                errors.push(ValidationError::MultipleVariadic { path: here.clone() });
                return errors;
            }
        }
        if arg.pattern.is_rest() && index != last {
            errors.push(ValidationError::RestNotLast { path: here.clone() });
            return errors;
        }
    }

    errors
}
