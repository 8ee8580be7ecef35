//! Merge semantics for repeated option/subcommand occurrences.
//!
//! An [`Action`] decides how a node's stored value evolves when the node
//! occurs more than once in a single parse pass. [`Action::merge`] is pure:
//! given the previously stored value (if any) and the newly parsed Args
//! tuple (if the node binds any Args), it returns the new stored value. It
//! is invoked exactly once per occurrence.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::{Action, Value};
//!
//! // -v -v -v
//! let count = Action::Count;
//! let mut stored = None;
//! for _ in 0..3 {
//!     stored = Some(count.merge(stored, None));
//! }
//! assert_eq!(stored, Some(Value::Int(3)));
//! ```

use crate::Value;

/// Accumulation/overwrite policy for repeated node occurrences.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Action {
    /// Store the parsed tuple, or the [`Value::Present`] sentinel when the
    /// node binds no Args. Newest occurrence replaces.
    #[default]
    Store,
    /// Store a fixed literal; with Args, the parsed tuple replaces it.
    StoreValue(Value),
    /// Append the sentinel (or parsed tuple) to a growing list.
    Append,
    /// Append a fixed literal (or parsed tuple) to a growing list.
    AppendValue(Value),
    /// Increment an integer; with Args, the parsed tuple replaces it.
    Count,
}

impl Action {
    /// `store_value(true)` shorthand.
    pub fn store_true() -> Self {
        Action::StoreValue(Value::Bool(true))
    }

    /// `store_value(false)` shorthand.
    pub fn store_false() -> Self {
        Action::StoreValue(Value::Bool(false))
    }

    /// Whether this action appends instead of replacing.
    pub fn is_append(&self) -> bool {
        matches!(self, Action::Append | Action::AppendValue(_))
    }

    /// Merges one occurrence into the stored value.
    ///
    /// `parsed` is `Some` when the node binds non-empty Args (the parsed
    /// tuple, typically a [`Value::Map`]) and `None` for a bare occurrence.
    pub fn merge(&self, previous: Option<Value>, parsed: Option<Value>) -> Value {
        match (self, parsed) {
            // Bare occurrences: write sentinels/literals, count up.
            (Action::Store, None) => Value::Present,
            (Action::StoreValue(v), None) => v.clone(),
            (Action::Append, None) => push(previous, Value::Present),
            (Action::AppendValue(v), None) => push(previous, v.clone()),
            (Action::Count, None) => {
                let n = previous.and_then(|v| v.as_int()).unwrap_or(0);
                Value::Int(n + 1)
            }
            // Occurrences with parsed Args: store family replaces, append
            // family retains prior entries.
            (Action::Store | Action::StoreValue(_) | Action::Count, Some(tuple)) => tuple,
            (Action::Append | Action::AppendValue(_), Some(tuple)) => push(previous, tuple),
        }
    }
}

fn push(previous: Option<Value>, item: Value) -> Value {
    let mut items = match previous {
        Some(Value::List(items)) => items,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    items.push(item);
    Value::List(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn tuple(key: &str, value: Value) -> Value {
        let mut map = BTreeMap::new();
        map.insert(key.to_string(), value);
        Value::Map(map)
    }

    #[test]
    fn test_store_writes_sentinel_without_args() {
        assert_eq!(Action::Store.merge(None, None), Value::Present);
        assert_eq!(Action::Store.merge(Some(Value::Present), None), Value::Present);
    }

    #[test]
    fn test_store_value_writes_literal() {
        assert_eq!(Action::store_true().merge(None, None), Value::Bool(true));
        assert_eq!(Action::store_false().merge(None, None), Value::Bool(false));
    }

    #[test]
    fn test_count_increments_per_occurrence() {
        let mut stored = None;
        for _ in 0..3 {
            stored = Some(Action::Count.merge(stored, None));
        }
        assert_eq!(stored, Some(Value::Int(3)));
    }

    #[test]
    fn test_append_value_grows_list() {
        let lit = Value::Str("L".into());
        let action = Action::AppendValue(lit.clone());
        let first = action.merge(None, None);
        let second = action.merge(Some(first), None);
        assert_eq!(second, Value::List(vec![lit.clone(), lit]));
    }

    #[test]
    fn test_store_with_args_replaces() {
        let first = Action::Store.merge(None, Some(tuple("n", Value::Int(1))));
        let second = Action::Store.merge(Some(first), Some(tuple("n", Value::Int(2))));
        assert_eq!(second, tuple("n", Value::Int(2)));
    }

    #[test]
    fn test_append_with_args_retains_prior_tuples() {
        let first = Action::Append.merge(None, Some(tuple("n", Value::Int(1))));
        let second = Action::Append.merge(Some(first), Some(tuple("n", Value::Int(2))));
        assert_eq!(
            second,
            Value::List(vec![tuple("n", Value::Int(1)), tuple("n", Value::Int(2))]),
        );
    }
}
