//! Per-parse result types and the dotted-path query surface.
//!
//! A [`ParseResult`] is created fresh per parse call and owned exclusively
//! by that call. Values are queried by dotted path (`"sub.opt.arg"`); a
//! query returning `None` means "not found", while `Some(Value::None)` is a
//! present explicit null — the two are never conflated.

use std::collections::BTreeMap;

use crate::{Behavior, BehaviorControl, ParseError, Token, Value};

/// Header match outcome.
///
/// `groups` holds the type-converted named captures of a patterned header
/// candidate; plain literal candidates produce no groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeadMatch {
    /// Whether the leading text matched a candidate.
    pub matched: bool,
    /// The original leading text (or object display) that was examined.
    pub origin: String,
    /// Converted named capture groups.
    pub groups: BTreeMap<String, Value>,
}

/// Result of one matched option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionResult {
    /// Value produced by the option's action; [`Value::Present`] for a bare
    /// `store` occurrence.
    pub value: Value,
    /// The newest parsed Args tuple.
    pub args: BTreeMap<String, Value>,
}

impl OptionResult {
    fn query(&self, path: &[&str]) -> Option<&Value> {
        match path {
            [] => Some(&self.value),
            ["value"] => Some(&self.value),
            [arg] => self.args.get(*arg),
            _ => None,
        }
    }
}

/// Result of one matched subcommand, including its nested components.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandResult {
    /// Value produced by the subcommand's action.
    pub value: Value,
    /// The newest parsed Args tuple.
    pub args: BTreeMap<String, Value>,
    /// Matched child options, keyed by canonical name.
    pub options: BTreeMap<String, OptionResult>,
    /// Matched nested subcommands, keyed by canonical name.
    pub subcommands: BTreeMap<String, SubcommandResult>,
}

impl SubcommandResult {
    fn query(&self, path: &[&str]) -> Option<&Value> {
        match path {
            [] => Some(&self.value),
            ["value"] => Some(&self.value),
            [head, rest @ ..] => {
                if let Some(opt) = self.options.get(*head) {
                    return opt.query(rest);
                }
                if let Some(sub) = self.subcommands.get(*head) {
                    return sub.query(rest);
                }
                if rest.is_empty() {
                    return self.args.get(*head);
                }
                None
            }
        }
    }
}

/// The structured, path-queryable parse result.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{ParseResult, Value};
///
/// let result = ParseResult::default();
/// assert!(!result.matched);
/// assert_eq!(result.query("anything"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Whether the whole parse succeeded.
    pub matched: bool,
    /// The normalized unit sequence the parse consumed; re-parsing it under
    /// the same grammar reproduces an equal result mapping.
    pub origin: Vec<Token>,
    /// Header match outcome.
    pub head: HeadMatch,
    /// The command's own positional Args values.
    pub main_args: BTreeMap<String, Value>,
    /// Flattened union of every option/subcommand Args map.
    pub other_args: BTreeMap<String, Value>,
    /// Matched root-level options, keyed by canonical name.
    pub options: BTreeMap<String, OptionResult>,
    /// Matched root-level subcommands, keyed by canonical name.
    pub subcommands: BTreeMap<String, SubcommandResult>,
    /// Unrecognized tokens recorded under `allow_extra`.
    pub extras: Vec<Token>,
    /// Terminal error of a non-matched result.
    pub error: Option<ParseError>,
}

impl ParseResult {
    /// Flattens option and subcommand Args maps into `other_args`.
    ///
    /// Called by the engine once matching finishes; nested subcommand and
    /// sub-option Args are folded in depth-first, newest key winning.
    pub fn encapsulate(&mut self) {
        fn fold(into: &mut BTreeMap<String, Value>, sub: &SubcommandResult) {
            into.extend(sub.args.clone());
            for opt in sub.options.values() {
                into.extend(opt.args.clone());
            }
            for nested in sub.subcommands.values() {
                fold(into, nested);
            }
        }

        let mut flat = BTreeMap::new();
        for opt in self.options.values() {
            flat.extend(opt.args.clone());
        }
        for sub in self.subcommands.values() {
            fold(&mut flat, sub);
        }
        self.other_args = flat;
    }

    /// Queries a value by dotted path.
    ///
    /// A single segment resolves against main args, then flattened other
    /// args, then option values, then subcommand values. Multi-segment paths
    /// walk into components: `"opt.arg"`, `"opt.value"`, `"sub.opt.arg"`,
    /// and so on.
    pub fn query(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        match segments.as_slice() {
            [] => None,
            [single] => self
                .main_args
                .get(*single)
                .or_else(|| self.other_args.get(*single))
                .or_else(|| self.options.get(*single).map(|o| &o.value))
                .or_else(|| self.subcommands.get(*single).map(|s| &s.value)),
            [head, rest @ ..] => {
                if let Some(opt) = self.options.get(*head) {
                    return opt.query(rest);
                }
                if let Some(sub) = self.subcommands.get(*head) {
                    return sub.query(rest);
                }
                None
            }
        }
    }

    /// Whether a dotted path resolves to any value.
    pub fn find(&self, path: &str) -> bool {
        self.query(path).is_some()
    }

    /// Main and flattened other args merged into one map.
    pub fn all_args(&self) -> BTreeMap<String, Value> {
        let mut all = self.main_args.clone();
        all.extend(self.other_args.clone());
        all
    }

    /// Applies post-parse behaviors in order.
    ///
    /// [`BehaviorControl::Fail`] converts the result into a non-matched one
    /// carrying [`ParseError::OutOfBounds`] and stops the chain;
    /// [`BehaviorControl::Cancel`] skips only that behavior's effect.
    pub fn execute(mut self, behaviors: &[&dyn Behavior]) -> Self {
        for behavior in behaviors {
            let mut scratch = self.clone();
            match behavior.operate(&mut scratch) {
                BehaviorControl::Continue => self = scratch,
                BehaviorControl::Cancel => {}
                BehaviorControl::Fail(reason) => {
                    self.matched = false;
                    self.error = Some(ParseError::OutOfBounds { reason });
                    return self;
                }
            }
        }
        self
    }

    /// Renders the result for external output.
    pub fn to_json(&self) -> serde_json::Value {
        fn option_json(opt: &OptionResult) -> serde_json::Value {
            serde_json::json!({
                "value": opt.value.to_json(),
                "args": map_json(&opt.args),
            })
        }
        fn sub_json(sub: &SubcommandResult) -> serde_json::Value {
            serde_json::json!({
                "value": sub.value.to_json(),
                "args": map_json(&sub.args),
                "options": sub.options.iter()
                    .map(|(k, v)| (k.clone(), option_json(v)))
                    .collect::<serde_json::Map<_, _>>(),
                "subcommands": sub.subcommands.iter()
                    .map(|(k, v)| (k.clone(), sub_json(v)))
                    .collect::<serde_json::Map<_, _>>(),
            })
        }
        fn map_json(map: &BTreeMap<String, Value>) -> serde_json::Value {
            serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
        }

        serde_json::json!({
            "matched": self.matched,
            "head": {
                "matched": self.head.matched,
                "origin": self.head.origin,
                "groups": map_json(&self.head.groups),
            },
            "main_args": map_json(&self.main_args),
            "other_args": map_json(&self.other_args),
            "options": self.options.iter()
                .map(|(k, v)| (k.clone(), option_json(v)))
                .collect::<serde_json::Map<_, _>>(),
            "subcommands": self.subcommands.iter()
                .map(|(k, v)| (k.clone(), sub_json(v)))
                .collect::<serde_json::Map<_, _>>(),
            "extras": self.extras.iter().map(Token::display).collect::<Vec<_>>(),
            "error": self.error.as_ref().map(|e| e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseResult {
        let mut result = ParseResult {
            matched: true,
            ..Default::default()
        };
        result
            .main_args
            .insert("target".into(), Value::Str("prod".into()));
        result.options.insert(
            "--env".into(),
            OptionResult {
                value: Value::Present,
                args: BTreeMap::from([("name".into(), Value::Str("staging".into()))]),
            },
        );
        let sub_opt = OptionResult {
            value: Value::Present,
            args: BTreeMap::from([("count".into(), Value::Int(3))]),
        };
        result.subcommands.insert(
            "scale".into(),
            SubcommandResult {
                value: Value::Present,
                args: BTreeMap::from([("service".into(), Value::Str("web".into()))]),
                options: BTreeMap::from([("--replicas".into(), sub_opt)]),
                subcommands: BTreeMap::new(),
            },
        );
        result.encapsulate();
        result
    }

    #[test]
    fn test_query_single_segment_resolution_order() {
        let result = sample();
        assert_eq!(result.query("target"), Some(&Value::Str("prod".into())));
        // flattened other args
        assert_eq!(result.query("name"), Some(&Value::Str("staging".into())));
        // option value
        assert_eq!(result.query("--env"), Some(&Value::Present));
    }

    #[test]
    fn test_query_dotted_paths() {
        let result = sample();
        assert_eq!(
            result.query("--env.name"),
            Some(&Value::Str("staging".into())),
        );
        assert_eq!(result.query("--env.value"), Some(&Value::Present));
        assert_eq!(
            result.query("scale.service"),
            Some(&Value::Str("web".into())),
        );
        assert_eq!(result.query("scale.--replicas.count"), Some(&Value::Int(3)));
        assert_eq!(result.query("scale.--replicas.missing"), None);
    }

    #[test]
    fn test_absent_path_is_none_not_null() {
        let mut result = sample();
        result.main_args.insert("nothing".into(), Value::None);
        // present null vs not found
        assert_eq!(result.query("nothing"), Some(&Value::None));
        assert_eq!(result.query("nonexistent"), None);
        assert!(result.find("nothing"));
        assert!(!result.find("nonexistent"));
    }

    #[test]
    fn test_encapsulate_flattens_nested_args() {
        let result = sample();
        assert_eq!(result.other_args.get("count"), Some(&Value::Int(3)));
        assert_eq!(
            result.other_args.get("service"),
            Some(&Value::Str("web".into())),
        );
        let all = result.all_args();
        assert!(all.contains_key("target"));
        assert!(all.contains_key("count"));
    }

    #[test]
    fn test_execute_fail_converts_result() {
        let result = sample();
        let gate = |_: &mut ParseResult| BehaviorControl::Fail("quota".into());
        let failed = result.execute(&[&gate]);
        assert!(!failed.matched);
        assert_eq!(
            failed.error,
            Some(ParseError::OutOfBounds {
                reason: "quota".into(),
            }),
        );
    }

    #[test]
    fn test_execute_cancel_discards_effect() {
        let result = sample();
        let tamper = |r: &mut ParseResult| {
            r.main_args.clear();
            BehaviorControl::Cancel
        };
        let kept = result.execute(&[&tamper]);
        assert!(kept.main_args.contains_key("target"));
    }
}
