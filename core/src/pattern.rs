//! Typed token patterns: match rule + converter + validator.
//!
//! A [`Pattern`] decides whether a [`Token`] is acceptable and, if so, what
//! typed [`Value`] it converts to. Patterns compose: an ordered pre-chain of
//! patterns can transform the token before the main rule runs, a validator
//! can reject converted values, and the `anti` flag negates the final
//! outcome ("anything but this").
//!
//! Matching is total: failure is the plain [`MatchFailure`] value, never a
//! panic. Callers interpret a failure as "not matched" and fall back to
//! default/optional-skip logic.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::{Pattern, Token, Value};
//!
//! let int = Pattern::int();
//! assert_eq!(int.match_token(&Token::text("42")), Ok(Value::Int(42)));
//! assert!(int.match_token(&Token::text("forty-two")).is_err());
//!
//! // "anything but an int"
//! let not_int = Pattern::int().negate();
//! assert!(not_int.match_token(&Token::text("42")).is_err());
//! assert_eq!(
//!     not_int.match_token(&Token::text("word")),
//!     Ok(Value::Str("word".into())),
//! );
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::{Token, Value};

/// Converter closure: raw text to a typed value, `None` on conversion failure.
pub type Converter = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Validator closure: rejects converted values it returns `false` for.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Arbitrary token predicate used by [`Pattern::predicate`].
pub type TokenPredicate = Arc<dyn Fn(&Token) -> bool + Send + Sync>;

/// A pattern rejected a token.
///
/// Carries the pattern name and a display rendering of the offending token.
/// This is a value, not a fault: the engine treats it as "not matched" and
/// backtracks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern {pattern:?} rejected token {token:?}")]
pub struct MatchFailure {
    /// Name of the rejecting pattern.
    pub pattern: String,
    /// Display rendering of the rejected token.
    pub token: String,
}

/// How a pattern decides whether a token is acceptable.
#[derive(Clone)]
enum MatchRule {
    /// Accepts any token (text or object).
    Any,
    /// Accepts any text token.
    AnyText,
    /// Full-token regex match over text tokens.
    Regex { full: Regex, source: String },
    /// Accepts tokens whose text renders equal to one of the given values.
    Exact(Vec<Value>),
    /// Arbitrary token predicate.
    Predicate(TokenPredicate),
    /// Accepts object tokens of the given kind.
    ObjectKind(String),
    /// Marker rule: the engine drains the entire remaining buffer.
    Rest,
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Any => write!(f, "Any"),
            MatchRule::AnyText => write!(f, "AnyText"),
            MatchRule::Regex { source, .. } => write!(f, "Regex({source:?})"),
            MatchRule::Exact(values) => write!(f, "Exact({values:?})"),
            MatchRule::Predicate(_) => write!(f, "Predicate(..)"),
            MatchRule::ObjectKind(kind) => write!(f, "ObjectKind({kind:?})"),
            MatchRule::Rest => write!(f, "Rest"),
        }
    }
}

/// A typed matcher + converter + validator over single tokens.
#[derive(Clone)]
pub struct Pattern {
    name: String,
    rule: MatchRule,
    converter: Option<Converter>,
    validator: Option<Validator>,
    pre_chain: Vec<Pattern>,
    anti: bool,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("rule", &self.rule)
            .field("pre_chain", &self.pre_chain.len())
            .field("anti", &self.anti)
            .finish()
    }
}

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[+-]?\d+)$").expect("static regex must compile"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[+-]?\d+(?:\.\d+)?)$").expect("static regex must compile"));
static BOOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:true|false)$").expect("static regex must compile"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:https?://\S+)$").expect("static regex must compile"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\w.+-]+@[\w-]+(?:\.[\w-]+)+)$").expect("static regex must compile")
});
static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|1?\d?\d)){3})$")
        .expect("static regex must compile")
});

impl Pattern {
    fn new(name: &str, rule: MatchRule) -> Self {
        Self {
            name: name.to_string(),
            rule,
            converter: None,
            validator: None,
            pre_chain: Vec::new(),
            anti: false,
        }
    }

    /// Accepts any token and passes it through unconverted.
    pub fn any() -> Self {
        Self::new("any", MatchRule::Any)
    }

    /// Accepts any text token as a [`Value::Str`].
    pub fn str() -> Self {
        Self::new("str", MatchRule::AnyText)
    }

    /// Accepts integer literals, converting to [`Value::Int`].
    pub fn int() -> Self {
        Self::new(
            "int",
            MatchRule::Regex {
                full: INT_RE.clone(),
                source: r"[+-]?\d+".to_string(),
            },
        )
        .convert(|raw| raw.parse::<i64>().ok().map(Value::Int))
    }

    /// Accepts decimal literals, converting to [`Value::Float`].
    pub fn float() -> Self {
        Self::new(
            "float",
            MatchRule::Regex {
                full: FLOAT_RE.clone(),
                source: r"[+-]?\d+(?:\.\d+)?".to_string(),
            },
        )
        .convert(|raw| raw.parse::<f64>().ok().map(Value::Float))
    }

    /// Accepts `true`/`false` (case-insensitive), converting to [`Value::Bool`].
    pub fn bool() -> Self {
        Self::new(
            "bool",
            MatchRule::Regex {
                full: BOOL_RE.clone(),
                source: r"(?i:true|false)".to_string(),
            },
        )
        .convert(|raw| Some(Value::Bool(raw.eq_ignore_ascii_case("true"))))
    }

    /// Accepts `http`/`https` URLs.
    pub fn url() -> Self {
        Self::new(
            "url",
            MatchRule::Regex {
                full: URL_RE.clone(),
                source: r"https?://\S+".to_string(),
            },
        )
    }

    /// Accepts email addresses.
    pub fn email() -> Self {
        Self::new(
            "email",
            MatchRule::Regex {
                full: EMAIL_RE.clone(),
                source: r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+".to_string(),
            },
        )
    }

    /// Accepts dotted-quad IPv4 addresses.
    pub fn ipv4() -> Self {
        Self::new(
            "ipv4",
            MatchRule::Regex {
                full: IPV4_RE.clone(),
                source: r"(?:25[0-5]|2[0-4]\d|1?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|1?\d?\d)){3}"
                    .to_string(),
            },
        )
    }

    /// Accepts exactly the given value (compared by display rendering).
    pub fn literal(value: Value) -> Self {
        let name = value.to_string();
        Self::new(&name, MatchRule::Exact(vec![value]))
    }

    /// Accepts any of the given values.
    pub fn choice(values: Vec<Value>) -> Self {
        let name = values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("|");
        Self::new(&name, MatchRule::Exact(values))
    }

    /// Full-token regex pattern; the match is returned as [`Value::Str`].
    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        let full = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self::new(
            source,
            MatchRule::Regex {
                full,
                source: source.to_string(),
            },
        ))
    }

    /// Accepts tokens satisfying an arbitrary predicate.
    pub fn predicate(name: &str, pred: impl Fn(&Token) -> bool + Send + Sync + 'static) -> Self {
        Self::new(name, MatchRule::Predicate(Arc::new(pred)))
    }

    /// Accepts object units of the given kind.
    pub fn object(kind: &str) -> Self {
        Self::new(kind, MatchRule::ObjectKind(kind.to_string()))
    }

    /// Marker pattern: the bound slot drains the entire remaining buffer.
    ///
    /// Grammar validation requires a rest slot to be the final one in its
    /// [`Args`](crate::Args).
    pub fn rest() -> Self {
        Self::new("rest", MatchRule::Rest)
    }

    /// Resolves a builtin pattern by its textual name.
    ///
    /// Used by grammar definition files and header placeholders.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::Pattern;
    ///
    /// assert!(Pattern::builtin("int").is_some());
    /// assert!(Pattern::builtin("no_such_pattern").is_none());
    /// ```
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Self::any()),
            "str" => Some(Self::str()),
            "int" => Some(Self::int()),
            "float" => Some(Self::float()),
            "bool" => Some(Self::bool()),
            "url" => Some(Self::url()),
            "email" => Some(Self::email()),
            "ipv4" => Some(Self::ipv4()),
            "rest" => Some(Self::rest()),
            _ => None,
        }
    }

    /// Appends a pattern to the pre-chain.
    ///
    /// Pre-chain patterns transform the token in order before this pattern's
    /// own rule runs; any pre-chain failure fails the whole match.
    pub fn chain(mut self, pre: Pattern) -> Self {
        self.pre_chain.push(pre);
        self
    }

    /// Toggles the `anti` flag, negating the final match outcome.
    pub fn negate(mut self) -> Self {
        self.anti = !self.anti;
        self
    }

    /// Sets the converter applied to the matched text.
    pub fn convert(mut self, conv: impl Fn(&str) -> Option<Value> + Send + Sync + 'static) -> Self {
        self.converter = Some(Arc::new(conv));
        self
    }

    /// Sets a validator applied to the converted value.
    pub fn validate(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(check));
        self
    }

    /// Renames the pattern (used in failure messages and hints).
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// The pattern's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the buffer-draining rest marker.
    pub fn is_rest(&self) -> bool {
        matches!(self.rule, MatchRule::Rest)
    }

    /// The exact-value choices, when this pattern is an exact-set rule.
    ///
    /// Completion derives literal candidate hints from these.
    pub fn literal_choices(&self) -> Option<&[Value]> {
        match &self.rule {
            MatchRule::Exact(values) => Some(values),
            _ => None,
        }
    }

    /// The unanchored regex source, when this pattern is a regex rule.
    ///
    /// Header placeholders embed this source as a named capture group.
    pub fn rule_source(&self) -> Option<&str> {
        match &self.rule {
            MatchRule::Regex { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Converts raw captured text through this pattern's converter.
    ///
    /// Used for header capture groups, which are matched by the embedding
    /// regex rather than by [`match_token`](Pattern::match_token).
    pub fn convert_raw(&self, raw: &str) -> Option<Value> {
        match &self.converter {
            Some(conv) => conv(raw),
            None => Some(Value::Str(raw.to_string())),
        }
    }

    fn failure(&self, token: &Token) -> MatchFailure {
        MatchFailure {
            pattern: self.name.clone(),
            token: token.display(),
        }
    }

    /// Matches a token: pre-chain, then rule + converter, then validator,
    /// with `anti` negating the final outcome.
    ///
    /// An `anti` success returns the raw token as a value (text as
    /// [`Value::Str`], objects as [`Value::Object`]).
    pub fn match_token(&self, token: &Token) -> Result<Value, MatchFailure> {
        let outcome = self.match_plain(token);
        if self.anti {
            match outcome {
                Ok(_) => Err(self.failure(token)),
                Err(_) => Ok(raw_value(token)),
            }
        } else {
            outcome
        }
    }

    fn match_plain(&self, token: &Token) -> Result<Value, MatchFailure> {
        let mut current = token.clone();
        for pre in &self.pre_chain {
            let value = pre.match_token(&current)?;
            current = value_as_token(&value, &current);
        }

        let value = match &self.rule {
            MatchRule::Any | MatchRule::Rest => self.convert_text(&current, raw_value(&current))?,
            MatchRule::AnyText => {
                let text = current.as_text().ok_or_else(|| self.failure(token))?;
                self.convert_text(&current, Value::Str(text.to_string()))?
            }
            MatchRule::Regex { full, .. } => {
                let text = current.as_text().ok_or_else(|| self.failure(token))?;
                if !full.is_match(text) {
                    return Err(self.failure(token));
                }
                self.convert_text(&current, Value::Str(text.to_string()))?
            }
            MatchRule::Exact(values) => {
                let found = match &current {
                    Token::Text { text, .. } => {
                        values.iter().find(|v| &v.to_string() == text).cloned()
                    }
                    Token::Object(unit) => values
                        .iter()
                        .find(|v| matches!(v, Value::Object(u) if u == unit))
                        .cloned(),
                };
                found.ok_or_else(|| self.failure(token))?
            }
            MatchRule::Predicate(pred) => {
                if !pred(&current) {
                    return Err(self.failure(token));
                }
                self.convert_text(&current, raw_value(&current))?
            }
            MatchRule::ObjectKind(kind) => match &current {
                Token::Object(unit) if &unit.kind == kind => Value::Object(unit.clone()),
                _ => return Err(self.failure(token)),
            },
        };

        if let Some(check) = &self.validator {
            if !check(&value) {
                return Err(self.failure(token));
            }
        }
        Ok(value)
    }

    fn convert_text(&self, token: &Token, fallback: Value) -> Result<Value, MatchFailure> {
        match (&self.converter, token.as_text()) {
            (Some(conv), Some(text)) => conv(text).ok_or_else(|| self.failure(token)),
            _ => Ok(fallback),
        }
    }
}

fn raw_value(token: &Token) -> Value {
    match token {
        Token::Text { text, .. } => Value::Str(text.clone()),
        Token::Object(unit) => Value::Object(unit.clone()),
    }
}

fn value_as_token(value: &Value, original: &Token) -> Token {
    match value {
        Value::Str(s) => Token::Text {
            text: s.clone(),
            quoted: original.is_quoted(),
        },
        Value::Object(unit) => Token::Object(unit.clone()),
        other => Token::text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectUnit;

    #[test]
    fn test_int_converts_and_rejects() {
        let int = Pattern::int();
        assert_eq!(int.match_token(&Token::text("-7")), Ok(Value::Int(-7)));
        let err = int.match_token(&Token::text("x7")).unwrap_err();
        assert_eq!(err.pattern, "int");
        assert_eq!(err.token, "x7");
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        let b = Pattern::bool();
        assert_eq!(b.match_token(&Token::text("True")), Ok(Value::Bool(true)));
        assert_eq!(b.match_token(&Token::text("false")), Ok(Value::Bool(false)));
        assert!(b.match_token(&Token::text("yes")).is_err());
    }

    #[test]
    fn test_anti_negates_outcome() {
        let not_int = Pattern::int().negate();
        assert!(not_int.match_token(&Token::text("5")).is_err());
        assert_eq!(
            not_int.match_token(&Token::text("five")),
            Ok(Value::Str("five".into())),
        );
    }

    #[test]
    fn test_validator_rejects_converted_value() {
        let small = Pattern::int().validate(|v| v.as_int().is_some_and(|n| n < 100));
        assert_eq!(small.match_token(&Token::text("42")), Ok(Value::Int(42)));
        assert!(small.match_token(&Token::text("1000")).is_err());
    }

    #[test]
    fn test_pre_chain_transforms_before_rule() {
        // strip a leading '#' before matching as int
        let stripped = Pattern::str().convert(|raw| {
            Some(Value::Str(raw.trim_start_matches('#').to_string()))
        });
        let channel = Pattern::int().chain(stripped);
        assert_eq!(channel.match_token(&Token::text("#42")), Ok(Value::Int(42)));
        assert!(channel.match_token(&Token::text("#x")).is_err());
    }

    #[test]
    fn test_literal_matches_rendered_text() {
        let one = Pattern::literal(Value::Int(1));
        assert_eq!(one.match_token(&Token::text("1")), Ok(Value::Int(1)));
        assert!(one.match_token(&Token::text("2")).is_err());
    }

    #[test]
    fn test_object_kind_matching() {
        let image = Pattern::object("image");
        let unit = ObjectUnit::new("image", Value::Str("url".into()));
        assert_eq!(
            image.match_token(&Token::object(unit.clone())),
            Ok(Value::Object(unit)),
        );
        assert!(image.match_token(&Token::text("image")).is_err());
        let other = ObjectUnit::new("mention", Value::None);
        assert!(image.match_token(&Token::object(other)).is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        for name in ["any", "str", "int", "float", "bool", "url", "email", "ipv4", "rest"] {
            assert!(Pattern::builtin(name).is_some(), "missing builtin {name}");
        }
        assert!(Pattern::builtin("uuid").is_none());
    }

    #[test]
    fn test_regex_pattern_is_full_token() {
        let hex = Pattern::regex("[0-9a-f]+").unwrap();
        assert_eq!(
            hex.match_token(&Token::text("beef")),
            Ok(Value::Str("beef".into())),
        );
        assert!(hex.match_token(&Token::text("beefy!")).is_err());
    }
}
