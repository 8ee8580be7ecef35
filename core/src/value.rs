//! Input units and typed values.
//!
//! This module defines the two sides of the conversion boundary: [`Token`],
//! one atomic unit of raw input (a text word or an opaque non-text marker),
//! and [`Value`], the typed data a [`Pattern`](crate::Pattern) produces from
//! it. [`RawInput`] is the parse entry type: either a plain string or an
//! already-ordered unit sequence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque non-text input unit.
///
/// Carries a `kind` tag (e.g. `"mention"`, `"image"`) and an arbitrary
/// payload. Object units pass through text splitting untouched and are only
/// matched by kind-aware patterns.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{ObjectUnit, Value};
///
/// let unit = ObjectUnit::new("mention", Value::Str("12345".into()));
/// assert_eq!(unit.kind, "mention");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUnit {
    /// Kind tag used for pattern matching.
    pub kind: String,
    /// Arbitrary payload carried through parsing unchanged. Boxed because
    /// a [`Value`] can itself hold an object unit.
    pub payload: Box<Value>,
}

impl ObjectUnit {
    /// Creates an object unit with the given kind and payload.
    pub fn new(kind: &str, payload: Value) -> Self {
        Self {
            kind: kind.to_string(),
            payload: Box::new(payload),
        }
    }
}

/// One atomic unit of input.
///
/// Produced by splitting raw text on the configured separators (respecting
/// quotes), or supplied directly when the caller already has a unit sequence.
/// Quoted text units are atomic: they are never re-split and are exempt from
/// compact fusion splitting.
///
/// # Examples
///
/// ```
/// use command_grammar_core::Token;
///
/// let word = Token::text("hello");
/// assert_eq!(word.as_text(), Some("hello"));
///
/// let quoted = Token::quoted("hello world");
/// assert!(quoted.is_quoted());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A text word; `quoted` marks quote-delimited spans.
    Text { text: String, quoted: bool },
    /// An opaque non-text unit.
    Object(ObjectUnit),
}

impl Token {
    /// Creates an unquoted text token.
    pub fn text(text: &str) -> Self {
        Token::Text {
            text: text.to_string(),
            quoted: false,
        }
    }

    /// Creates a quoted text token (atomic, exempt from re-splitting).
    pub fn quoted(text: &str) -> Self {
        Token::Text {
            text: text.to_string(),
            quoted: true,
        }
    }

    /// Creates an object token.
    pub fn object(unit: ObjectUnit) -> Self {
        Token::Object(unit)
    }

    /// Returns the text content, or `None` for object tokens.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text { text, .. } => Some(text),
            Token::Object(_) => None,
        }
    }

    /// Whether this token is a quote-delimited text span.
    pub fn is_quoted(&self) -> bool {
        matches!(self, Token::Text { quoted: true, .. })
    }

    /// A display rendering used in error messages and reconstruction.
    pub fn display(&self) -> String {
        match self {
            Token::Text { text, .. } => text.clone(),
            Token::Object(unit) => format!("<{}>", unit.kind),
        }
    }
}

/// A typed value produced by pattern conversion.
///
/// `None` is an explicit null; [`Value::Present`] is the distinguished
/// "occurred, but carries no payload" sentinel written by bare `store`
/// actions. The two are never conflated: a query returning
/// `Some(Value::None)` means the slot exists and holds null, while a query
/// returning `Option::None` means the slot does not exist at all.
///
/// # Examples
///
/// ```
/// use command_grammar_core::Value;
///
/// let v = Value::Int(42);
/// assert_eq!(v.as_int(), Some(42));
/// assert_eq!(v.as_str(), None);
///
/// assert_ne!(Value::Present, Value::None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// Explicit null.
    #[default]
    None,
    /// "Occurred with no payload" sentinel, distinct from [`Value::None`].
    Present,
    /// Text value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Name-keyed map of values.
    Map(BTreeMap<String, Value>),
    /// An object unit carried through conversion.
    Object(ObjectUnit),
}

impl Value {
    /// Returns the string content if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float content if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean content if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list content if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map content if this is a `Map`.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Converts to a [`serde_json::Value`] for external output.
    ///
    /// `None` maps to JSON null, `Present` to the string `"..."` (the
    /// conventional sentinel rendering), objects to
    /// `{"kind": ..., "payload": ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::None => serde_json::Value::Null,
            Value::Present => serde_json::Value::String("...".to_string()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(unit) => serde_json::json!({
                "kind": unit.kind,
                "payload": unit.payload.to_json(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "null"),
            Value::Present => write!(f, "..."),
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(unit) => write!(f, "<{}>", unit.kind),
        }
    }
}

/// Raw input accepted by the parse entry point.
///
/// Either a plain string, split by the grammar's separators, or an ordered
/// sequence of heterogeneous atomic units supplied by the caller (e.g. a
/// message segment pipeline mixing words and attachments).
///
/// # Examples
///
/// ```
/// use command_grammar_core::{RawInput, Token};
///
/// let from_str: RawInput = "deploy --env prod".into();
/// let from_units: RawInput = vec![Token::text("deploy")].into();
/// assert!(matches!(from_str, RawInput::Text(_)));
/// assert!(matches!(from_units, RawInput::Units(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Plain text, split by the active separator set.
    Text(String),
    /// An already-ordered unit sequence.
    Units(Vec<Token>),
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Text(text.to_string())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Text(text)
    }
}

impl From<Vec<Token>> for RawInput {
    fn from(units: Vec<Token>) -> Self {
        RawInput::Units(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_is_distinct_from_none() {
        assert_ne!(Value::Present, Value::None);
        assert_eq!(Value::Present.to_json(), serde_json::json!("..."));
        assert_eq!(Value::None.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Str("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(7).as_str(), None);
    }

    #[test]
    fn test_token_text_and_quoting() {
        let plain = Token::text("word");
        assert_eq!(plain.as_text(), Some("word"));
        assert!(!plain.is_quoted());

        let quoted = Token::quoted("two words");
        assert!(quoted.is_quoted());
        assert_eq!(quoted.as_text(), Some("two words"));
    }

    #[test]
    fn test_object_token_has_no_text() {
        let token = Token::object(ObjectUnit::new("image", Value::Str("url".into())));
        assert_eq!(token.as_text(), None);
        assert_eq!(token.display(), "<image>");
    }

    #[test]
    fn test_object_units_nest_through_values() {
        let inner = ObjectUnit::new("image", Value::Str("url".into()));
        let outer = Value::Object(ObjectUnit::new("attachment", Value::Object(inner)));
        assert_eq!(
            outer.to_json(),
            serde_json::json!({
                "kind": "attachment",
                "payload": {"kind": "image", "payload": "url"},
            }),
        );
    }

    #[test]
    fn test_value_display() {
        let list = Value::List(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(list.to_string(), "[1, a]");
    }
}
