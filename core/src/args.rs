//! Argument slots and cardinality.
//!
//! An [`Args`] is an ordered list of [`Arg`] slots, each bound to a
//! [`Pattern`], an optional default, and a [`Cardinality`]. Slots are
//! matched strictly left-to-right by the engine; a variadic slot always
//! leaves enough trailing tokens for the slots declared after it.

use crate::{Pattern, Value};

/// How many tokens a slot consumes and in what shape.
#[derive(Debug, Clone)]
pub enum Cardinality {
    /// Exactly one token.
    Single,
    /// Greedy run of tokens, bounded by the trailing-slot reservation.
    ///
    /// `min_one` requires at least one matched token.
    Variadic { min_one: bool },
    /// One `name<sep>value` token; the value part is converted by the
    /// slot's pattern.
    KeyValue { sep: char },
    /// Greedy run of `key<sep>value` tokens collected into a [`Value::Map`].
    VariadicKeyValue { sep: char },
}

/// One named, typed argument slot.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Arg, Pattern, Value};
///
/// let port = Arg::new("port", Pattern::int()).with_default(Value::Int(8080));
/// assert_eq!(port.name, "port");
/// assert!(port.default.is_some());
///
/// let files = Arg::new("files", Pattern::str()).variadic(true);
/// assert!(matches!(
///     files.cardinality,
///     command_grammar_core::Cardinality::Variadic { min_one: true },
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Arg {
    /// Slot name, the key under which the matched value is stored.
    pub name: String,
    /// Pattern deciding acceptance and conversion.
    pub pattern: Pattern,
    /// Token consumption shape.
    pub cardinality: Cardinality,
    /// Value substituted when the slot is truly absent.
    ///
    /// Never overrides a successfully matched value.
    pub default: Option<Value>,
    /// Whether absence without a default is acceptable.
    pub optional: bool,
    /// Help string for external rendering.
    pub help: Option<String>,
}

impl Arg {
    /// Creates a required single-token slot.
    pub fn new(name: &str, pattern: Pattern) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            cardinality: Cardinality::Single,
            default: None,
            optional: false,
            help: None,
        }
    }

    /// Makes the slot variadic; `min_one` requires at least one token.
    pub fn variadic(mut self, min_one: bool) -> Self {
        self.cardinality = Cardinality::Variadic { min_one };
        self
    }

    /// Makes the slot a `name<sep>value` keyword slot.
    pub fn key_value(mut self, sep: char) -> Self {
        self.cardinality = Cardinality::KeyValue { sep };
        self
    }

    /// Makes the slot collect every leading `key<sep>value` token.
    pub fn variadic_key_value(mut self, sep: char) -> Self {
        self.cardinality = Cardinality::VariadicKeyValue { sep };
        self
    }

    /// Sets the default applied on true absence.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the slot optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Adds a help string.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Whether absence of this slot is recoverable (optional or defaulted).
    pub fn skippable(&self) -> bool {
        self.optional || self.default.is_some()
    }
}

/// An ordered sequence of argument slots.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Arg, Args, Pattern};
///
/// let args = Args::new()
///     .add(Arg::new("name", Pattern::str()))
///     .add(Arg::new("count", Pattern::int()).optional());
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args {
    slots: Vec<Arg>,
}

impl Args {
    /// Creates an empty slot list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot.
    pub fn add(mut self, arg: Arg) -> Self {
        self.slots.push(arg);
        self
    }

    /// The slots in declaration order.
    pub fn slots(&self) -> &[Arg] {
        &self.slots
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
