//! Shortcut templates: registered aliases expanded into full command lines.
//!
//! A [`Shortcut`] maps a key to a command template. Template text may carry
//! indexed placeholders (`{%2}` or `{%1_2}`, the trailing number selecting
//! the 1-based suffix token) and a wildcard (`{*}` or `{*(SEP)}`) joining
//! every suffix token after the highest indexed one. Expansion is textual
//! and happens before parsing; a [`ShortcutTable`] resolves the first
//! whitespace token of a line as the key in a single pass, so expanded
//! output is never re-expanded.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use command_grammar_core::ParseError;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%(?:(\d+)_)?(\d+)\}").expect("static regex must compile"));
static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\*(?:\(([^)]*)\))?\}").expect("static regex must compile"));

/// One registered shortcut.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::Shortcut;
///
/// let eat = Shortcut::new("eat", "food {%1}");
/// assert_eq!(eat.expand(&["apple"]).unwrap(), "food apple");
/// ```
#[derive(Debug, Clone)]
pub struct Shortcut {
    key: String,
    command: String,
    args: Vec<String>,
    fuzzy: bool,
}

impl Shortcut {
    /// Creates a shortcut mapping `key` to the given command template.
    pub fn new(key: &str, command: &str) -> Self {
        Self {
            key: key.to_string(),
            command: command.to_string(),
            args: Vec::new(),
            fuzzy: false,
        }
    }

    /// Appends a fixed argument to every expansion.
    pub fn with_arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Permits unconsumed suffix tokens, appending them to the expansion.
    pub fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    /// The shortcut's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Expands the template against the suffix tokens that followed the key.
    ///
    /// # Errors
    ///
    /// [`ParseError::ReservedSuffix`] when the template carries no
    /// placeholders, the shortcut is not fuzzy, and a suffix was given.
    pub fn expand(&self, suffix: &[&str]) -> Result<String, ParseError> {
        let has_placeholders =
            TOKEN_RE.is_match(&self.command) || WILDCARD_RE.is_match(&self.command);
        if !has_placeholders && !self.fuzzy && !suffix.is_empty() {
            return Err(ParseError::ReservedSuffix {
                suffix: suffix.join(" "),
            });
        }

        // highest 1-based suffix index any placeholder consumed
        let mut consumed = 0usize;
        let indexed = TOKEN_RE.replace_all(&self.command, |caps: &regex::Captures| {
            let index: usize = caps[2].parse().unwrap_or(0);
            if index == 0 {
                return String::new();
            }
            consumed = consumed.max(index);
            suffix
                .get(index - 1)
                .map(|token| token.to_string())
                .unwrap_or_default()
        });

        let mut wildcard_used = false;
        let expanded = WILDCARD_RE.replace_all(&indexed, |caps: &regex::Captures| {
            wildcard_used = true;
            let sep = caps.get(1).map_or(" ", |m| m.as_str());
            suffix.get(consumed..).unwrap_or_default().join(sep)
        });

        let mut out = expanded.into_owned();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        if self.fuzzy && !wildcard_used {
            for token in suffix.iter().skip(consumed) {
                out.push(' ');
                out.push_str(token);
            }
        }
        Ok(out)
    }
}

/// An ordered shortcut registry.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::{Shortcut, ShortcutTable};
///
/// let mut table = ShortcutTable::new();
/// table.add(Shortcut::new("st", "git status"));
/// assert_eq!(
///     table.expand_line("st").unwrap(),
///     Some("git status".to_string()),
/// );
/// assert_eq!(table.expand_line("unrelated").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShortcutTable {
    entries: Vec<Shortcut>,
}

impl ShortcutTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shortcut; a later entry with the same key shadows an
    /// earlier one.
    pub fn add(&mut self, shortcut: Shortcut) {
        self.entries.insert(0, shortcut);
    }

    /// Removes every shortcut with the given key.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|s| s.key != key);
    }

    /// Looks up the shortcut a key resolves to.
    pub fn find(&self, key: &str) -> Option<&Shortcut> {
        self.entries.iter().find(|s| s.key == key)
    }

    /// Expands a whole input line whose first whitespace token is a key.
    ///
    /// Returns `Ok(None)` when no shortcut is registered under that key.
    /// Expansion is a single pass; keys appearing in expanded output are
    /// left alone.
    pub fn expand_line(&self, line: &str) -> Result<Option<String>, ParseError> {
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            return Ok(None);
        };
        let Some(shortcut) = self.find(key) else {
            return Ok(None);
        };
        let suffix: Vec<&str> = parts.collect();
        let expanded = shortcut.expand(&suffix)?;
        debug!(key = %key, expanded = %expanded, "shortcut expanded");
        Ok(Some(expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_placeholders_concatenate() {
        let s = Shortcut::new("k", "{%1_1}{%1_2}");
        assert_eq!(s.expand(&["a", "b"]).unwrap(), "ab");
    }

    #[test]
    fn test_wildcard_joins_with_default_separator() {
        let s = Shortcut::new("k", "{*( )}");
        assert_eq!(s.expand(&["a", "b", "c"]).unwrap(), "a b c");
        let bare = Shortcut::new("k", "{*}");
        assert_eq!(bare.expand(&["a", "b", "c"]).unwrap(), "a b c");
    }

    #[test]
    fn test_wildcard_custom_separator() {
        let s = Shortcut::new("k", "join {*(,)}");
        assert_eq!(s.expand(&["a", "b", "c"]).unwrap(), "join a,b,c");
    }

    #[test]
    fn test_wildcard_skips_indexed_tokens() {
        let s = Shortcut::new("k", "cmd {%2} {*}");
        assert_eq!(s.expand(&["a", "b", "c", "d"]).unwrap(), "cmd b c d");
    }

    #[test]
    fn test_out_of_range_placeholder_is_empty() {
        let s = Shortcut::new("k", "cmd [{%5}]");
        assert_eq!(s.expand(&["a"]).unwrap(), "cmd []");
    }

    #[test]
    fn test_reserved_suffix_without_placeholders() {
        let s = Shortcut::new("k", "git status");
        assert_eq!(
            s.expand(&["extra"]),
            Err(ParseError::ReservedSuffix {
                suffix: "extra".into(),
            }),
        );
        assert_eq!(s.expand(&[]).unwrap(), "git status");
    }

    #[test]
    fn test_fuzzy_appends_unconsumed_tokens() {
        let s = Shortcut::new("k", "git log").fuzzy();
        assert_eq!(s.expand(&["--oneline"]).unwrap(), "git log --oneline");

        let indexed = Shortcut::new("k", "take {%1}").fuzzy();
        assert_eq!(indexed.expand(&["a", "b", "c"]).unwrap(), "take a b c");
    }

    #[test]
    fn test_fixed_args_appended() {
        let s = Shortcut::new("k", "git log").with_arg("--graph");
        assert_eq!(s.expand(&[]).unwrap(), "git log --graph");
    }

    #[test]
    fn test_expand_line_is_single_pass() {
        let mut table = ShortcutTable::new();
        table.add(Shortcut::new("a", "b x"));
        table.add(Shortcut::new("b", "z"));
        // the "b" in "a"'s expansion is not re-expanded
        assert_eq!(table.expand_line("a").unwrap(), Some("b x".to_string()));
        assert_eq!(table.expand_line("b").unwrap(), Some("z".to_string()));
    }

    #[test]
    fn test_later_registration_shadows_earlier() {
        let mut table = ShortcutTable::new();
        table.add(Shortcut::new("st", "git status"));
        table.add(Shortcut::new("st", "svn status"));
        assert_eq!(
            table.expand_line("st").unwrap(),
            Some("svn status".to_string()),
        );
        table.remove("st");
        assert_eq!(table.expand_line("st").unwrap(), None);
    }
}
