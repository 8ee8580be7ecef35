//! Grammar metadata and parser configuration.
//!
//! Both types are plain immutable values resolved by the caller before
//! construction; the core never reads external configuration sources.

use serde::{Deserialize, Serialize};

/// Descriptive and behavioral metadata attached to a grammar.
///
/// # Examples
///
/// ```
/// use command_grammar_core::CommandMeta;
///
/// let meta = CommandMeta::default();
/// assert!(!meta.fuzzy_match);
/// assert_eq!(meta.fuzzy_threshold, 2);
/// assert!(!meta.strict);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMeta {
    /// Short description for external help rendering.
    pub description: Option<String>,
    /// Usage line for external help rendering.
    pub usage: Option<String>,
    /// Example invocation for external help rendering.
    pub example: Option<String>,
    /// Enable fuzzy header suggestions on mismatch.
    pub fuzzy_match: bool,
    /// Maximum edit distance for a fuzzy suggestion.
    pub fuzzy_threshold: usize,
    /// Surface top-level failures as `Err` instead of a non-matched result.
    pub strict: bool,
    /// Record unrecognized trailing tokens instead of failing.
    pub allow_extra: bool,
}

impl Default for CommandMeta {
    fn default() -> Self {
        Self {
            description: None,
            usage: None,
            example: None,
            fuzzy_match: false,
            fuzzy_threshold: 2,
            strict: false,
            allow_extra: false,
        }
    }
}

/// Tokenization and interaction defaults for one grammar.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParserConfig;
///
/// let config = ParserConfig::default();
/// assert_eq!(config.separators, vec![' ']);
/// assert_eq!(config.completion_triggers, vec!["?".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Characters that split raw text into tokens.
    pub separators: Vec<char>,
    /// Tokens that pause an interactive parse for completion.
    pub completion_triggers: Vec<String>,
    /// Aliases always offered as completion candidates.
    pub help_triggers: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            separators: vec![' '],
            completion_triggers: vec!["?".to_string()],
            help_triggers: vec!["--help".to_string(), "-h".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_defaults() {
        let meta = CommandMeta::default();
        assert!(!meta.strict);
        assert!(!meta.allow_extra);
        assert_eq!(meta.fuzzy_threshold, 2);
    }

    #[test]
    fn test_config_defaults() {
        let config = ParserConfig::default();
        assert!(config.separators.contains(&' '));
        assert!(config.help_triggers.contains(&"--help".to_string()));
    }
}
