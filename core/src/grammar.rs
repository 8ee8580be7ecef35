//! The root grammar object.

use crate::{Args, CommandMeta, CommandNode, OptionSpec, ParserConfig, SubcommandSpec};

/// A complete command grammar: header candidates, root Args, node tree,
/// metadata, and parser configuration.
///
/// Built once, then immutable for the lifetime of all parses; safely shared
/// across threads by independent parse calls.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let grammar = CommandGrammar::new("deploy")
///     .with_prefix("/")
///     .with_args(Args::new().add(Arg::new("target", Pattern::str())))
///     .with_option(OptionSpec::new("--env").with_alias("-e")
///         .with_args(Args::new().add(Arg::new("name", Pattern::str()))));
///
/// assert_eq!(grammar.name, "deploy");
/// assert_eq!(grammar.nodes.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CommandGrammar {
    /// Command name; may carry `{ident:pat}` placeholders.
    pub name: String,
    /// Text prefixes crossed with the name to form header candidates.
    pub prefixes: Vec<String>,
    /// Object kinds accepted as a detached leading prefix unit.
    pub object_prefixes: Vec<String>,
    /// The command's own positional argument slots.
    pub args: Args,
    /// Root-level options and subcommands.
    pub nodes: Vec<CommandNode>,
    /// Descriptive and behavioral metadata.
    pub meta: CommandMeta,
    /// Tokenization and interaction defaults.
    pub config: ParserConfig,
}

impl CommandGrammar {
    /// Creates a grammar with the given command name and default
    /// metadata/configuration.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefixes: Vec::new(),
            object_prefixes: Vec::new(),
            args: Args::new(),
            nodes: Vec::new(),
            meta: CommandMeta::default(),
            config: ParserConfig::default(),
        }
    }

    /// Adds a header prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefixes.push(prefix.to_string());
        self
    }

    /// Adds an object kind accepted as a detached header prefix.
    pub fn with_object_prefix(mut self, kind: &str) -> Self {
        self.object_prefixes.push(kind.to_string());
        self
    }

    /// Binds the command's own positional Args.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Adds a root-level option.
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.nodes.push(CommandNode::Option(option));
        self
    }

    /// Adds a root-level subcommand.
    pub fn with_subcommand(mut self, sub: SubcommandSpec) -> Self {
        self.nodes.push(CommandNode::Subcommand(sub));
        self
    }

    /// Sets the metadata.
    pub fn with_meta(mut self, meta: CommandMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the parser configuration.
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Finds a root-level node by name or alias.
    pub fn find_node(&self, name: &str) -> Option<&CommandNode> {
        self.nodes
            .iter()
            .find(|n| n.trigger_names().any(|t| t == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_node_by_alias() {
        let grammar = CommandGrammar::new("app")
            .with_option(OptionSpec::new("--verbose").with_alias("-v"))
            .with_subcommand(SubcommandSpec::new("remote").with_alias("r"));

        assert!(grammar.find_node("-v").is_some());
        assert!(grammar.find_node("r").is_some());
        assert!(grammar.find_node("missing").is_none());
    }
}
