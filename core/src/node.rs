//! Grammar nodes: options and subcommands.
//!
//! Both node kinds share one capability set: a name plus aliases, bound
//! [`Args`], an [`Action`], a positional `requires` sentence, a priority for
//! overload resolution, and an optional compact flag. A [`SubcommandSpec`]
//! additionally owns children, which may themselves be options or nested
//! subcommands. [`CommandNode`] is the closed tagged variant over the two.
//!
//! Nodes are built once and are immutable for the lifetime of all parses.

use crate::{Action, Args, Value};

/// A named, aliasable grammar branch with its own Args and Action.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Action, Arg, Args, OptionSpec, Pattern};
///
/// let verbose = OptionSpec::new("--verbose")
///     .with_alias("-v")
///     .with_action(Action::Count);
/// assert!(verbose.matches("-v"));
///
/// let level = OptionSpec::new("-O")
///     .compact()
///     .with_args(Args::new().add(Arg::new("level", Pattern::int())));
/// assert!(level.compact);
/// ```
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Canonical name; also the key the result is stored under.
    pub name: String,
    /// Additional trigger aliases.
    pub aliases: Vec<String>,
    /// Bound argument slots.
    pub args: Args,
    /// Merge policy for repeated occurrences.
    pub action: Action,
    /// Sentence words that must have been consumed earlier in the scan for
    /// this node to be a candidate.
    pub requires: Vec<String>,
    /// Overload resolution rank among siblings sharing an alias; higher is
    /// attempted first.
    pub priority: i32,
    /// Permits the first Arg token to be fused to the name token.
    pub compact: bool,
    /// Result materialized when the node never occurs.
    pub default: Option<Value>,
    /// Help string for external rendering.
    pub help: Option<String>,
}

impl OptionSpec {
    /// Creates an option with the given canonical name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            args: Args::new(),
            action: Action::Store,
            requires: Vec::new(),
            priority: 0,
            compact: false,
            default: None,
            help: None,
        }
    }

    /// Adds a trigger alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Binds argument slots.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Sets the merge action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Adds a required sentence word.
    pub fn with_requires(mut self, word: &str) -> Self {
        self.requires.push(word.to_string());
        self
    }

    /// Sets the overload priority (higher is attempted first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Permits fused name+argument tokens.
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    /// Sets the value materialized when the option never occurs.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds a help string.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// All trigger spellings: canonical name first, then aliases.
    pub fn trigger_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether `text` is the name or one of the aliases.
    pub fn matches(&self, text: &str) -> bool {
        self.trigger_names().any(|n| n == text)
    }
}

/// Like an option, but owning nested children.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandNode, OptionSpec, SubcommandSpec};
///
/// let remote = SubcommandSpec::new("remote")
///     .with_child(CommandNode::Option(OptionSpec::new("--verbose")))
///     .with_child(CommandNode::Subcommand(SubcommandSpec::new("add")));
/// assert_eq!(remote.children.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SubcommandSpec {
    /// Canonical name; also the key the result is stored under.
    pub name: String,
    /// Additional trigger aliases.
    pub aliases: Vec<String>,
    /// Bound argument slots.
    pub args: Args,
    /// Merge policy for repeated occurrences.
    pub action: Action,
    /// Sentence words gating candidacy, as for options.
    pub requires: Vec<String>,
    /// Overload resolution rank; higher is attempted first.
    pub priority: i32,
    /// Permits the first Arg token to be fused to the name token.
    pub compact: bool,
    /// Result materialized when the subcommand never occurs.
    pub default: Option<Value>,
    /// Help string for external rendering.
    pub help: Option<String>,
    /// Owned child nodes (options and nested subcommands).
    pub children: Vec<CommandNode>,
}

impl SubcommandSpec {
    /// Creates a subcommand with the given canonical name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            args: Args::new(),
            action: Action::Store,
            requires: Vec::new(),
            priority: 0,
            compact: false,
            default: None,
            help: None,
            children: Vec::new(),
        }
    }

    /// Adds a trigger alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Binds argument slots.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Sets the merge action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Adds a required sentence word.
    pub fn with_requires(mut self, word: &str) -> Self {
        self.requires.push(word.to_string());
        self
    }

    /// Sets the overload priority (higher is attempted first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Permits fused name+argument tokens.
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    /// Sets the value materialized when the subcommand never occurs.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds a help string.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Adds a child node.
    pub fn with_child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    /// All trigger spellings: canonical name first, then aliases.
    pub fn trigger_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether `text` is the name or one of the aliases.
    pub fn matches(&self, text: &str) -> bool {
        self.trigger_names().any(|n| n == text)
    }
}

/// The closed tagged variant over the two node kinds.
#[derive(Debug, Clone)]
pub enum CommandNode {
    /// A leaf branch with its own Args.
    Option(OptionSpec),
    /// A branch that may own nested children.
    Subcommand(SubcommandSpec),
}

impl CommandNode {
    /// The node's canonical name.
    pub fn name(&self) -> &str {
        match self {
            CommandNode::Option(o) => &o.name,
            CommandNode::Subcommand(s) => &s.name,
        }
    }

    /// The node's trigger aliases (canonical name excluded).
    pub fn aliases(&self) -> &[String] {
        match self {
            CommandNode::Option(o) => &o.aliases,
            CommandNode::Subcommand(s) => &s.aliases,
        }
    }

    /// The node's bound Args.
    pub fn args(&self) -> &Args {
        match self {
            CommandNode::Option(o) => &o.args,
            CommandNode::Subcommand(s) => &s.args,
        }
    }

    /// The node's sentence-word gate.
    pub fn requires(&self) -> &[String] {
        match self {
            CommandNode::Option(o) => &o.requires,
            CommandNode::Subcommand(s) => &s.requires,
        }
    }

    /// The node's overload priority.
    pub fn priority(&self) -> i32 {
        match self {
            CommandNode::Option(o) => o.priority,
            CommandNode::Subcommand(s) => s.priority,
        }
    }

    /// The node's help string.
    pub fn help(&self) -> Option<&str> {
        match self {
            CommandNode::Option(o) => o.help.as_deref(),
            CommandNode::Subcommand(s) => s.help.as_deref(),
        }
    }

    /// All trigger spellings: canonical name first, then aliases.
    pub fn trigger_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name()).chain(self.aliases().iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_alias_matching() {
        let opt = OptionSpec::new("--env").with_alias("-e");
        assert!(opt.matches("--env"));
        assert!(opt.matches("-e"));
        assert!(!opt.matches("--envv"));
    }

    #[test]
    fn test_node_capability_surface() {
        let node = CommandNode::Subcommand(
            SubcommandSpec::new("deploy")
                .with_alias("d")
                .with_requires("ops")
                .with_priority(2)
                .with_help("deploy a release"),
        );
        assert_eq!(node.name(), "deploy");
        assert_eq!(node.aliases(), &["d".to_string()]);
        assert_eq!(node.requires(), &["ops".to_string()]);
        assert_eq!(node.priority(), 2);
        assert_eq!(node.help(), Some("deploy a release"));
        let triggers: Vec<&str> = node.trigger_names().collect();
        assert_eq!(triggers, vec!["deploy", "d"]);
    }
}
