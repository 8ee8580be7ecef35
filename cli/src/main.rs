use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Deserialize;

use command_grammar_core::{
    Action, Arg, Args, CommandGrammar, CommandMeta, CommandNode, OptionSpec, ParseResult,
    ParserConfig, Pattern, SubcommandSpec, Value,
};
use command_grammar_engine::{CompletionSession, Shortcut, ShortcutTable, compile};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "grammar-parse")]
#[command(about = "Check command grammars and run input against them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate and compile a grammar definition file.
    Check(CheckArgs),
    /// Parse an input line against a grammar.
    Parse(ParseArgs),
    /// Show completion candidates for an input line with a trigger token.
    Complete(CompleteArgs),
    /// Expand a shortcut line against a shortcut definition file.
    Expand(ExpandArgs),
}

#[derive(Debug, ClapArgs)]
struct CheckArgs {
    /// Grammar definition file (.json, .yaml, or .yml).
    #[arg(long)]
    grammar: PathBuf,
}

#[derive(Debug, ClapArgs)]
struct ParseArgs {
    /// Grammar definition file (.json, .yaml, or .yml).
    #[arg(long)]
    grammar: PathBuf,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
    /// Input tokens, joined with spaces before parsing.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

#[derive(Debug, ClapArgs)]
struct CompleteArgs {
    /// Grammar definition file (.json, .yaml, or .yml).
    #[arg(long)]
    grammar: PathBuf,
    /// Candidate to commit over the trigger position instead of listing.
    #[arg(long)]
    commit: Option<String>,
    /// Input tokens, joined with spaces before parsing.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

#[derive(Debug, ClapArgs)]
struct ExpandArgs {
    /// Shortcut definition file (.json, .yaml, or .yml).
    #[arg(long)]
    shortcuts: PathBuf,
    /// Input line whose first token may be a shortcut key.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Parse(args) => run_parse(args),
        Command::Complete(args) => run_complete(args),
        Command::Expand(args) => run_expand(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let grammar = load_grammar(&args.grammar)?;
    let name = grammar.name.clone();
    compile(grammar).map_err(|err| err.to_string())?;
    println!("Grammar '{name}' is valid.");
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let grammar = load_grammar(&args.grammar)?;
    let analyser = compile(grammar).map_err(|err| err.to_string())?;
    let line = args.input.join(" ");

    let result = analyser
        .parse(line.as_str())
        .map_err(|err| format!("Parse failed: {err}"))?;
    println!("{}", render_result(&result, args.format)?);

    if !result.matched {
        let reason = result
            .error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "input did not match".to_string());
        return Err(format!("Parse failed: {reason}"));
    }
    Ok(())
}

fn run_complete(args: CompleteArgs) -> Result<(), String> {
    let grammar = load_grammar(&args.grammar)?;
    let analyser = compile(grammar).map_err(|err| err.to_string())?;
    let line = args.input.join(" ");

    let mut session = CompletionSession::new(&analyser);
    if let Some(result) = session.feed(line.as_str()) {
        return Err(format!(
            "No completion trigger in input; parse ran to completion (matched: {})",
            result.matched
        ));
    }

    match args.commit {
        Some(content) => {
            let result = session
                .enter(Some(&content))
                .ok_or_else(|| "Completion paused again after commit".to_string())?;
            println!("{}", render_result(&result, CliOutputFormat::Text)?);
            if !result.matched {
                let reason = result
                    .error
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "input did not match".to_string());
                return Err(format!("Parse failed: {reason}"));
            }
        }
        None => {
            for candidate in session.available() {
                println!("{candidate}");
            }
        }
    }
    Ok(())
}

fn run_expand(args: ExpandArgs) -> Result<(), String> {
    let table = load_shortcuts(&args.shortcuts)?;
    let line = args.input.join(" ");
    let expanded = table
        .expand_line(&line)
        .map_err(|err| format!("Expansion failed: {err}"))?;
    println!("{}", expanded.unwrap_or(line));
    Ok(())
}

fn render_result(result: &ParseResult, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&result.to_json())
            .map_err(|err| format!("JSON serialization failed: {err}")),
        CliOutputFormat::Yaml => serde_yaml::to_string(&result.to_json())
            .map_err(|err| format!("YAML serialization failed: {err}")),
        CliOutputFormat::Text => {
            let mut out = format!("matched: {}", result.matched);
            for (name, value) in result.all_args() {
                out.push_str(&format!("\n{name} = {value}"));
            }
            for (name, opt) in &result.options {
                out.push_str(&format!("\n{name} = {}", opt.value));
            }
            for (name, sub) in &result.subcommands {
                out.push_str(&format!("\n{name} = {}", sub.value));
            }
            if let Some(err) = &result.error {
                out.push_str(&format!("\nerror: {err}"));
            }
            Ok(out)
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar definition files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GrammarFile {
    name: String,
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    object_prefixes: Vec<String>,
    #[serde(default)]
    args: Vec<ArgDef>,
    #[serde(default)]
    options: Vec<OptionDef>,
    #[serde(default)]
    subcommands: Vec<SubcommandDef>,
    #[serde(default)]
    meta: MetaDef,
    #[serde(default)]
    config: ConfigDef,
}

/// Lenient mirror of [`CommandMeta`]: every field individually defaulted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetaDef {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    usage: Option<String>,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    fuzzy_match: bool,
    #[serde(default)]
    fuzzy_threshold: Option<usize>,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    allow_extra: bool,
}

impl From<MetaDef> for CommandMeta {
    fn from(def: MetaDef) -> Self {
        let defaults = CommandMeta::default();
        CommandMeta {
            description: def.description,
            usage: def.usage,
            example: def.example,
            fuzzy_match: def.fuzzy_match,
            fuzzy_threshold: def.fuzzy_threshold.unwrap_or(defaults.fuzzy_threshold),
            strict: def.strict,
            allow_extra: def.allow_extra,
        }
    }
}

/// Lenient mirror of [`ParserConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDef {
    #[serde(default)]
    separators: Option<Vec<char>>,
    #[serde(default)]
    completion_triggers: Option<Vec<String>>,
    #[serde(default)]
    help_triggers: Option<Vec<String>>,
}

impl From<ConfigDef> for ParserConfig {
    fn from(def: ConfigDef) -> Self {
        let defaults = ParserConfig::default();
        ParserConfig {
            separators: def.separators.unwrap_or(defaults.separators),
            completion_triggers: def
                .completion_triggers
                .unwrap_or(defaults.completion_triggers),
            help_triggers: def.help_triggers.unwrap_or(defaults.help_triggers),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgDef {
    name: String,
    #[serde(default = "default_pattern")]
    pattern: String,
    #[serde(default)]
    cardinality: CardinalityDef,
    #[serde(default = "default_separator")]
    separator: char,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    help: Option<String>,
}

fn default_pattern() -> String {
    "str".to_string()
}

fn default_separator() -> char {
    '='
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CardinalityDef {
    #[default]
    Single,
    Variadic,
    VariadicRequired,
    KeyValue,
    VariadicKeyValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ActionDef {
    #[default]
    Store,
    StoreTrue,
    StoreFalse,
    StoreValue(Value),
    Append,
    AppendValue(Value),
    Count,
}

impl From<ActionDef> for Action {
    fn from(def: ActionDef) -> Self {
        match def {
            ActionDef::Store => Action::Store,
            ActionDef::StoreTrue => Action::store_true(),
            ActionDef::StoreFalse => Action::store_false(),
            ActionDef::StoreValue(v) => Action::StoreValue(v),
            ActionDef::Append => Action::Append,
            ActionDef::AppendValue(v) => Action::AppendValue(v),
            ActionDef::Count => Action::Count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionDef {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    args: Vec<ArgDef>,
    #[serde(default)]
    action: ActionDef,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    compact: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    help: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubcommandDef {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    args: Vec<ArgDef>,
    #[serde(default)]
    action: ActionDef,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    compact: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    help: Option<String>,
    #[serde(default)]
    options: Vec<OptionDef>,
    #[serde(default)]
    subcommands: Vec<SubcommandDef>,
}

fn load_grammar(path: &Path) -> Result<CommandGrammar, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let file: GrammarFile = deserialize_by_extension(path, &raw)?;
    build_grammar(file)
}

fn deserialize_by_extension<T: for<'de> Deserialize<'de>>(
    path: &Path,
    raw: &str,
) -> Result<T, String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display())),
        Some("yaml") | Some("yml") => serde_yaml::from_str(raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display())),
        other => Err(format!(
            "Unsupported definition file extension '{}' for '{}'",
            other.unwrap_or(""),
            path.display()
        )),
    }
}

fn build_grammar(file: GrammarFile) -> Result<CommandGrammar, String> {
    let mut grammar = CommandGrammar::new(&file.name);
    for prefix in &file.prefixes {
        grammar = grammar.with_prefix(prefix);
    }
    for kind in &file.object_prefixes {
        grammar = grammar.with_object_prefix(kind);
    }
    grammar = grammar.with_args(build_args(file.args)?);
    for option in file.options {
        grammar = grammar.with_option(build_option(option)?);
    }
    for sub in file.subcommands {
        grammar = grammar.with_subcommand(build_subcommand(sub)?);
    }
    Ok(grammar
        .with_meta(file.meta.into())
        .with_config(file.config.into()))
}

fn build_args(defs: Vec<ArgDef>) -> Result<Args, String> {
    let mut args = Args::new();
    for def in defs {
        args = args.add(build_arg(def)?);
    }
    Ok(args)
}

fn build_arg(def: ArgDef) -> Result<Arg, String> {
    let pattern = resolve_pattern(&def.pattern)?;
    let mut arg = Arg::new(&def.name, pattern);
    arg = match def.cardinality {
        CardinalityDef::Single => arg,
        CardinalityDef::Variadic => arg.variadic(false),
        CardinalityDef::VariadicRequired => arg.variadic(true),
        CardinalityDef::KeyValue => arg.key_value(def.separator),
        CardinalityDef::VariadicKeyValue => arg.variadic_key_value(def.separator),
    };
    if let Some(default) = def.default {
        arg = arg.with_default(default);
    }
    if def.optional {
        arg = arg.optional();
    }
    if let Some(help) = def.help {
        arg = arg.with_help(&help);
    }
    Ok(arg)
}

fn build_option(def: OptionDef) -> Result<OptionSpec, String> {
    let mut opt = OptionSpec::new(&def.name)
        .with_args(build_args(def.args)?)
        .with_action(def.action.into())
        .with_priority(def.priority);
    for alias in &def.aliases {
        opt = opt.with_alias(alias);
    }
    for word in &def.requires {
        opt = opt.with_requires(word);
    }
    if def.compact {
        opt = opt.compact();
    }
    if let Some(default) = def.default {
        opt = opt.with_default(default);
    }
    if let Some(help) = def.help {
        opt = opt.with_help(&help);
    }
    Ok(opt)
}

fn build_subcommand(def: SubcommandDef) -> Result<SubcommandSpec, String> {
    let mut sub = SubcommandSpec::new(&def.name)
        .with_args(build_args(def.args)?)
        .with_action(def.action.into())
        .with_priority(def.priority);
    for alias in &def.aliases {
        sub = sub.with_alias(alias);
    }
    for word in &def.requires {
        sub = sub.with_requires(word);
    }
    if def.compact {
        sub = sub.compact();
    }
    if let Some(default) = def.default {
        sub = sub.with_default(default);
    }
    if let Some(help) = def.help {
        sub = sub.with_help(&help);
    }
    for option in def.options {
        sub = sub.with_child(CommandNode::Option(build_option(option)?));
    }
    for nested in def.subcommands {
        sub = sub.with_child(CommandNode::Subcommand(build_subcommand(nested)?));
    }
    Ok(sub)
}

/// Resolves a pattern string: a builtin name, `re:<regex>`, or
/// `choice:a,b,c`.
fn resolve_pattern(spec: &str) -> Result<Pattern, String> {
    if let Some(pattern) = Pattern::builtin(spec) {
        return Ok(pattern);
    }
    if let Some(source) = spec.strip_prefix("re:") {
        return Pattern::regex(source)
            .map_err(|err| format!("Invalid pattern regex '{source}': {err}"));
    }
    if let Some(rest) = spec.strip_prefix("choice:") {
        let values: Vec<Value> = rest
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Value::Str(part.to_string()))
            .collect();
        if values.is_empty() {
            return Err(format!("Empty choice pattern '{spec}'"));
        }
        return Ok(Pattern::choice(values));
    }
    Err(format!("Unknown pattern '{spec}'"))
}

// ---------------------------------------------------------------------------
// Shortcut definition files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShortcutFile {
    shortcuts: Vec<ShortcutDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShortcutDef {
    key: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    fuzzy: bool,
}

fn load_shortcuts(path: &Path) -> Result<ShortcutTable, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let file: ShortcutFile = deserialize_by_extension(path, &raw)?;

    let mut table = ShortcutTable::new();
    for def in file.shortcuts {
        let mut shortcut = Shortcut::new(&def.key, &def.command);
        for arg in &def.args {
            shortcut = shortcut.with_arg(arg);
        }
        if def.fuzzy {
            shortcut = shortcut.fuzzy();
        }
        table.add(shortcut);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pattern_builtin_regex_and_choice() {
        assert_eq!(resolve_pattern("int").unwrap().name(), "int");
        assert!(resolve_pattern("re:[a-f0-9]+").is_ok());
        let choice = resolve_pattern("choice: staging, prod").unwrap();
        assert_eq!(choice.literal_choices().map(<[Value]>::len), Some(2));
        assert!(resolve_pattern("uuid").is_err());
        assert!(resolve_pattern("re:(unclosed").is_err());
    }

    #[test]
    fn test_build_arg_cardinalities() {
        let yaml = r#"
name: vars
pattern: str
cardinality: variadic_key_value
separator: ":"
"#;
        let def: ArgDef = serde_yaml::from_str(yaml).unwrap();
        let arg = build_arg(def).unwrap();
        assert!(matches!(
            arg.cardinality,
            command_grammar_core::Cardinality::VariadicKeyValue { sep: ':' },
        ));
    }

    #[test]
    fn test_grammar_file_round_trip() {
        let yaml = r#"
name: deploy
prefixes: ["/"]
args:
  - name: target
    pattern: "choice:staging,prod"
    default: !Str staging
options:
  - name: "--env"
    aliases: ["-e"]
    args:
      - name: name
subcommands:
  - name: scale
    args:
      - name: replicas
        pattern: int
    options:
      - name: "--wait"
        action: store_true
meta:
  fuzzy_match: true
"#;
        let file: GrammarFile = serde_yaml::from_str(yaml).unwrap();
        let grammar = build_grammar(file).unwrap();
        assert_eq!(grammar.name, "deploy");
        assert_eq!(grammar.prefixes, vec!["/".to_string()]);
        assert_eq!(grammar.nodes.len(), 2);
        assert!(grammar.meta.fuzzy_match);
        assert_eq!(grammar.meta.fuzzy_threshold, 2);

        let analyser = compile(grammar).expect("grammar should compile");
        let result = analyser.parse("/deploy -e review scale 3 --wait prod").unwrap();
        assert!(result.matched, "error: {:?}", result.error);
    }

    #[test]
    fn test_unknown_grammar_field_is_rejected() {
        let yaml = "name: app\nunexpected: true\n";
        assert!(serde_yaml::from_str::<GrammarFile>(yaml).is_err());
    }
}
