//! The recursive matching engine.
//!
//! [`compile`] validates a grammar, compiles its header, and precomputes
//! per-level alias tables; the resulting [`Analyser`] is immutable and may
//! serve any number of concurrent parse calls.
//!
//! One parse runs `HEADER → BODY → {COMPLETE, FAILED}`. The BODY loop peeks
//! the next token and tries, in order: an eligible option alias, an eligible
//! subcommand (recursing into a fresh scope), a sentence word, the scope's
//! own positional Args, and finally the unrecognized-token fallback. Every
//! failed branch restores the buffer snapshot before the next candidate is
//! tried; no partial consumption survives across alternatives. Each
//! iteration either consumes a unit, advances a slot, or exits, so every
//! parse terminates in a bounded number of steps.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::{debug, trace};

use command_grammar_core::{
    Arg, Args, Cardinality, CommandGrammar, CommandNode, OptionResult, OptionSpec, ParseError,
    ParseResult, RawInput, SubcommandResult, SubcommandSpec, Token, ValidationError, Value,
    validate_grammar,
};

use crate::TokenBuffer;
use crate::header::HeaderSpec;

/// Errors surfaced when a grammar cannot be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The grammar failed structural validation.
    #[error("invalid grammar: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidGrammar(Vec<ValidationError>),
    /// A header placeholder did not compile to a regex.
    #[error("invalid header pattern {placeholder}: {reason}")]
    HeaderPattern { placeholder: String, reason: String },
}

/// A paused interactive parse: the frozen unit sequence, the index of the
/// trigger unit, and the completion candidates offered at that position.
#[derive(Debug, Clone)]
pub(crate) struct Freeze {
    pub(crate) units: Vec<Token>,
    pub(crate) index: usize,
    pub(crate) candidates: Vec<String>,
}

/// Outcome of one engine run.
pub(crate) enum ParseOutcome {
    Done(ParseResult),
    Paused(Freeze),
}

/// Everything one scope's BODY loop produced.
#[derive(Debug, Default)]
struct ScopeResult {
    args: BTreeMap<String, Value>,
    options: BTreeMap<String, OptionResult>,
    subcommands: BTreeMap<String, SubcommandResult>,
    extras: Vec<Token>,
}

enum ScopeInner {
    Completed(ScopeResult),
    Paused(Freeze),
}

/// Precomputed alias tables for one node scope.
#[derive(Debug, Clone, Default)]
struct CompiledScope {
    /// (trigger, node index), sorted by priority descending, declaration
    /// order on ties.
    options: Vec<(String, usize)>,
    /// (trigger, node index), same ordering.
    subcommands: Vec<(String, usize)>,
    /// All `requires` words any sibling may consume as a sentence.
    sentence_words: HashSet<String>,
    /// Child scopes keyed by subcommand node index.
    children: BTreeMap<usize, CompiledScope>,
}

fn compile_scope(nodes: &[CommandNode]) -> CompiledScope {
    let mut scope = CompiledScope::default();
    for (idx, node) in nodes.iter().enumerate() {
        scope
            .sentence_words
            .extend(node.requires().iter().cloned());
        match node {
            CommandNode::Option(_) => {
                for trigger in node.trigger_names() {
                    scope.options.push((trigger.to_string(), idx));
                }
            }
            CommandNode::Subcommand(sub) => {
                for trigger in node.trigger_names() {
                    scope.subcommands.push((trigger.to_string(), idx));
                }
                scope.children.insert(idx, compile_scope(&sub.children));
            }
        }
    }
    scope
        .options
        .sort_by_key(|&(_, idx)| std::cmp::Reverse(nodes[idx].priority()));
    scope
        .subcommands
        .sort_by_key(|&(_, idx)| std::cmp::Reverse(nodes[idx].priority()));
    scope
}

fn collect_param_ids(nodes: &[CommandNode], into: &mut HashSet<String>) {
    for node in nodes {
        into.extend(node.trigger_names().map(str::to_string));
        into.extend(node.requires().iter().cloned());
        if let CommandNode::Subcommand(sub) = node {
            collect_param_ids(&sub.children, into);
        }
    }
}

/// Compiles a grammar into an [`Analyser`].
pub fn compile(grammar: CommandGrammar) -> Result<Analyser, CompileError> {
    let errors = validate_grammar(&grammar);
    if !errors.is_empty() {
        return Err(CompileError::InvalidGrammar(errors));
    }
    let header = HeaderSpec::compile(&grammar)?;
    let root = compile_scope(&grammar.nodes);
    let mut param_ids = HashSet::new();
    collect_param_ids(&grammar.nodes, &mut param_ids);
    Ok(Analyser {
        grammar,
        header,
        root,
        param_ids,
    })
}

/// A compiled, immutable matcher for one grammar.
#[derive(Debug, Clone)]
pub struct Analyser {
    grammar: CommandGrammar,
    header: HeaderSpec,
    root: CompiledScope,
    /// Trigger names and sentence words across the whole tree; bounds
    /// variadic greed and optional-slot consumption.
    param_ids: HashSet<String>,
}

impl Analyser {
    /// The grammar this analyser was compiled from.
    pub fn grammar(&self) -> &CommandGrammar {
        &self.grammar
    }

    /// Parses raw input into a [`ParseResult`].
    ///
    /// Non-strict grammars always return `Ok`, carrying any terminal error
    /// inside the result; strict grammars surface the same condition as
    /// `Err`.
    pub fn parse(&self, input: impl Into<RawInput>) -> Result<ParseResult, ParseError> {
        let buf = TokenBuffer::build(input.into(), &self.grammar.config.separators);
        let result = match self.run(buf, false) {
            ParseOutcome::Done(result) => result,
            ParseOutcome::Paused(_) => {
                unreachable!("completion cannot pause a non-interactive parse")
            }
        };
        if self.grammar.meta.strict {
            if let Some(err) = &result.error {
                return Err(err.clone());
            }
        }
        Ok(result)
    }

    /// One full engine run over a prepared buffer.
    pub(crate) fn run(&self, mut buf: TokenBuffer, interactive: bool) -> ParseOutcome {
        let origin = buf.units().to_vec();

        let head = match self.header.match_head(&mut buf) {
            Ok(head) => head,
            Err(err) => {
                debug!(error = %err, "header failed");
                return ParseOutcome::Done(ParseResult {
                    origin,
                    error: Some(err),
                    ..Default::default()
                });
            }
        };

        match self.run_scope(
            &self.grammar.nodes,
            &self.root,
            &self.grammar.args,
            &mut buf,
            interactive,
            true,
        ) {
            Ok(ScopeInner::Paused(freeze)) => ParseOutcome::Paused(freeze),
            Ok(ScopeInner::Completed(scope)) => {
                let mut result = ParseResult {
                    matched: true,
                    origin,
                    head,
                    main_args: scope.args,
                    options: scope.options,
                    subcommands: scope.subcommands,
                    extras: scope.extras,
                    ..Default::default()
                };
                result.encapsulate();
                ParseOutcome::Done(result)
            }
            Err(err) => {
                debug!(error = %err, "body failed");
                ParseOutcome::Done(ParseResult {
                    origin,
                    head,
                    error: Some(err),
                    ..Default::default()
                })
            }
        }
    }

    /// The BODY loop for one scope (the root command or one subcommand).
    ///
    /// Non-root scopes exit on the first token no branch accepts, leaving
    /// it for the parent; the root treats that token as an extra or an
    /// [`ParseError::UnmatchedToken`].
    fn run_scope(
        &self,
        nodes: &[CommandNode],
        compiled: &CompiledScope,
        own_args: &Args,
        buf: &mut TokenBuffer,
        interactive: bool,
        is_root: bool,
    ) -> Result<ScopeInner, ParseError> {
        let mut scope = ScopeResult::default();
        let mut sentences: Vec<String> = Vec::new();
        let mut slot_idx = 0usize;

        'body: loop {
            let Some(peeked) = buf.peek().cloned() else {
                break;
            };
            // failures reported in (e) must come from attempts on this token
            let mut last_failure: Option<ParseError> = None;

            if interactive && self.is_completion_trigger(&peeked) {
                let (units, index) = buf.freeze();
                let candidates =
                    self.completion_candidates(nodes, compiled, &sentences, own_args, slot_idx);
                return Ok(ScopeInner::Paused(Freeze {
                    units,
                    index,
                    candidates,
                }));
            }

            if let (Some(text), false) = (peeked.as_text(), peeked.is_quoted()) {
                // (a) eligible option aliases, priority order
                for &(ref alias, idx) in &compiled.options {
                    let CommandNode::Option(opt) = &nodes[idx] else {
                        continue;
                    };
                    let Some(fused) = alias_remainder(text, alias, opt.compact) else {
                        continue;
                    };
                    if !requires_met(&opt.requires, &sentences) {
                        continue;
                    }
                    let snap = buf.snapshot();
                    let _ = buf.pop();
                    if let Some(remainder) = fused {
                        buf.pushback(Token::text(&remainder));
                    }
                    match self.match_args(&opt.args, buf) {
                        Ok(parsed) => {
                            trace!(option = %opt.name, "option matched");
                            record_option(&mut scope.options, opt, parsed);
                            continue 'body;
                        }
                        Err(err) => {
                            buf.restore(snap);
                            last_failure = Some(err);
                        }
                    }
                }

                // (b) eligible subcommands, recursing into a fresh scope
                for &(ref alias, idx) in &compiled.subcommands {
                    let CommandNode::Subcommand(sub) = &nodes[idx] else {
                        continue;
                    };
                    let Some(fused) = alias_remainder(text, alias, sub.compact) else {
                        continue;
                    };
                    if !requires_met(&sub.requires, &sentences) {
                        continue;
                    }
                    let snap = buf.snapshot();
                    let _ = buf.pop();
                    if let Some(remainder) = fused {
                        buf.pushback(Token::text(&remainder));
                    }
                    let child = compiled.children.get(&idx).cloned().unwrap_or_default();
                    match self.run_scope(&sub.children, &child, &sub.args, buf, interactive, false)
                    {
                        Ok(ScopeInner::Completed(inner)) => {
                            trace!(subcommand = %sub.name, "subcommand matched");
                            record_subcommand(&mut scope.subcommands, sub, inner);
                            continue 'body;
                        }
                        Ok(ScopeInner::Paused(freeze)) => {
                            return Ok(ScopeInner::Paused(freeze));
                        }
                        Err(err) => {
                            buf.restore(snap);
                            last_failure = Some(err);
                        }
                    }
                }

                // (c) sentence words feeding later `requires` gates
                if compiled.sentence_words.contains(text) {
                    let _ = buf.pop();
                    sentences.push(text.to_string());
                    continue 'body;
                }
            }

            // (d) the scope's own positional Args, one slot at a time
            if slot_idx < own_args.len() {
                let slots = own_args.slots();
                let arg = &slots[slot_idx];
                let reserve = slots.len() - 1 - slot_idx;
                match self.match_slot(arg, reserve, buf)? {
                    Some(value) => {
                        scope.args.insert(arg.name.clone(), value);
                    }
                    None => {}
                }
                slot_idx += 1;
                continue 'body;
            }

            // (e) unrecognized token
            if !is_root {
                break;
            }
            if self.grammar.meta.allow_extra {
                scope.extras.push(buf.pop()?);
                continue 'body;
            }
            return Err(last_failure.unwrap_or(ParseError::UnmatchedToken {
                token: peeked.display(),
                position: buf.position(),
            }));
        }

        // buffer exhausted (or non-root break): resolve remaining slots
        for arg in &own_args.slots()[slot_idx..] {
            if let Some(default) = &arg.default {
                scope.args.insert(arg.name.clone(), default.clone());
            } else if !arg.optional {
                return Err(ParseError::ArgumentMissing {
                    name: arg.name.clone(),
                });
            }
        }

        // materialize node-level defaults for absent components
        for node in nodes {
            match node {
                CommandNode::Option(opt) => {
                    if let Some(default) = &opt.default {
                        scope
                            .options
                            .entry(opt.name.clone())
                            .or_insert_with(|| OptionResult {
                                value: default.clone(),
                                args: BTreeMap::new(),
                            });
                    }
                }
                CommandNode::Subcommand(sub) => {
                    if let Some(default) = &sub.default {
                        scope
                            .subcommands
                            .entry(sub.name.clone())
                            .or_insert_with(|| SubcommandResult {
                                value: default.clone(),
                                args: BTreeMap::new(),
                                options: BTreeMap::new(),
                                subcommands: BTreeMap::new(),
                            });
                    }
                }
            }
        }

        Ok(ScopeInner::Completed(scope))
    }

    /// Matches every slot of one Args, left to right.
    fn match_args(&self, args: &Args, buf: &mut TokenBuffer) -> Result<BTreeMap<String, Value>, ParseError> {
        let mut parsed = BTreeMap::new();
        let slots = args.slots();
        for (idx, arg) in slots.iter().enumerate() {
            let reserve = slots.len() - 1 - idx;
            if let Some(value) = self.match_slot(arg, reserve, buf)? {
                parsed.insert(arg.name.clone(), value);
            }
        }
        Ok(parsed)
    }

    /// Resolves one slot per its cardinality.
    ///
    /// `reserve` is the number of slots declared after this one; a variadic
    /// slot always leaves at least that many tokens unconsumed. Returns
    /// `Ok(None)` when an optional slot is skipped without a default.
    fn match_slot(
        &self,
        arg: &Arg,
        reserve: usize,
        buf: &mut TokenBuffer,
    ) -> Result<Option<Value>, ParseError> {
        if arg.pattern.is_rest() {
            let items = buf.drain().iter().map(token_value).collect::<Vec<_>>();
            return Ok(Some(Value::List(items)));
        }

        match arg.cardinality {
            Cardinality::Single => {
                let snap = buf.snapshot();
                let Ok(token) = buf.pop() else {
                    return fallback(arg, None);
                };
                if self.is_param_id(&token) && arg.skippable() {
                    buf.restore(snap);
                    return fallback(arg, None);
                }
                match arg.pattern.match_token(&token) {
                    Ok(value) => Ok(Some(value)),
                    Err(_) => {
                        buf.restore(snap);
                        fallback(arg, Some(&token))
                    }
                }
            }
            Cardinality::Variadic { min_one } => {
                let mut items = Vec::new();
                while buf.remaining() > reserve {
                    let Some(token) = buf.peek().cloned() else {
                        break;
                    };
                    if self.is_param_id(&token) {
                        break;
                    }
                    match arg.pattern.match_token(&token) {
                        Ok(value) => {
                            let _ = buf.pop();
                            items.push(value);
                        }
                        Err(_) => break,
                    }
                }
                if items.is_empty() && min_one {
                    let peeked = buf.peek().cloned();
                    return fallback(arg, peeked.as_ref());
                }
                Ok(Some(Value::List(items)))
            }
            Cardinality::KeyValue { sep } => {
                let snap = buf.snapshot();
                let Ok(token) = buf.pop() else {
                    return fallback(arg, None);
                };
                let pair = token.as_text().and_then(|text| text.split_once(sep));
                match pair {
                    Some((key, raw)) if key == arg.name => {
                        let value_token = Token::Text {
                            text: raw.to_string(),
                            quoted: token.is_quoted(),
                        };
                        match arg.pattern.match_token(&value_token) {
                            Ok(value) => Ok(Some(value)),
                            Err(_) => {
                                buf.restore(snap);
                                fallback(arg, Some(&token))
                            }
                        }
                    }
                    _ => {
                        buf.restore(snap);
                        fallback(arg, Some(&token))
                    }
                }
            }
            Cardinality::VariadicKeyValue { sep } => {
                let mut map = BTreeMap::new();
                while buf.remaining() > reserve {
                    let Some(token) = buf.peek().cloned() else {
                        break;
                    };
                    let Some((key, raw)) = token.as_text().and_then(|t| t.split_once(sep)) else {
                        break;
                    };
                    let value_token = Token::Text {
                        text: raw.to_string(),
                        quoted: token.is_quoted(),
                    };
                    let Ok(value) = arg.pattern.match_token(&value_token) else {
                        break;
                    };
                    let _ = buf.pop();
                    map.insert(key.to_string(), value);
                }
                if map.is_empty() {
                    let peeked = buf.peek().cloned();
                    return fallback(arg, peeked.as_ref());
                }
                Ok(Some(Value::Map(map)))
            }
        }
    }

    fn is_param_id(&self, token: &Token) -> bool {
        !token.is_quoted()
            && token
                .as_text()
                .is_some_and(|text| self.param_ids.contains(text))
    }

    fn is_completion_trigger(&self, token: &Token) -> bool {
        !token.is_quoted()
            && token.as_text().is_some_and(|text| {
                self.grammar
                    .config
                    .completion_triggers
                    .iter()
                    .any(|t| t == text)
            })
    }

    /// Candidates offered when a completion trigger pauses this scope.
    fn completion_candidates(
        &self,
        nodes: &[CommandNode],
        compiled: &CompiledScope,
        sentences: &[String],
        own_args: &Args,
        slot_idx: usize,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if !candidate.is_empty() && !out.contains(&candidate) {
                out.push(candidate);
            }
        };

        for &(ref alias, idx) in compiled.options.iter().chain(&compiled.subcommands) {
            if requires_met(nodes[idx].requires(), sentences) {
                push(alias.clone());
            }
        }
        if let Some(arg) = own_args.slots().get(slot_idx) {
            if let Some(choices) = arg.pattern.literal_choices() {
                for choice in choices {
                    push(choice.to_string());
                }
            } else if let Some(default) = &arg.default {
                push(default.to_string());
            } else {
                push(format!("<{}: {}>", arg.name, arg.pattern.name()));
            }
        }
        for trigger in &self.grammar.config.help_triggers {
            push(trigger.clone());
        }
        out
    }
}

/// `None` if the alias does not apply; `Some(None)` for an exact trigger;
/// `Some(Some(rest))` when a compact node may split a fused token.
fn alias_remainder(text: &str, alias: &str, compact: bool) -> Option<Option<String>> {
    if text == alias {
        return Some(None);
    }
    if compact && text.len() > alias.len() && text.starts_with(alias) {
        return Some(Some(text[alias.len()..].to_string()));
    }
    None
}

fn requires_met(requires: &[String], sentences: &[String]) -> bool {
    requires.iter().all(|word| sentences.contains(word))
}

fn token_value(token: &Token) -> Value {
    match token {
        Token::Text { text, .. } => Value::Str(text.clone()),
        Token::Object(unit) => Value::Object(unit.clone()),
    }
}

fn fallback(arg: &Arg, token: Option<&Token>) -> Result<Option<Value>, ParseError> {
    if let Some(default) = &arg.default {
        return Ok(Some(default.clone()));
    }
    if arg.optional {
        return Ok(None);
    }
    match token {
        Some(token) => Err(ParseError::ParamsUnmatched {
            param: arg.name.clone(),
            token: token.display(),
        }),
        None => Err(ParseError::ArgumentMissing {
            name: arg.name.clone(),
        }),
    }
}

fn record_option(
    options: &mut BTreeMap<String, OptionResult>,
    opt: &OptionSpec,
    parsed: BTreeMap<String, Value>,
) {
    let tuple = (!parsed.is_empty()).then(|| Value::Map(parsed.clone()));
    let previous = options.get(&opt.name).map(|o| o.value.clone());
    let value = opt.action.merge(previous, tuple);
    options.insert(
        opt.name.clone(),
        OptionResult {
            value,
            args: parsed,
        },
    );
}

fn record_subcommand(
    subcommands: &mut BTreeMap<String, SubcommandResult>,
    sub: &SubcommandSpec,
    inner: ScopeResult,
) {
    let tuple = (!inner.args.is_empty()).then(|| Value::Map(inner.args.clone()));
    match subcommands.get_mut(&sub.name) {
        Some(existing) => {
            let previous = Some(existing.value.clone());
            existing.value = sub.action.merge(previous, tuple);
            existing.args = inner.args;
            existing.options.extend(inner.options);
            existing.subcommands.extend(inner.subcommands);
        }
        None => {
            subcommands.insert(
                sub.name.clone(),
                SubcommandResult {
                    value: sub.action.merge(None, tuple),
                    args: inner.args,
                    options: inner.options,
                    subcommands: inner.subcommands,
                },
            );
        }
    }
}
