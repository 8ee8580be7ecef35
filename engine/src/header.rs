//! Header matching with fuzzy fallback.
//!
//! A [`HeaderSpec`] is compiled from the cross product of configured
//! prefixes and the command name, plus object-kind prefixes. Candidate text
//! may carry `{ident:pat}` placeholders, compiled to anchored regexes with
//! named capture groups; each group is individually run through a
//! [`Pattern`] for type conversion.
//!
//! On a miss with fuzzy matching enabled, the header-shaped leading units
//! (the first unit, then the first two fused for detached-prefix spellings)
//! are compared to every candidate by Levenshtein distance; a minimum within
//! the configured threshold attaches a "did you mean" suggestion to the
//! error. Trailing argument tokens never take part in the comparison, and
//! the input is never auto-corrected.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use command_grammar_core::{CommandGrammar, HeadMatch, ParseError, Pattern, Token, Value};

use crate::TokenBuffer;
use crate::analyser::CompileError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*):([^{}]+)\}").expect("static regex must compile")
});

/// A header name part: literal text or a placeholder-compiled regex.
#[derive(Debug, Clone)]
enum NamePart {
    Literal(String),
    Patterned {
        regex: Regex,
        display: String,
        groups: Vec<(String, Pattern)>,
    },
}

impl NamePart {
    fn display(&self) -> &str {
        match self {
            NamePart::Literal(text) => text,
            NamePart::Patterned { display, .. } => display,
        }
    }

    /// Full-text match; returns converted capture groups on success.
    fn matches(&self, text: &str) -> Option<BTreeMap<String, Value>> {
        match self {
            NamePart::Literal(lit) => (lit == text).then(BTreeMap::new),
            NamePart::Patterned { regex, groups, .. } => {
                let caps = regex.captures(text)?;
                let mut converted = BTreeMap::new();
                for (name, pattern) in groups {
                    let raw = caps.name(name)?.as_str();
                    let value = pattern.convert_raw(raw)?;
                    converted.insert(name.clone(), value);
                }
                Some(converted)
            }
        }
    }
}

#[derive(Debug, Clone)]
enum HeadCandidate {
    /// One fused text unit (prefix and name concatenated).
    Fused(NamePart),
    /// A detached literal prefix unit followed by a name unit.
    Pair { prefix: String, name: NamePart },
    /// An object unit of the given kind followed by a name unit.
    ObjectPair { kind: String, name: NamePart },
}

/// Compiled header matcher for one grammar.
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    candidates: Vec<HeadCandidate>,
    fuzzy: bool,
    threshold: usize,
}

impl HeaderSpec {
    /// Compiles prefixes × name into candidates.
    pub fn compile(grammar: &CommandGrammar) -> Result<Self, CompileError> {
        let name = compile_text(&grammar.name)?;
        let mut candidates = Vec::new();

        if grammar.prefixes.is_empty() {
            candidates.push(HeadCandidate::Fused(name.clone()));
        }
        for prefix in &grammar.prefixes {
            candidates.push(HeadCandidate::Fused(compile_text(&format!(
                "{prefix}{}",
                grammar.name
            ))?));
            candidates.push(HeadCandidate::Pair {
                prefix: prefix.clone(),
                name: name.clone(),
            });
        }
        for kind in &grammar.object_prefixes {
            candidates.push(HeadCandidate::ObjectPair {
                kind: kind.clone(),
                name: name.clone(),
            });
        }

        Ok(Self {
            candidates,
            fuzzy: grammar.meta.fuzzy_match,
            threshold: grammar.meta.fuzzy_threshold,
        })
    }

    /// Matches the buffer's leading units against the candidates.
    ///
    /// Consumes the matched unit(s) on success. On failure the buffer is
    /// left untouched and the error may carry a fuzzy suggestion.
    pub fn match_head(&self, buf: &mut TokenBuffer) -> Result<HeadMatch, ParseError> {
        for candidate in &self.candidates {
            let snap = buf.snapshot();
            match self.try_candidate(candidate, buf) {
                Some(head) => {
                    debug!(origin = %head.origin, "header matched");
                    return Ok(head);
                }
                None => buf.restore(snap),
            }
        }

        let snap = buf.snapshot();
        let first = buf.pop().ok();
        let second = buf.pop().ok();
        buf.restore(snap);

        let input = first.as_ref().map(Token::display).unwrap_or_default();
        let fused_pair = match (
            first.as_ref().and_then(Token::as_text),
            second.as_ref().and_then(Token::as_text),
        ) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            _ => None,
        };
        let suggestion = self
            .fuzzy
            .then(|| {
                self.suggest(&input)
                    .or_else(|| fused_pair.as_deref().and_then(|pair| self.suggest(pair)))
            })
            .flatten();
        if let Some(best) = &suggestion {
            warn!(input = %input, suggestion = %best, "fuzzy header suggestion");
        }
        Err(ParseError::HeaderMismatch { input, suggestion })
    }

    fn try_candidate(&self, candidate: &HeadCandidate, buf: &mut TokenBuffer) -> Option<HeadMatch> {
        match candidate {
            HeadCandidate::Fused(name) => {
                let token = buf.pop().ok()?;
                let text = token.as_text()?;
                let groups = name.matches(text)?;
                Some(HeadMatch {
                    matched: true,
                    origin: text.to_string(),
                    groups,
                })
            }
            HeadCandidate::Pair { prefix, name } => {
                let first = buf.pop().ok()?;
                if first.as_text()? != prefix {
                    return None;
                }
                let second = buf.pop().ok()?;
                let text = second.as_text()?;
                let groups = name.matches(text)?;
                Some(HeadMatch {
                    matched: true,
                    origin: format!("{prefix}{text}"),
                    groups,
                })
            }
            HeadCandidate::ObjectPair { kind, name } => {
                let first = buf.pop().ok()?;
                let unit = match first {
                    Token::Object(unit) if &unit.kind == kind => unit,
                    _ => return None,
                };
                let second = buf.pop().ok()?;
                let text = second.as_text()?;
                let mut groups = name.matches(text)?;
                groups.insert("prefix".to_string(), Value::Object(unit.clone()));
                Some(HeadMatch {
                    matched: true,
                    origin: format!("<{}>{text}", unit.kind),
                    groups,
                })
            }
        }
    }

    /// Best candidate within the edit-distance threshold, if any.
    ///
    /// Ties keep the earliest declared candidate.
    fn suggest(&self, input: &str) -> Option<String> {
        let mut best: Option<(usize, String)> = None;
        for candidate in &self.candidates {
            let display = match candidate {
                HeadCandidate::Fused(name) => name.display().to_string(),
                HeadCandidate::Pair { prefix, name } => format!("{prefix}{}", name.display()),
                HeadCandidate::ObjectPair { .. } => continue,
            };
            let distance = strsim::levenshtein(input, &display);
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((distance, display));
            }
        }
        best.filter(|(distance, _)| *distance <= self.threshold)
            .map(|(_, display)| display)
    }
}

/// Compiles header text, expanding `{ident:pat}` placeholders into named
/// capture groups.
fn compile_text(text: &str) -> Result<NamePart, CompileError> {
    if !PLACEHOLDER.is_match(text) {
        return Ok(NamePart::Literal(text.to_string()));
    }

    let mut source = String::from("^(?:");
    let mut groups = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let ident = &caps[1];
        let pat = &caps[2];
        source.push_str(&regex::escape(&text[last..whole.start()]));

        let (group_source, pattern) = match Pattern::builtin(pat) {
            Some(pattern) => {
                let src = pattern
                    .rule_source()
                    .map(str::to_string)
                    .unwrap_or_else(|| r"\S+".to_string());
                (src, pattern)
            }
            None => {
                let pattern =
                    Pattern::regex(pat).map_err(|err| CompileError::HeaderPattern {
                        placeholder: format!("{{{ident}:{pat}}}"),
                        reason: err.to_string(),
                    })?;
                (pat.to_string(), pattern)
            }
        };
        source.push_str(&format!("(?P<{ident}>{group_source})"));
        groups.push((ident.to_string(), pattern));
        last = whole.end();
    }
    source.push_str(&regex::escape(&text[last..]));
    source.push_str(")$");

    let regex = Regex::new(&source).map_err(|err| CompileError::HeaderPattern {
        placeholder: text.to_string(),
        reason: err.to_string(),
    })?;
    Ok(NamePart::Patterned {
        regex,
        display: text.to_string(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_grammar_core::{CommandMeta, ObjectUnit};

    fn buf(text: &str) -> TokenBuffer {
        TokenBuffer::build(text.into(), &[' '])
    }

    #[test]
    fn test_bare_name_matches() {
        let grammar = CommandGrammar::new("deploy");
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("deploy now");
        let head = header.match_head(&mut b).unwrap();
        assert!(head.matched);
        assert_eq!(head.origin, "deploy");
        assert_eq!(b.remaining(), 1);
    }

    #[test]
    fn test_fused_and_detached_prefix() {
        let grammar = CommandGrammar::new("deploy").with_prefix("/");
        let header = HeaderSpec::compile(&grammar).unwrap();

        let mut fused = buf("/deploy");
        assert!(header.match_head(&mut fused).unwrap().matched);

        let mut detached = buf("/ deploy");
        let head = header.match_head(&mut detached).unwrap();
        assert!(head.matched);
        assert_eq!(head.origin, "/deploy");

        // bare name no longer matches once prefixes exist
        let mut bare = buf("deploy");
        assert!(header.match_head(&mut bare).is_err());
    }

    #[test]
    fn test_placeholder_groups_are_converted() {
        let grammar = CommandGrammar::new("room{num:int}");
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("room42");
        let head = header.match_head(&mut b).unwrap();
        assert_eq!(head.groups.get("num"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_object_prefix_pairs() {
        let grammar = CommandGrammar::new("ping").with_object_prefix("mention");
        let header = HeaderSpec::compile(&grammar).unwrap();
        let units = vec![
            Token::object(ObjectUnit::new("mention", Value::Str("bot".into()))),
            Token::text("ping"),
        ];
        let mut b = TokenBuffer::from_units(units);
        let head = header.match_head(&mut b).unwrap();
        assert!(head.matched);
        assert!(head.groups.contains_key("prefix"));
    }

    #[test]
    fn test_fuzzy_suggestion_within_threshold() {
        let grammar = CommandGrammar::new("alconna_test").with_meta(CommandMeta {
            fuzzy_match: true,
            ..Default::default()
        });
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("alconna_tes");
        let err = header.match_head(&mut b).unwrap_err();
        assert_eq!(
            err,
            ParseError::HeaderMismatch {
                input: "alconna_tes".into(),
                suggestion: Some("alconna_test".into()),
            },
        );
        // failure leaves the buffer untouched
        assert_eq!(b.remaining(), 1);
    }

    #[test]
    fn test_fuzzy_suggestion_ignores_trailing_arguments() {
        let grammar = CommandGrammar::new("alconna_test").with_meta(CommandMeta {
            fuzzy_match: true,
            ..Default::default()
        });
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("alconna_tes now");
        let err = header.match_head(&mut b).unwrap_err();
        assert_eq!(
            err,
            ParseError::HeaderMismatch {
                input: "alconna_tes".into(),
                suggestion: Some("alconna_test".into()),
            },
        );
    }

    #[test]
    fn test_fuzzy_suggestion_fuses_detached_prefix() {
        let grammar = CommandGrammar::new("deploy")
            .with_prefix("/")
            .with_meta(CommandMeta {
                fuzzy_match: true,
                ..Default::default()
            });
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("/ deplo prod");
        let err = header.match_head(&mut b).unwrap_err();
        assert!(matches!(
            err,
            ParseError::HeaderMismatch {
                suggestion: Some(s),
                ..
            } if s == "/deploy",
        ));
    }

    #[test]
    fn test_fuzzy_miss_beyond_threshold() {
        let grammar = CommandGrammar::new("deploy").with_meta(CommandMeta {
            fuzzy_match: true,
            ..Default::default()
        });
        let header = HeaderSpec::compile(&grammar).unwrap();
        let mut b = buf("zzzzzzzz");
        let err = header.match_head(&mut b).unwrap_err();
        assert!(matches!(
            err,
            ParseError::HeaderMismatch {
                suggestion: None,
                ..
            },
        ));
    }
}
