//! The indexed token buffer.
//!
//! A [`TokenBuffer`] owns an immutable unit arena plus a cursor, so
//! backtracking is an O(1) cursor reset rather than a mutable stack
//! operation. A small pending overlay holds tokens restored via
//! [`pushback`](TokenBuffer::pushback) — compact-split remainders and
//! completion splices — which are read before the arena resumes.

use command_grammar_core::{ParseError, RawInput, Token};

/// A saved buffer position for backtracking.
///
/// Restoring a snapshot fully undoes any consumption that happened after it
/// was taken; no partial consumption survives across alternatives.
#[derive(Debug, Clone)]
pub struct Snapshot {
    cursor: usize,
    pending: Vec<Token>,
}

/// Ordered, indexable unit sequence with peek/pop/pushback.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    units: Vec<Token>,
    cursor: usize,
    // read before the arena resumes; top of the stack is next
    pending: Vec<Token>,
}

impl TokenBuffer {
    /// Normalizes raw input into a buffer.
    ///
    /// Text is split by `separators` while respecting single/double quoted
    /// spans (backslash escapes inside); already-split unit sequences pass
    /// through, with unquoted text units re-split.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_engine::TokenBuffer;
    ///
    /// let buf = TokenBuffer::build("say \"hello world\" now".into(), &[' ']);
    /// assert_eq!(buf.remaining(), 3);
    /// ```
    pub fn build(input: RawInput, separators: &[char]) -> Self {
        let units = match input {
            RawInput::Text(text) => split_text(&text, separators),
            RawInput::Units(units) => units
                .into_iter()
                .flat_map(|unit| match unit {
                    Token::Text {
                        ref text,
                        quoted: false,
                    } => split_text(text, separators),
                    other => vec![other],
                })
                .collect(),
        };
        Self::from_units(units)
    }

    /// Wraps an already-normalized unit sequence.
    pub fn from_units(units: Vec<Token>) -> Self {
        Self {
            units,
            cursor: 0,
            pending: Vec::new(),
        }
    }

    /// The full normalized arena, including consumed units.
    pub fn units(&self) -> &[Token] {
        &self.units
    }

    /// Next unit without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.pending.last().or_else(|| self.units.get(self.cursor))
    }

    /// Consumes and returns the next unit.
    ///
    /// # Errors
    ///
    /// [`ParseError::ExhaustedInput`] past the end; the buffer position is
    /// left untouched, so subsequent `peek`/`pushback` stay consistent.
    pub fn pop(&mut self) -> Result<Token, ParseError> {
        if let Some(token) = self.pending.pop() {
            return Ok(token);
        }
        match self.units.get(self.cursor) {
            Some(token) => {
                self.cursor += 1;
                Ok(token.clone())
            }
            None => Err(ParseError::ExhaustedInput),
        }
    }

    /// Restores a unit to the front of the buffer.
    pub fn pushback(&mut self, token: Token) {
        self.pending.push(token);
    }

    /// Number of units left to read.
    pub fn remaining(&self) -> usize {
        self.pending.len() + (self.units.len() - self.cursor)
    }

    /// Whether all units were consumed.
    pub fn done(&self) -> bool {
        self.remaining() == 0
    }

    /// Arena index of the next unit, reported in errors.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Saves the current position.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            pending: self.pending.clone(),
        }
    }

    /// Rewinds to a saved position.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
        self.pending = snapshot.pending;
    }

    /// Consumes every remaining unit.
    pub fn drain(&mut self) -> Vec<Token> {
        let mut out: Vec<Token> = self.pending.drain(..).rev().collect();
        out.extend(self.units[self.cursor..].iter().cloned());
        self.cursor = self.units.len();
        out
    }

    /// Reconstructs the full unit sequence and the index of the next unit,
    /// for a completion freeze.
    pub fn freeze(&self) -> (Vec<Token>, usize) {
        let mut units = self.units[..self.cursor].to_vec();
        units.extend(self.pending.iter().rev().cloned());
        units.extend(self.units[self.cursor..].iter().cloned());
        (units, self.cursor)
    }
}

/// Splits text by the separator set, respecting quoted spans.
fn split_text(text: &str, separators: &[char]) -> Vec<Token> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    let mut was_quoted = false;
    let mut escaped = false;

    let mut flush = |buf: &mut String, was_quoted: &mut bool| {
        if !buf.is_empty() || *was_quoted {
            out.push(Token::Text {
                text: std::mem::take(buf),
                quoted: *was_quoted,
            });
            *was_quoted = false;
        }
    };

    for ch in text.chars() {
        if escaped {
            buf.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => buf.push(ch),
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    was_quoted = true;
                } else if separators.contains(&ch) {
                    flush(&mut buf, &mut was_quoted);
                } else {
                    buf.push(ch);
                }
            }
        }
    }
    if escaped {
        buf.push('\\');
    }
    flush(&mut buf, &mut was_quoted);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buf: &TokenBuffer) -> Vec<String> {
        buf.units()
            .iter()
            .map(|t| t.as_text().unwrap_or("<obj>").to_string())
            .collect()
    }

    #[test]
    fn test_split_respects_quotes() {
        let buf = TokenBuffer::build("say \"hello world\" 'single quoted' done".into(), &[' ']);
        assert_eq!(
            texts(&buf),
            vec!["say", "hello world", "single quoted", "done"],
        );
        assert!(buf.units()[1].is_quoted());
        assert!(!buf.units()[0].is_quoted());
    }

    #[test]
    fn test_split_handles_escapes_and_multiple_separators() {
        let buf = TokenBuffer::build("a\\ b  c".into(), &[' ']);
        assert_eq!(texts(&buf), vec!["a b", "c"]);
    }

    #[test]
    fn test_empty_quoted_token_survives() {
        let buf = TokenBuffer::build("set \"\" end".into(), &[' ']);
        assert_eq!(texts(&buf), vec!["set", "", "end"]);
        assert!(buf.units()[1].is_quoted());
    }

    #[test]
    fn test_pop_beyond_end_fails_without_corruption() {
        let mut buf = TokenBuffer::build("one".into(), &[' ']);
        assert_eq!(buf.pop().unwrap().as_text(), Some("one"));
        assert_eq!(buf.pop(), Err(ParseError::ExhaustedInput));
        // position unchanged; pushback still works
        assert!(buf.peek().is_none());
        buf.pushback(Token::text("back"));
        assert_eq!(buf.peek().and_then(Token::as_text), Some("back"));
        assert_eq!(buf.pop().unwrap().as_text(), Some("back"));
    }

    #[test]
    fn test_snapshot_restore_is_full_rewind() {
        let mut buf = TokenBuffer::build("a b c".into(), &[' ']);
        let snap = buf.snapshot();
        buf.pop().unwrap();
        buf.pop().unwrap();
        buf.pushback(Token::text("x"));
        buf.restore(snap);
        assert_eq!(buf.remaining(), 3);
        assert_eq!(buf.peek().and_then(Token::as_text), Some("a"));
    }

    #[test]
    fn test_units_input_resplits_unquoted_text() {
        let input = RawInput::Units(vec![Token::text("a b"), Token::quoted("c d")]);
        let buf = TokenBuffer::build(input, &[' ']);
        assert_eq!(texts(&buf), vec!["a", "b", "c d"]);
    }

    #[test]
    fn test_freeze_reconstructs_sequence() {
        let mut buf = TokenBuffer::build("a b c".into(), &[' ']);
        buf.pop().unwrap();
        let (units, index) = buf.freeze();
        assert_eq!(units.len(), 3);
        assert_eq!(index, 1);
        assert_eq!(units[index].as_text(), Some("b"));
    }
}
