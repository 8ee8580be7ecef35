//! Interactive completion sessions.
//!
//! A [`CompletionSession`] wraps an [`Analyser`] in a small state machine.
//! Feeding input containing a completion trigger token pauses the parse at
//! that position and freezes the unit sequence; the session then offers
//! context-aware candidates which the caller cycles with
//! [`tab`](CompletionSession::tab) and commits with
//! [`enter`](CompletionSession::enter). Committing splices the chosen text
//! over the trigger unit and re-runs the parse from the frozen units, so the
//! final result is identical to parsing the completed line directly.

use tracing::debug;

use command_grammar_core::{ParseResult, RawInput, Token};

use crate::TokenBuffer;
use crate::analyser::{Analyser, Freeze, ParseOutcome};

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No input fed yet.
    Inactive,
    /// A trigger paused the parse; candidates are collected.
    Collecting,
    /// The caller is cycling through candidates.
    Selecting,
    /// The last fed or completed input ran to a terminal result.
    Done,
}

/// An interactive completion wrapper around one analyser.
pub struct CompletionSession<'a> {
    analyser: &'a Analyser,
    state: SessionState,
    freeze: Option<Freeze>,
    cursor: usize,
}

impl<'a> CompletionSession<'a> {
    /// Creates an inactive session.
    pub fn new(analyser: &'a Analyser) -> Self {
        Self {
            analyser,
            state: SessionState::Inactive,
            freeze: None,
            cursor: 0,
        }
    }

    /// The session's current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Feeds input. Returns the terminal result, or `None` when a trigger
    /// paused the parse and candidates are now available.
    ///
    /// Feeding while paused discards the previous pause: the new input
    /// supersedes it.
    pub fn feed(&mut self, input: impl Into<RawInput>) -> Option<ParseResult> {
        let buf = TokenBuffer::build(input.into(), &self.analyser.grammar().config.separators);
        self.run(buf)
    }

    /// The candidates of the current pause, in offer order.
    pub fn available(&self) -> &[String] {
        self.freeze.as_ref().map_or(&[], |f| f.candidates.as_slice())
    }

    /// The candidate the cursor currently points at.
    pub fn current(&self) -> Option<&str> {
        self.freeze
            .as_ref()
            .and_then(|f| f.candidates.get(self.cursor))
            .map(String::as_str)
    }

    /// Advances the cursor by `offset`, wrapping past the end.
    ///
    /// Returns the newly selected candidate.
    pub fn tab(&mut self, offset: usize) -> Option<&str> {
        let len = self.available().len();
        if len == 0 {
            return None;
        }
        self.state = SessionState::Selecting;
        self.cursor = (self.cursor + offset) % len;
        self.current()
    }

    /// Commits `content` (or the currently selected candidate) over the
    /// frozen trigger position and re-runs the parse.
    ///
    /// Returns the terminal result, or `None` when the completed input
    /// paused again at a later trigger, or when the session holds no pause.
    pub fn enter(&mut self, content: Option<&str>) -> Option<ParseResult> {
        let freeze = self.freeze.take()?;
        let chosen = content
            .map(str::to_string)
            .or_else(|| freeze.candidates.get(self.cursor).cloned())?;
        debug!(chosen = %chosen, index = freeze.index, "completion committed");

        let mut units = freeze.units;
        units[freeze.index] = Token::text(&chosen);
        self.run(TokenBuffer::build(
            RawInput::Units(units),
            &self.analyser.grammar().config.separators,
        ))
    }

    fn run(&mut self, buf: TokenBuffer) -> Option<ParseResult> {
        match self.analyser.run(buf, true) {
            ParseOutcome::Paused(freeze) => {
                self.freeze = Some(freeze);
                self.cursor = 0;
                self.state = SessionState::Collecting;
                None
            }
            ParseOutcome::Done(result) => {
                self.freeze = None;
                self.cursor = 0;
                self.state = SessionState::Done;
                Some(result)
            }
        }
    }
}
