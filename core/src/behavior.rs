//! Post-parse behaviors.
//!
//! A [`Behavior`] inspects or rewrites a finished [`ParseResult`].
//! Behaviors run strictly after the matching engine and never touch the
//! grammar; [`ParseResult::execute`](crate::ParseResult::execute) applies
//! them in order.

use crate::ParseResult;

/// Outcome of one behavior application.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorControl {
    /// Keep the behavior's effect and move on.
    Continue,
    /// Discard this behavior's effect and move on.
    Cancel,
    /// Abort the whole parse with the given reason.
    Fail(String),
}

/// A post-parse hook applied to the finished result.
pub trait Behavior {
    /// Inspects or rewrites the result.
    ///
    /// Returning [`BehaviorControl::Fail`] converts the result into a
    /// non-matched one carrying
    /// [`ParseError::OutOfBounds`](crate::ParseError::OutOfBounds).
    fn operate(&self, result: &mut ParseResult) -> BehaviorControl;
}

impl<F> Behavior for F
where
    F: Fn(&mut ParseResult) -> BehaviorControl,
{
    fn operate(&self, result: &mut ParseResult) -> BehaviorControl {
        self(result)
    }
}
