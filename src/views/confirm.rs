//! Confirmation state machine for destructive and status-changing actions.
//!
//! ```text
//! Idle ──request──▶ Confirming ──confirm──▶ Confirmed ──start──▶ Mutating ──finish──▶ Done
//!                       │                                            │
//!                     cancel                                       fail
//!                       ▼                                            ▼
//!                   Cancelled ──reset──▶ Idle                       Idle
//! ```
//!
//! `Done` and `Cancelled` are terminal for one action; `request` accepts them
//! as starting points so the next action does not need an explicit `reset`.
//! Every other out-of-order step is rejected and leaves the state unchanged.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Confirming,
    Confirmed,
    Mutating,
    Done,
    Cancelled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Mutating => "mutating",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {from}")]
pub struct TransitionError {
    pub from: Phase,
    pub action: &'static str,
}

/// One pending action `A` and where it is in its confirmation lifecycle.
#[derive(Debug)]
pub struct Confirmation<A> {
    phase: Phase,
    action: Option<A>,
}

impl<A> Default for Confirmation<A> {
    fn default() -> Self {
        Self { phase: Phase::Idle, action: None }
    }
}

impl<A> Confirmation<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The action awaiting confirmation or being executed.
    #[must_use]
    pub fn pending(&self) -> Option<&A> {
        self.action.as_ref()
    }

    /// Ask for confirmation of `action`.
    ///
    /// # Errors
    ///
    /// Rejected while another action is confirming or in flight.
    pub fn request(&mut self, action: A) -> Result<(), TransitionError> {
        self.require(&[Phase::Idle, Phase::Done, Phase::Cancelled], "request an action")?;
        self.action = Some(action);
        self.phase = Phase::Confirming;
        Ok(())
    }

    /// Decline the pending action, handing it back so the caller can undo
    /// any optimistic local change.
    ///
    /// # Errors
    ///
    /// Rejected unless an action is awaiting confirmation.
    pub fn cancel(&mut self) -> Result<A, TransitionError> {
        self.require(&[Phase::Confirming], "cancel")?;
        self.phase = Phase::Cancelled;
        self.take("cancel")
    }

    /// # Errors
    ///
    /// Rejected unless an action is awaiting confirmation.
    pub fn confirm(&mut self) -> Result<(), TransitionError> {
        self.require(&[Phase::Confirming], "confirm")?;
        self.phase = Phase::Confirmed;
        Ok(())
    }

    /// Mark the confirmed action as in flight and borrow it for the request.
    ///
    /// # Errors
    ///
    /// Rejected unless the action has been confirmed.
    pub fn start(&mut self) -> Result<&A, TransitionError> {
        self.require(&[Phase::Confirmed], "start")?;
        self.phase = Phase::Mutating;
        self.action.as_ref().ok_or(TransitionError { from: Phase::Confirmed, action: "start" })
    }

    /// The mutation succeeded.
    ///
    /// # Errors
    ///
    /// Rejected unless a mutation is in flight.
    pub fn finish(&mut self) -> Result<A, TransitionError> {
        self.require(&[Phase::Mutating], "finish")?;
        self.phase = Phase::Done;
        self.take("finish")
    }

    /// The mutation failed; back to `Idle` so the user may try again.
    ///
    /// # Errors
    ///
    /// Rejected unless a mutation is in flight.
    pub fn fail(&mut self) -> Result<A, TransitionError> {
        self.require(&[Phase::Mutating], "fail")?;
        self.phase = Phase::Idle;
        self.take("fail")
    }

    /// Return from `Cancelled` or `Done` to `Idle`.
    ///
    /// # Errors
    ///
    /// Rejected while an action is confirming or in flight.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.require(&[Phase::Idle, Phase::Done, Phase::Cancelled], "reset")?;
        self.phase = Phase::Idle;
        self.action = None;
        Ok(())
    }

    fn require(&self, allowed: &[Phase], action: &'static str) -> Result<(), TransitionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TransitionError { from: self.phase, action })
        }
    }

    fn take(&mut self, action: &'static str) -> Result<A, TransitionError> {
        self.action.take().ok_or(TransitionError { from: self.phase, action })
    }
}

#[cfg(test)]
#[path = "confirm_test.rs"]
mod tests;
