//! Counts-only result summary.

/// A minimal stand-in for a full [`Session`](crate::session::Session):
/// just the counters and the shared `success` contract. Produced by the
/// TAP parser, or synthesized directly by a unit that tracks its own
/// counts without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultSummary {
    pub planned: usize,
    pub ran: usize,
    pub failed: usize,
    pub skipped: usize,
    pub todo: usize,
}

impl ResultSummary {
    /// Number of failures, optionally excluding tests marked TODO.
    pub fn failures(&self, no_todo: bool) -> usize {
        if no_todo {
            self.failed.saturating_sub(self.todo)
        } else {
            self.failed
        }
    }

    /// True when nothing (relevant) failed and the plan, if any, was met.
    pub fn success(&self, no_todo: bool) -> bool {
        self.failures(no_todo) == 0 && (self.planned == 0 || self.planned == self.ran)
    }
}
