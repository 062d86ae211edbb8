//! Dropping stale render results.
//!
//! Renders are never aborted. A caller that may issue a newer request before an
//! older one finishes takes a [`RequestTicket`] per request and applies a result
//! only while its ticket is still the latest one.

use std::cell::Cell;
use std::rc::Rc;

/// Identity of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Tracks the latest issued request.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Rc<Cell<u64>>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket that supersedes every earlier one.
    pub fn issue(&self) -> RequestTicket {
        let next = self.latest.get() + 1;
        self.latest.set(next);
        RequestTicket(next)
    }

    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.get() == ticket.0
    }

    /// Returns `result` only if `ticket` is still current.
    pub fn accept<T>(&self, ticket: RequestTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(ticket = ticket.0, latest = self.latest.get(), "dropping superseded result");
            None
        }
    }
}
