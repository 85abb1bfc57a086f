//! Command bookkeeping for the audio thread, kept free of any device so the
//! ordering rules can be checked on their own.
//!
//! Fetching runs on a worker; while it is in flight the audio thread keeps
//! taking commands. Whatever arrives in the meantime is folded into the pending
//! load, and a finished fetch is used only if it is still the latest load.

use std::time::Duration;

use super::{Generation, LoadTicket};

/// A load in flight and what to do once its bytes arrive.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PendingLoad {
    pub ticket: LoadTicket,
    /// Cleared by a pause that arrives before the bytes do.
    pub autostart: bool,
    pub start_at: Duration,
}

#[derive(Debug, Default)]
pub(super) struct LoadSlot {
    pending: Option<PendingLoad>,
}

impl LoadSlot {
    /// Start tracking `ticket`, superseding any load still in flight.
    pub fn begin(&mut self, ticket: LoadTicket) {
        if let Some(old) = self.pending.replace(PendingLoad {
            ticket,
            autostart: true,
            start_at: Duration::ZERO,
        }) {
            log::debug!("load of {} superseded", old.ticket.source);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Pause while loading: hold the load paused. Returns the generation to
    /// acknowledge, or `None` when nothing is in flight.
    pub fn hold(&mut self) -> Option<Generation> {
        let pending = self.pending.as_mut()?;
        pending.autostart = false;
        Some(pending.ticket.generation)
    }

    /// Play while loading. True when `ticket` is the load in flight, which will
    /// now start on arrival.
    pub fn resume(&mut self, ticket: &LoadTicket) -> bool {
        match self.pending.as_mut() {
            Some(p) if p.ticket == *ticket => {
                p.autostart = true;
                true
            }
            _ => false,
        }
    }

    /// Seek while loading. True when absorbed into the pending start position.
    pub fn seek(&mut self, seconds: f64) -> bool {
        match self.pending.as_mut() {
            Some(p) => {
                p.start_at = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Fetch for `ticket` finished. `Some` only when it is still the latest load.
    pub fn finish(&mut self, ticket: &LoadTicket) -> Option<PendingLoad> {
        if self.pending.as_ref().is_some_and(|p| p.ticket == *ticket) {
            self.pending.take()
        } else {
            None
        }
    }
}

/// How to honor a play request when no load is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Resume {
    /// Nothing (or something else) is loaded: fetch it.
    Load,
    /// The source played to its end; rebuild it from the start first.
    Rebuild,
    Continue,
}

pub(super) fn plan_resume(loaded: Option<&LoadTicket>, requested: &LoadTicket, ended: bool) -> Resume {
    match loaded {
        Some(t) if t == requested && ended => Resume::Rebuild,
        Some(t) if t == requested => Resume::Continue,
        _ => Resume::Load,
    }
}
