//! Per-request conversation phases.
//!
//! A request is identified by the chat and the bot message that carries its
//! prompts (the "processing" message that is later edited in place).

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestPhase {
    Idle,
    Probing,
    AwaitingFormatChoice,
    AwaitingQualityChoice,
    Fetching,
    Delivering,
    Done,
    Failed,
    Cancelled,
}

impl RequestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;

        if self.is_terminal() {
            return false;
        }
        match next {
            Failed => self != Idle,
            Cancelled => matches!(self, AwaitingFormatChoice | AwaitingQualityChoice),
            Probing => self == Idle,
            // Back from the quality list returns to the format prompt.
            AwaitingFormatChoice => matches!(self, Probing | AwaitingQualityChoice),
            AwaitingQualityChoice => self == AwaitingFormatChoice,
            Fetching => matches!(self, AwaitingFormatChoice | AwaitingQualityChoice),
            Delivering => self == Fetching,
            Done => self == Delivering,
            Idle => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub chat_id: i64,
    pub message_id: i32,
}

impl RequestKey {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self { chat_id, message_id }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal phase transition {from} -> {to}")]
pub struct PhaseError {
    pub from: RequestPhase,
    pub to: RequestPhase,
}

#[derive(Debug, Clone, Copy)]
struct Stamped {
    phase: RequestPhase,
    since: Instant,
}

/// Tracks the phase of every request.
///
/// Terminal phases stay behind as tombstones so a late press on a finished or
/// cancelled prompt is refused; [`PhaseTracker::prune`] drops old ones. A key
/// the tracker has never seen (for example a button pressed on a prompt sent
/// before a restart) is accepted and starts being tracked from `next`.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: DashMap<RequestKey, Stamped>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, key: RequestKey) -> Option<RequestPhase> {
        self.phases.get(&key).map(|entry| entry.phase)
    }

    /// Moves `key` to `next`, rejecting transitions the state machine forbids.
    ///
    /// Check and update happen under one entry lock, so of two concurrent
    /// presses on the same prompt only one gets through.
    pub fn advance(&self, key: RequestKey, next: RequestPhase) -> Result<RequestPhase, PhaseError> {
        let stamped = Stamped {
            phase: next,
            since: Instant::now(),
        };
        let from = match self.phases.entry(key) {
            Entry::Occupied(mut slot) => {
                let from = slot.get().phase;
                if !from.can_advance_to(next) {
                    return Err(PhaseError { from, to: next });
                }
                slot.insert(stamped);
                from
            }
            Entry::Vacant(slot) => {
                slot.insert(stamped);
                RequestPhase::Idle
            }
        };
        log::debug!("request {}:{} {} -> {}", key.chat_id, key.message_id, from, next);
        Ok(from)
    }

    /// Advances and logs (instead of returning) an illegal transition.
    pub fn record(&self, key: RequestKey, next: RequestPhase) {
        if let Err(e) = self.advance(key, next) {
            log::warn!("request {}:{}: {}", key.chat_id, key.message_id, e);
        }
    }

    /// Requests not yet in a terminal phase.
    pub fn in_flight(&self) -> usize {
        self.phases.iter().filter(|entry| !entry.phase.is_terminal()).count()
    }

    /// Forgets terminal requests that ended at least `max_age` ago.
    pub fn prune(&self, max_age: Duration) {
        self.phases
            .retain(|_, stamped| !(stamped.phase.is_terminal() && stamped.since.elapsed() >= max_age));
    }
}
