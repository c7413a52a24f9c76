//! What happened, in order.
//!
//! Each engine operation appends at least one [`Event`] carrying that
//! operation's sequence number. The [`EventLog`] is bounded and evicts from
//! the front. Listeners see events and snapshots by shared reference only.

use crate::dispatch::{Outcome, RejectReason};
use crate::id::NodeId;
use crate::model::NodeStatus;
use crate::snapshot::WorldSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{VecDeque, vec_deque};

/// One recorded change or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // -- Dispatch --
    DispatchResolved {
        seq: u64,
        source: NodeId,
        target: NodeId,
        amount: u32,
        outcome: Outcome,
    },
    DispatchRejected {
        seq: u64,
        source: NodeId,
        target: NodeId,
        amount: u32,
        reason: RejectReason,
    },

    // -- Injected --
    RouteCollapsed {
        seq: u64,
        from: NodeId,
        to: NodeId,
    },
    ExternalAidDelivered {
        seq: u64,
        target: NodeId,
        amount: u32,
        needs_after: u32,
    },
    InjectionRejected {
        seq: u64,
        reason: RejectReason,
    },

    // -- State --
    NodeStatusChanged {
        seq: u64,
        node: NodeId,
        from: NodeStatus,
        to: NodeStatus,
    },
    WorldReset {
        seq: u64,
    },
}

/// Variant tag, for filtering the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DispatchResolved,
    DispatchRejected,
    RouteCollapsed,
    ExternalAidDelivered,
    InjectionRejected,
    NodeStatusChanged,
    WorldReset,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::DispatchResolved { .. } => EventKind::DispatchResolved,
            Event::DispatchRejected { .. } => EventKind::DispatchRejected,
            Event::RouteCollapsed { .. } => EventKind::RouteCollapsed,
            Event::ExternalAidDelivered { .. } => EventKind::ExternalAidDelivered,
            Event::InjectionRejected { .. } => EventKind::InjectionRejected,
            Event::NodeStatusChanged { .. } => EventKind::NodeStatusChanged,
            Event::WorldReset { .. } => EventKind::WorldReset,
        }
    }

    /// The producing operation's sequence number.
    pub fn seq(&self) -> u64 {
        match self {
            Event::DispatchResolved { seq, .. }
            | Event::DispatchRejected { seq, .. }
            | Event::RouteCollapsed { seq, .. }
            | Event::ExternalAidDelivered { seq, .. }
            | Event::InjectionRejected { seq, .. }
            | Event::NodeStatusChanged { seq, .. }
            | Event::WorldReset { seq } => *seq,
        }
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Bounded event history. Once `capacity` events are held, each new event
/// evicts the oldest one and the eviction is counted.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
    evicted: u64,
}

impl EventLog {
    /// Capacity is at least one event. Storage grows on demand.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events evicted since creation or the last [`clear`](Self::clear).
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, Event> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = vec_deque::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Called with each event as it is recorded.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Called with a fresh snapshot after every operation that changed the world.
pub type ChangeListener = Box<dyn FnMut(&WorldSnapshot)>;
