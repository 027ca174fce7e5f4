//! Registry event log
//!
//! Audit trail of scope and binding lifecycle transitions.
//! - Event: envelope with id + timestamp + kind
//! - EventKind: scope level and binding level variants
//! - EventLog: thread-safe ring buffer, cheap to clone (shared storage)
//!
//! The log keeps the most recent `capacity` events; older ones are
//! evicted. Ids keep counting across evictions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the registry log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since the registry was created (ms)
    pub timestamp_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // SCOPE LEVEL
    // ═══════════════════════════════════════════
    ScopeCreated {
        scope: Arc<str>,
        ready: bool,
    },
    ScopeReady {
        scope: Arc<str>,
        /// Pending bindings activated by this transition
        activated: usize,
    },

    // ═══════════════════════════════════════════
    // BINDING LEVEL
    // ═══════════════════════════════════════════
    BindingPending {
        scope: Arc<str>,
        name: Arc<str>,
        depends_on: Arc<str>,
    },
    BindingActivated {
        scope: Arc<str>,
        name: Arc<str>,
    },
    BindingReleased {
        scope: Arc<str>,
        name: Arc<str>,
    },

    // ═══════════════════════════════════════════
    // DEPLOYMENT LEVEL
    // ═══════════════════════════════════════════
    OwnerTornDown {
        owner: Arc<str>,
        released: usize,
    },
}

impl EventKind {
    /// Scope the event refers to, if any
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::ScopeCreated { scope, .. }
            | Self::ScopeReady { scope, .. }
            | Self::BindingPending { scope, .. }
            | Self::BindingActivated { scope, .. }
            | Self::BindingReleased { scope, .. } => Some(scope),
            Self::OwnerTornDown { .. } => None,
        }
    }

    /// Binding name the event refers to, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::BindingPending { name, .. }
            | Self::BindingActivated { name, .. }
            | Self::BindingReleased { name, .. } => Some(name),
            Self::ScopeCreated { .. } | Self::ScopeReady { .. } | Self::OwnerTornDown { .. } => {
                None
            }
        }
    }

}

/// Events retained by `EventLog::new`
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Thread-safe, bounded event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Event>>>,
    capacity: usize,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Log retaining at most `capacity` events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        // id is assigned under the write lock so log order matches id order
        let mut events = self.events.write();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        });
        id
    }

    /// Get retained events (cloned, oldest first)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().iter().cloned().collect()
    }

    /// Take every retained event, leaving the log empty
    pub fn drain(&self) -> Vec<Event> {
        self.events.write().drain(..).collect()
    }

    /// Events touching one scope
    pub fn filter_scope(&self, scope: &str) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind.scope() == Some(scope))
            .cloned()
            .collect()
    }

    /// Events for one binding name within a scope
    pub fn filter_binding(&self, scope: &str, name: &str) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind.scope() == Some(scope) && e.kind.name() == Some(name))
            .cloned()
            .collect()
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}
