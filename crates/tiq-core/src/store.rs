use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

use crate::ticket::{Ticket, TicketId};

/// A point-in-time copy of the ticket collection.
///
/// Cheap to clone (the ticket slice is shared); callers cannot mutate it
/// in place. The version increases by one on every `replace_all`, so it
/// doubles as a cache key for memoized projections.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tickets: Arc<[Ticket]>,
    version: u64,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            tickets: Arc::from(Vec::<Ticket>::new()),
            version: 0,
        }
    }

    /// Tickets in subscription order.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Look up a ticket by id.
    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }
}

/// Events emitted by the ticket store when its contents change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The entire snapshot was replaced by a subscription push.
    SnapshotReplaced { version: u64 },
}

/// The authoritative local snapshot of the remote ticket collection.
///
/// Written only by the sync engine (subscription pushes arrive as complete
/// snapshots, not deltas); everything else reads. Readers never observe a
/// partially-swapped state: the current snapshot is swapped atomically and
/// handed out by `Arc` clone.
pub struct TicketStore {
    current: RwLock<Snapshot>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Snapshot::empty()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Atomically replace the entire contents with a freshly pushed snapshot.
    ///
    /// Duplicate ids never legitimately appear in a push; if one does, the
    /// first occurrence wins and the rest are dropped with a warning.
    /// Emits exactly one `SnapshotReplaced` per call, even when the new
    /// contents are identical to the old.
    pub fn replace_all(&self, tickets: Vec<Ticket>) {
        let mut seen = HashSet::with_capacity(tickets.len());
        let mut deduped = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            if seen.insert(ticket.id) {
                deduped.push(ticket);
            } else {
                tracing::warn!(id = %ticket.id, "dropping duplicate ticket id in push");
            }
        }

        let version = {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            let version = current.version + 1;
            *current = Snapshot {
                tickets: Arc::from(deduped),
                version,
            };
            version
        };
        tracing::debug!(version, "applied snapshot");
        self.notify(StoreEvent::SnapshotReplaced { version });
    }

    /// Current snapshot, shared read-only.
    pub fn snapshot(&self) -> Snapshot {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Subscribe to change notifications. Disconnected receivers are pruned
    /// on the next notification.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Look up a ticket by id in the current snapshot.
    pub fn get(&self, id: TicketId) -> Option<Ticket> {
        self.snapshot().get(id).cloned()
    }

    fn notify(&self, event: StoreEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new()
    }
}
