//! In-memory implementation of the remote collection.
//!
//! Behaves like the managed backend as far as the engine can observe:
//! assigns ids and timestamps on create, and broadcasts a complete
//! snapshot to every live subscriber after each mutation (including the
//! initial snapshot at subscribe time). Used for tests and local
//! development; supports fault injection for exercising error paths.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use tiq_core::{Ticket, TicketId};

use crate::remote::{CollectionSnapshot, NewTicket, RemoteCollection, RemoteError, Subscription};

type PushSender = mpsc::UnboundedSender<Result<CollectionSnapshot, RemoteError>>;

#[derive(Default)]
struct Inner {
    tickets: Vec<Ticket>,
    subscribers: Vec<PushSender>,
    fail_next_create: Option<RemoteError>,
    fail_next_delete: Option<RemoteError>,
    create_calls: usize,
}

/// In-memory remote collection.
#[derive(Default)]
pub struct InMemoryRemote {
    inner: Mutex<Inner>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing collection.
    pub fn seeded(tickets: Vec<Ticket>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tickets,
                ..Default::default()
            }),
        }
    }

    /// Replace the collection wholesale and push it to subscribers, as if
    /// another client had changed the remote state.
    pub fn push_snapshot(&self, tickets: Vec<Ticket>) {
        let mut inner = self.lock();
        inner.tickets = tickets;
        Self::broadcast(&mut inner);
    }

    /// Terminate every live subscription with a transport error.
    pub fn fail_subscriptions(&self, message: &str) {
        let mut inner = self.lock();
        for tx in inner.subscribers.drain(..) {
            let _ = tx.send(Err(RemoteError::Transport(message.to_string())));
        }
    }

    /// Make the next `create` call fail with the given error.
    pub fn fail_next_create(&self, error: RemoteError) {
        self.lock().fail_next_create = Some(error);
    }

    /// Make the next `delete` call fail with the given error.
    pub fn fail_next_delete(&self, error: RemoteError) {
        self.lock().fail_next_delete = Some(error);
    }

    /// Remote-side collection contents.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.lock().tickets.clone()
    }

    /// How many `create` calls reached the backend.
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn broadcast(inner: &mut Inner) {
        let snapshot = inner.tickets.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
    }
}

#[async_trait]
impl RemoteCollection for InMemoryRemote {
    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Initial push: the collection as it stands at subscribe time.
        let _ = tx.send(Ok(inner.tickets.clone()));
        inner.subscribers.push(tx);
        Ok(Subscription::new(rx))
    }

    async fn create(&self, ticket: NewTicket) -> Result<Ticket, RemoteError> {
        let mut inner = self.lock();
        inner.create_calls += 1;
        if let Some(error) = inner.fail_next_create.take() {
            return Err(error);
        }
        let created = Ticket {
            id: Uuid::new_v4(),
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            done_by: ticket.done_by,
            user_email: ticket.user_email,
            created_at: Utc::now(),
        };
        inner.tickets.push(created.clone());
        Self::broadcast(&mut inner);
        Ok(created)
    }

    async fn delete(&self, id: TicketId) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_delete.take() {
            return Err(error);
        }
        let before = inner.tickets.len();
        inner.tickets.retain(|t| t.id != id);
        if inner.tickets.len() == before {
            return Err(RemoteError::NotFound(id));
        }
        Self::broadcast(&mut inner);
        Ok(())
    }
}
