//! The remote collection as an opaque capability.
//!
//! The managed backend owns the canonical ticket collection. This module
//! models the three things it offers: a live subscription yielding complete
//! snapshots on every observed change, and create/delete mutation calls
//! whose effects manifest through that subscription, not through their
//! return values.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use tiq_core::{Status, Ticket, TicketId};

/// A complete point-in-time copy of the remote collection, as delivered by
/// a subscription push. Never a delta.
pub type CollectionSnapshot = Vec<Ticket>;

/// Errors from the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The backend rejected the request.
    #[error("remote rejected the request: {0}")]
    Rejected(String),

    /// No ticket with this id exists remotely.
    #[error("ticket not found: {0}")]
    NotFound(TicketId),

    /// The caller is not allowed to perform the operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Network or channel failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Fields of a create mutation. The remote store assigns `id` and
/// `created_at`; the created ticket is expected to subsequently appear in
/// the subscription stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub done_by: Option<String>,
    pub user_email: Option<String>,
}

/// A live subscription to the remote collection.
///
/// Yields `Ok(snapshot)` on every observed change, starting with the
/// collection as it stood at subscribe time. Yields at most one `Err`
/// (a transport failure), after which the stream is finished. Dropping the
/// subscription unsubscribes.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Result<CollectionSnapshot, RemoteError>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Result<CollectionSnapshot, RemoteError>>,
    ) -> Self {
        Self { receiver }
    }

    /// Next push, or `None` once the stream is finished.
    pub async fn next(&mut self) -> Option<Result<CollectionSnapshot, RemoteError>> {
        self.receiver.recv().await
    }
}

/// The capability offered by the managed backend.
///
/// Implementations are injected into the sync engine as
/// `Arc<dyn RemoteCollection>`; there is no implicit process-wide client.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Establish a fresh live subscription to the collection.
    async fn subscribe(&self) -> Result<Subscription, RemoteError>;

    /// Create a ticket. On success the created ticket is returned and will
    /// also arrive through the subscription stream.
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, RemoteError>;

    /// Delete a ticket by id. Rejections (not found, unauthorized) surface
    /// as `RemoteError`.
    async fn delete(&self, id: TicketId) -> Result<(), RemoteError>;
}
