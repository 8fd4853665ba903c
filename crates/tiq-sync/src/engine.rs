//! The sync engine: one live subscription in, mutation calls out.
//!
//! The engine owns the only write path into the [`TicketStore`]. A single
//! pump task applies subscription pushes in arrival order; create/delete
//! intent goes straight to the remote and becomes visible locally only
//! when the authoritative stream echoes it back.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use tiq_core::{TicketDraft, TicketId, TicketStore, ValidationError};

use crate::config::SyncConfig;
use crate::remote::{NewTicket, RemoteCollection, RemoteError};

/// Observable lifecycle of an engine instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EngineStatus {
    /// No subscription. Initial state, and the state after `stop`.
    #[default]
    Unsubscribed,
    /// Subscription handshake in flight, no push received yet.
    Subscribing,
    /// Receiving pushes.
    Live,
    /// The subscription failed. No further updates arrive until `start`
    /// is called again; the payload is the failure description.
    Errored(String),
}

impl EngineStatus {
    /// Whether a subscription is established or being established.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Subscribing | Self::Live)
    }
}

/// Error from a create request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreateError {
    /// The draft failed local validation; no remote call was made.
    #[error("draft validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<ValidationError>),

    /// The backend rejected the create call.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Status channel shared between the engine and its pump task.
///
/// Each `start` opens a new epoch; a pump from a previous epoch can no
/// longer publish status, so a push racing `stop` cannot resurrect a
/// stale `Live`.
struct StatusGate {
    epoch: Mutex<u64>,
    tx: watch::Sender<EngineStatus>,
}

impl StatusGate {
    fn new() -> Self {
        let (tx, _) = watch::channel(EngineStatus::default());
        Self {
            epoch: Mutex::new(0),
            tx,
        }
    }

    /// Engine-side transition: invalidates all prior epochs and publishes.
    /// Returns the new epoch for the pump spawned alongside it.
    fn advance(&self, status: EngineStatus) -> u64 {
        let mut epoch = self.epoch.lock().unwrap_or_else(|e| e.into_inner());
        *epoch += 1;
        self.tx.send_replace(status);
        *epoch
    }

    /// Run a store write only while the epoch is current. The lock spans
    /// the write, so a concurrent `stop` either sees it complete or
    /// prevents it entirely; a stopped engine never writes the store.
    fn apply_if_current(&self, epoch: u64, write: impl FnOnce()) -> bool {
        let current = self.epoch.lock().unwrap_or_else(|e| e.into_inner());
        if *current != epoch {
            return false;
        }
        write();
        true
    }

    /// Pump-side transition: publishes only while its epoch is current,
    /// and only when the status actually changes.
    fn publish(&self, epoch: u64, status: EngineStatus) {
        let current = self.epoch.lock().unwrap_or_else(|e| e.into_inner());
        if *current != epoch {
            return;
        }
        self.tx.send_if_modified(|value| {
            if *value == status {
                false
            } else {
                *value = status;
                true
            }
        });
    }
}

/// Bridges the remote push-based collection and the local ticket store.
///
/// Construct one per store and inject it wherever tickets are created or
/// deleted; there is no implicit process-wide instance. `start` and
/// `stop` manage the single live subscription; both are idempotent. Must
/// be used from within a tokio runtime.
pub struct SyncEngine {
    remote: Arc<dyn RemoteCollection>,
    store: Arc<TicketStore>,
    config: SyncConfig,
    status: Arc<StatusGate>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteCollection>,
        store: Arc<TicketStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            store,
            config,
            status: Arc::new(StatusGate::new()),
            pump: Mutex::new(None),
        }
    }

    /// The store this engine writes to.
    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    /// Watch the engine lifecycle, e.g. for a connection indicator.
    pub fn status(&self) -> watch::Receiver<EngineStatus> {
        self.status.tx.subscribe()
    }

    /// Current lifecycle state.
    pub fn current_status(&self) -> EngineStatus {
        self.status.tx.borrow().clone()
    }

    /// Establish the live subscription. A no-op while one is already
    /// being established or running.
    pub fn start(&self) {
        let mut pump = self.pump.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pump.as_ref() {
            if !handle.is_finished() {
                tracing::debug!("start ignored, subscription already active");
                return;
            }
        }

        tracing::info!("starting subscription");
        let epoch = self.status.advance(EngineStatus::Subscribing);
        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let status = Arc::clone(&self.status);
        *pump = Some(tokio::spawn(run_pump(remote, store, status, epoch)));
    }

    /// Release the subscription, cancelling a pending handshake if one is
    /// in flight. In-flight create/delete calls complete or fail
    /// independently. Idempotent.
    pub fn stop(&self) {
        let mut pump = self.pump.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pump.take() {
            handle.abort();
            tracing::info!("subscription released");
        }
        self.status.advance(EngineStatus::Unsubscribed);
    }

    /// Validate and submit a create mutation.
    ///
    /// Validation failures return before any remote call. A successful
    /// call does not touch the local store: the new ticket becomes
    /// visible through the next subscription push.
    pub async fn create_ticket(&self, draft: TicketDraft) -> Result<(), CreateError> {
        draft.validate().map_err(CreateError::Validation)?;

        let ticket = NewTicket {
            title: draft.title,
            description: draft.description,
            status: draft.status.unwrap_or_default(),
            done_by: draft.done_by,
            user_email: self.config.user_email.clone(),
        };
        let created = self.remote.create(ticket).await.map_err(|err| {
            tracing::warn!(%err, "create rejected by remote");
            CreateError::Remote(err)
        })?;
        tracing::info!(id = %created.id, "ticket accepted by remote");
        Ok(())
    }

    /// Submit a delete mutation. Deleting an id the backend no longer
    /// knows surfaces as a recoverable [`RemoteError`]; local state is
    /// untouched either way until the next push.
    pub async fn delete_ticket(&self, id: TicketId) -> Result<(), RemoteError> {
        self.remote.delete(id).await.map_err(|err| {
            tracing::warn!(%id, %err, "delete rejected by remote");
            err
        })
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(handle) = self
            .pump
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}

/// Single writer to the store: applies pushes strictly in arrival order,
/// never concurrently. An incoming push is never blocked on a pending
/// mutation call.
async fn run_pump(
    remote: Arc<dyn RemoteCollection>,
    store: Arc<TicketStore>,
    status: Arc<StatusGate>,
    epoch: u64,
) {
    let mut subscription = match remote.subscribe().await {
        Ok(subscription) => subscription,
        Err(err) => {
            tracing::error!(%err, "subscription handshake failed");
            status.publish(epoch, EngineStatus::Errored(err.to_string()));
            return;
        }
    };

    while let Some(push) = subscription.next().await {
        match push {
            Ok(snapshot) => {
                tracing::debug!(tickets = snapshot.len(), "push received");
                if !status.apply_if_current(epoch, || store.replace_all(snapshot)) {
                    return;
                }
                status.publish(epoch, EngineStatus::Live);
            }
            Err(err) => {
                tracing::error!(%err, "subscription stream failed");
                status.publish(epoch, EngineStatus::Errored(err.to_string()));
                return;
            }
        }
    }

    // The remote closed the stream without an error marker; no further
    // updates will arrive, which callers cannot tell apart from a
    // transport loss.
    tracing::error!("subscription stream closed by remote");
    status.publish(
        epoch,
        EngineStatus::Errored("subscription stream closed".into()),
    );
}
