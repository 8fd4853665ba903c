use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::Snapshot;
use crate::ticket::{Status, Ticket};

/// Status dimension of a ticket query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    /// Every status passes.
    #[default]
    All,
    /// Only tickets with exactly this status pass.
    Only(Status),
}

impl StatusFilter {
    pub fn accepts(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == wanted,
        }
    }
}

/// A filter over the ticket collection: free-text search on the title plus
/// a status category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQuery {
    /// Case-insensitive substring match against the title. Empty matches
    /// everything.
    pub search: String,
    pub status: StatusFilter,
}

impl TicketQuery {
    /// Whether this query matches everything.
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.status == StatusFilter::All
    }

    /// Whether a single ticket satisfies the query.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.accepts(ticket.status)
            && ticket
                .title
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }
}

/// Derive the filtered view of a snapshot.
///
/// Pure: no side effects, input order preserved, no sorting. Safe to call
/// on every render.
pub fn project(tickets: &[Ticket], query: &TicketQuery) -> Vec<Ticket> {
    let needle = query.search.to_lowercase();
    tickets
        .iter()
        .filter(|t| query.status.accepts(t.status) && t.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Memoizing wrapper around [`project`].
///
/// Recomputes only when the snapshot version or the query changes, so a
/// presentation layer can re-project on every poll without cost.
#[derive(Debug, Default)]
pub struct Projector {
    cached: Option<(u64, TicketQuery, Arc<[Ticket]>)>,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&mut self, snapshot: &Snapshot, query: &TicketQuery) -> Arc<[Ticket]> {
        if let Some((version, cached_query, result)) = &self.cached {
            if *version == snapshot.version() && cached_query == query {
                return Arc::clone(result);
            }
        }
        let result: Arc<[Ticket]> = Arc::from(project(snapshot.tickets(), query));
        self.cached = Some((snapshot.version(), query.clone(), Arc::clone(&result)));
        result
    }
}
