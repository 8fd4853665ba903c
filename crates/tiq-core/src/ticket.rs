use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique ticket identifier (UUID v4), assigned by the remote store.
pub type TicketId = Uuid;

/// Ticket lifecycle status.
///
/// Remote payloads may omit the status entirely; an absent status decodes
/// as `Open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl Status {
    /// Wire representation, matching the remote collection's status strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A support ticket, as confirmed by the remote store.
///
/// `id` and `created_at` are remote-assigned and immutable. Tickets only
/// enter local state once the remote store has accepted them and echoed
/// them through the subscription channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub done_by: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validation error for a draft field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.message)
    }
}

/// User intent to create a ticket, prior to remote acceptance.
///
/// Submission consumes the draft; callers start over from
/// `TicketDraft::default()` rather than clearing fields in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    /// Status override; created tickets default to `Open`.
    pub status: Option<Status>,
    pub done_by: Option<String>,
}

impl TicketDraft {
    /// Validate the draft. Title and description must be non-empty after
    /// trimming whitespace. Returns all failing fields, not just the first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError {
                field: "title".into(),
                message: "must not be empty".into(),
            });
        }
        if self.description.trim().is_empty() {
            errors.push(ValidationError {
                field: "description".into(),
                message: "must not be empty".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
