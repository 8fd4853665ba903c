//! Presentation-support output for ticket cards.
//!
//! The core does not render anything; these helpers give the UI layer one
//! place to get status labels, badge colors, and card timestamps so every
//! surface agrees on them.

use chrono::{DateTime, Local, Utc};

use crate::ticket::Status;

/// UI label for a status.
pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Open => "Pendiente",
        Status::InProgress => "En progreso",
        Status::Resolved => "Resuelto",
    }
}

/// Indicator emoji paired with the label.
pub fn status_emoji(status: Status) -> &'static str {
    match status {
        Status::Open => "\u{1F7E1}",
        Status::InProgress => "\u{1F7E0}",
        Status::Resolved => "\u{1F7E2}",
    }
}

/// Badge background color name for a status.
pub fn status_color(status: Status) -> &'static str {
    match status {
        Status::Open => "yellow",
        Status::InProgress => "blue",
        Status::Resolved => "green",
    }
}

/// Full card label, e.g. `🟡 Pendiente`.
pub fn format_status(status: Status) -> String {
    format!("{} {}", status_emoji(status), status_label(status))
}

/// Card timestamp in the viewer's local time, `d/m/yyyy hh:mm AM|PM`.
pub fn format_timestamp(created_at: DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%-d/%-m/%Y %I:%M %p")
        .to_string()
}
