//! Append-only audit log attached to every order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Note recorded as the first timeline entry of every order.
pub const ORDER_CREATED_NOTE: &str = "Order created";

/// A single timestamped timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    pub note: String,
}

/// Ordered, append-only sequence of [`TimelineEntry`] values.
///
/// Entries cannot be removed or edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline(Vec<TimelineEntry>);

impl Timeline {
    /// Starts a timeline with the "Order created" entry.
    pub fn started(at: DateTime<Utc>) -> Self {
        Self(vec![TimelineEntry {
            time: at,
            note: ORDER_CREATED_NOTE.to_string(),
        }])
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.0
    }

    pub fn first(&self) -> Option<&TimelineEntry> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
