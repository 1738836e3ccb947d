//! Task domain model shared by the REST service and the terminal client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two valid task states. Anything else is rejected before it reaches
/// the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    /// Parse a client-supplied status string. Input is lower-cased first,
    /// so "Pending" and "DONE" are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task record as it travels over the wire.
///
/// `created_at` is an RFC 3339 timestamp set once by the store and used
/// only for display ("time since creation").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}
