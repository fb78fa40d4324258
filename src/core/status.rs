//! Match lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle value of a match.
///
/// ```text
/// Created -> Active -> (Paused <-> Active) -> Completed | Crashed
///    \-> Aborted (configuration rejected before the loop ran)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Constructed, not started.
    #[default]
    Created,
    /// The turn loop is running.
    Active,
    /// The turn loop is parked at its next safe point.
    Paused,
    /// Rejected before the turn loop started.
    Aborted,
    /// The simulation reported it is no longer active.
    Completed,
    /// An agent or the orchestration thread failed.
    Crashed,
}

impl Status {
    /// Whether the turn loop has been started and not yet finished.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Status::Active | Status::Paused)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Created => "CREATED",
            Status::Active => "ACTIVE",
            Status::Paused => "PAUSED",
            Status::Aborted => "ABORTED",
            Status::Completed => "COMPLETED",
            Status::Crashed => "CRASHED",
        };
        f.write_str(name)
    }
}
