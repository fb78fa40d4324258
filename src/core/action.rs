//! Action records and action-log segments.
//!
//! The simulation describes every state delta it performs as an
//! `ActionRecord`. Records are grouped into `ActionLog` segments: one segment
//! per slice of play (before a turn, after each command, after the end-of-turn
//! transition). The orchestrator never interprets the action payload; it only
//! checks whether a segment is empty and forwards it to replay storage and the
//! animation sink.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::team::TeamId;

/// A recorded state delta with metadata for ordering.
///
/// Used for:
/// - Replay reconstruction
/// - Live animation
/// - Debugging
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord<A> {
    /// The team whose turn produced this record.
    pub team: TeamId,

    /// Turn number when the record was produced.
    pub turn: u32,

    /// Sequence number within the turn (for ordering).
    pub sequence: u32,

    /// Simulation-defined payload.
    pub action: A,
}

impl<A> ActionRecord<A> {
    /// Create a new action record.
    #[must_use]
    pub fn new(team: TeamId, turn: u32, sequence: u32, action: A) -> Self {
        Self {
            team,
            turn,
            sequence,
            action,
        }
    }
}

/// An ordered batch of action records produced between two checkpoints.
///
/// Most segments hold a handful of records, so they live inline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "A: Serialize",
    deserialize = "A: Deserialize<'de>"
))]
pub struct ActionLog<A> {
    records: SmallVec<[ActionRecord<A>; 4]>,
}

impl<A> Default for ActionLog<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> ActionLog<A> {
    /// Create an empty segment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: SmallVec::new(),
        }
    }

    /// Append a record.
    pub fn push(&mut self, record: ActionRecord<A>) {
        self.records.push(record);
    }

    /// Move all records of `other` to the end of this segment.
    pub fn append(&mut self, other: ActionLog<A>) {
        self.records.extend(other.records);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the segment carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord<A>> {
        self.records.iter()
    }

    /// Records as a slice.
    #[must_use]
    pub fn records(&self) -> &[ActionRecord<A>] {
        &self.records
    }

    /// Return the current records and leave this segment empty.
    pub fn take(&mut self) -> ActionLog<A> {
        std::mem::take(self)
    }
}

impl<A> FromIterator<ActionRecord<A>> for ActionLog<A> {
    fn from_iter<I: IntoIterator<Item = ActionRecord<A>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<A> IntoIterator for ActionLog<A> {
    type Item = ActionRecord<A>;
    type IntoIter = smallvec::IntoIter<[ActionRecord<A>; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
