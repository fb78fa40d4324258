//! Team identification and per-team storage.
//!
//! ## TeamId
//!
//! Type-safe team slot identifier supporting 1-255 teams.
//!
//! ## TeamMap
//!
//! Fixed-size per-team storage backed by `Vec` for O(1) access. A `TeamMap`
//! is sized once at construction and never grows or shrinks, which is what
//! keeps "one player handler per team slot" true for a whole match.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Team slot identifier supporting 1-255 teams.
///
/// Team indices are 0-based: the first team is `TeamId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Create a new team ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw team index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all team IDs for a match with `team_count` teams.
    ///
    /// ```
    /// use rust_arena::core::TeamId;
    ///
    /// let teams: Vec<_> = TeamId::all(3).collect();
    /// assert_eq!(teams, vec![TeamId::new(0), TeamId::new(1), TeamId::new(2)]);
    /// ```
    pub fn all(team_count: usize) -> impl Iterator<Item = TeamId> {
        (0..team_count as u8).map(TeamId)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// Per-team data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use rust_arena::core::{TeamId, TeamMap};
///
/// let mut life: TeamMap<i64> = TeamMap::new(2, |_| 20);
/// life[TeamId::new(1)] -= 5;
/// assert_eq!(life[TeamId::new(1)], 15);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamMap<T> {
    data: Vec<T>,
}

impl<T> TeamMap<T> {
    /// Create a new TeamMap with values from a factory function.
    pub fn new(team_count: usize, factory: impl FnMut(TeamId) -> T) -> Self {
        assert!(team_count > 0, "Must have at least 1 team");
        assert!(team_count <= 255, "At most 255 teams supported");

        let data = (0..team_count as u8).map(TeamId).map(factory).collect();

        Self { data }
    }

    /// Create a TeamMap with all entries set to the same value.
    pub fn with_value(team_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(team_count, |_| value.clone())
    }

    /// Wrap an already-built vector, one entry per team.
    ///
    /// Returns `None` for an empty vector or more than 255 entries.
    #[must_use]
    pub fn from_vec(data: Vec<T>) -> Option<Self> {
        if data.is_empty() || data.len() > 255 {
            return None;
        }
        Some(Self { data })
    }

    /// Get the number of teams.
    #[must_use]
    pub fn team_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to a team's data, or `None` if the slot doesn't exist.
    #[must_use]
    pub fn get(&self, team: TeamId) -> Option<&T> {
        self.data.get(team.index())
    }

    /// Get a mutable reference to a team's data.
    pub fn get_mut(&mut self, team: TeamId) -> Option<&mut T> {
        self.data.get_mut(team.index())
    }

    /// Iterate over (TeamId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TeamId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (TeamId(i as u8), v))
    }

    /// Iterate over the values in team order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T> Index<TeamId> for TeamMap<T> {
    type Output = T;

    fn index(&self, team: TeamId) -> &Self::Output {
        &self.data[team.index()]
    }
}

impl<T> IndexMut<TeamId> for TeamMap<T> {
    fn index_mut(&mut self, team: TeamId) -> &mut Self::Output {
        &mut self.data[team.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_id_basics() {
        let t0 = TeamId::new(0);
        let t1 = TeamId::new(1);

        assert_eq!(t0.index(), 0);
        assert_eq!(t1.index(), 1);
        assert_eq!(format!("{}", t1), "Team 1");
        assert!(t0 < t1);
    }

    #[test]
    fn test_team_id_all() {
        let teams: Vec<_> = TeamId::all(4).collect();
        assert_eq!(teams.len(), 4);
        assert_eq!(teams[0], TeamId::new(0));
        assert_eq!(teams[3], TeamId::new(3));
    }

    #[test]
    fn test_team_map_new() {
        let map: TeamMap<i32> = TeamMap::new(3, |t| t.index() as i32 * 10);

        assert_eq!(map[TeamId::new(0)], 0);
        assert_eq!(map[TeamId::new(1)], 10);
        assert_eq!(map[TeamId::new(2)], 20);
        assert_eq!(map.team_count(), 3);
    }

    #[test]
    fn test_team_map_from_vec() {
        let map = TeamMap::from_vec(vec!["a", "b"]).unwrap();
        assert_eq!(map.team_count(), 2);
        assert_eq!(map.get(TeamId::new(1)), Some(&"b"));
        assert_eq!(map.get(TeamId::new(2)), None);

        assert!(TeamMap::<u8>::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_team_map_mutation_and_values() {
        let mut map: TeamMap<i32> = TeamMap::with_value(2, 0);
        map[TeamId::new(0)] = 7;
        if let Some(v) = map.get_mut(TeamId::new(1)) {
            *v = 9;
        }

        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![7, 9]);

        for (team, value) in map.iter_mut() {
            *value += team.index() as i32;
        }
        assert_eq!(map[TeamId::new(1)], 10);
    }

    #[test]
    fn test_team_map_serialization() {
        let map: TeamMap<i32> = TeamMap::new(2, |t| t.index() as i32 + 1);
        let json = serde_json::to_string(&map).unwrap();
        let deserialized: TeamMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, deserialized);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 team")]
    fn test_team_map_zero_teams() {
        let _: TeamMap<i32> = TeamMap::with_value(0, 0);
    }
}
