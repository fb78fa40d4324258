//! Player registry for lookup by name.
//!
//! The `PlayerRegistry` stores every player implementation a deployment can
//! field, keyed by the name run configurations refer to.

use rustc_hash::FxHashMap;

use super::agent::{IdleBot, PlayerSpec};
use crate::error::ConfigError;
use crate::simulation::Simulation;

/// Registry of available player implementations.
///
/// ## Example
///
/// ```
/// use rust_arena::games::simple::SimpleGame;
/// use rust_arena::player::{IdleBot, PlayerRegistry, PlayerSpec};
///
/// let mut registry = PlayerRegistry::<SimpleGame>::new();
/// registry.register(PlayerSpec::bot("idle", || IdleBot));
///
/// assert_eq!(registry.get("idle").unwrap().name(), "idle");
/// assert!(registry.get("missing").is_err());
/// ```
pub struct PlayerRegistry<S: Simulation> {
    players: FxHashMap<String, PlayerSpec<S>>,
}

impl<S: Simulation> Default for PlayerRegistry<S> {
    fn default() -> Self {
        Self {
            players: FxHashMap::default(),
        }
    }
}

impl<S: Simulation> Clone for PlayerRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            players: self.players.clone(),
        }
    }
}

impl<S: Simulation> std::fmt::Debug for PlayerRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRegistry").field("players", &self.names()).finish()
    }
}

impl<S: Simulation> PlayerRegistry<S> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `idle` bot.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PlayerSpec::bot("idle", || IdleBot));
        registry
    }

    /// Register a player under its display name, replacing any previous
    /// entry with that name.
    pub fn register(&mut self, spec: PlayerSpec<S>) {
        self.players.insert(spec.name().to_string(), spec);
    }

    /// Look a player up by name.
    pub fn get(&self, name: &str) -> Result<&PlayerSpec<S>, ConfigError> {
        self.players
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPlayer(name.to_string()))
    }

    /// Whether a player is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.players.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::simple::{RandomBot, SimpleGame};

    #[test]
    fn test_builtin() {
        let registry = PlayerRegistry::<SimpleGame>::with_builtin();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("idle"));
        assert!(!registry.get("idle").unwrap().is_human());
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = PlayerRegistry::<SimpleGame>::new();
        assert!(registry.is_empty());
        registry.register(PlayerSpec::bot("zeta", || IdleBot));
        registry.register(PlayerSpec::bot("alpha", RandomBot::default));
        registry.register(PlayerSpec::bot("mid", || IdleBot));
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_unknown_player() {
        let registry = PlayerRegistry::<SimpleGame>::with_builtin();
        assert_eq!(
            registry.get("ghost").unwrap_err(),
            ConfigError::UnknownPlayer("ghost".to_string())
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = PlayerRegistry::<SimpleGame>::new();
        registry.register(PlayerSpec::bot("p", || IdleBot));
        registry.register(PlayerSpec::human("p", || IdleBot));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("p").unwrap().is_human());
    }
}
