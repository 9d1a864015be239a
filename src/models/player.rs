//! Player and PlayerStats data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in queue, team slots and history).
pub type PlayerId = Uuid;

/// Statistics view of a player (for API / display).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    pub is_present: bool,
}

impl PlayerStats {
    pub fn from_player(p: &Player) -> Self {
        Self {
            wins: p.wins,
            losses: p.losses(),
            games_played: p.games_played,
            is_present: p.is_present,
        }
    }
}

/// A player on the session roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_present: bool,
    pub wins: u32,
    pub games_played: u32,
}

impl Player {
    /// Create a new player with the given name. Present, with no games recorded.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_present: true,
            wins: 0,
            games_played: 0,
        }
    }

    /// Current stats as a separate struct (for API responses).
    pub fn stats(&self) -> PlayerStats {
        PlayerStats::from_player(self)
    }

    /// Losses are derived: every game played that was not won.
    pub fn losses(&self) -> u32 {
        self.games_played.saturating_sub(self.wins)
    }

    /// Record a won match.
    pub fn record_win(&mut self) {
        self.wins += 1;
        self.games_played += 1;
    }

    /// Record a lost match.
    pub fn record_loss(&mut self) {
        self.games_played += 1;
    }
}
