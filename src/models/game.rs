//! Match state, Team, Location and the history ledger entry.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Players per team slot. A team is full at exactly this size.
pub const TEAM_SIZE: usize = 4;

/// Players needed to seat both teams.
pub const PLAYERS_PER_MATCH: usize = 2 * TEAM_SIZE;

/// Score a side needs (with a lead of `WIN_MARGIN`) to win.
pub const TARGET_SCORE: u32 = 15;

/// Lead required at or above `TARGET_SCORE`.
pub const WIN_MARGIN: u32 = 2;

/// Reaching this score wins regardless of margin.
pub const HARD_CAP: u32 = 18;

/// Consecutive wins after which both teams rotate out.
pub const STREAK_LIMIT: u32 = 2;

/// One of the two team slots.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Team {
    #[default]
    A,
    B,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// A container a player id can sit in (drag source / target).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Queue,
    TeamA,
    TeamB,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Queue => write!(f, "queue"),
            Location::TeamA => write!(f, "team A"),
            Location::TeamB => write!(f, "team B"),
        }
    }
}

impl From<Team> for Location {
    fn from(team: Team) -> Self {
        match team {
            Team::A => Location::TeamA,
            Team::B => Location::TeamB,
        }
    }
}

/// Lifecycle phase of the match, derived from `MatchState::active`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// No match running; teams may be edited.
    Idle,
    /// Score is being tracked; team membership is frozen.
    Active,
}

/// The live match: team slots, score and win-streak tracking.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub active: bool,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    pub score_a: u32,
    pub score_b: u32,
    pub streak_count: u32,
    /// Ids of the team currently on a win streak; empty if none.
    pub streak_holder: Vec<PlayerId>,
}

impl MatchState {
    pub fn phase(&self) -> MatchPhase {
        if self.active {
            MatchPhase::Active
        } else {
            MatchPhase::Idle
        }
    }

    pub fn team(&self, team: Team) -> &[PlayerId] {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    pub(crate) fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::A => &mut self.score_a,
            Team::B => &mut self.score_b,
        }
    }

    /// Both slots hold exactly `TEAM_SIZE` players.
    pub fn teams_full(&self) -> bool {
        self.team_a.len() == TEAM_SIZE && self.team_b.len() == TEAM_SIZE
    }

    pub fn teams_empty(&self) -> bool {
        self.team_a.is_empty() && self.team_b.is_empty()
    }

    pub fn is_seated(&self, id: PlayerId) -> bool {
        self.team_a.contains(&id) || self.team_b.contains(&id)
    }

    /// Winner under the current score, if the match is decided.
    pub fn winner(&self) -> Option<Team> {
        winner(self.score_a, self.score_b)
    }

    /// Score formatted the way history stores it: `"scoreA-scoreB"`.
    pub fn score_line(&self) -> String {
        format!("{}-{}", self.score_a, self.score_b)
    }
}

/// Win predicate: first to 15, win by 2, capped at 18.
///
/// A side sitting exactly on `HARD_CAP` wins regardless of margin (team A is
/// checked first). Otherwise a side at `TARGET_SCORE` or above with a lead of
/// at least `WIN_MARGIN` wins.
pub fn winner(score_a: u32, score_b: u32) -> Option<Team> {
    if score_a == HARD_CAP {
        return Some(Team::A);
    }
    if score_b == HARD_CAP {
        return Some(Team::B);
    }
    if score_a >= TARGET_SCORE && score_a >= score_b + WIN_MARGIN {
        return Some(Team::A);
    }
    if score_b >= TARGET_SCORE && score_b >= score_a + WIN_MARGIN {
        return Some(Team::B);
    }
    None
}

/// True when both slices hold the same ids, ignoring order (team identity).
pub fn same_players(a: &[PlayerId], b: &[PlayerId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    a == b
}

/// A concluded match. Never edited once appended.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub winner: Team,
    /// `"scoreA-scoreB"` at the moment the match ended.
    pub final_score: String,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
}

impl HistoryEntry {
    pub fn winners(&self) -> &[PlayerId] {
        match self.winner {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    pub fn losers(&self) -> &[PlayerId] {
        match self.winner {
            Team::A => &self.team_b,
            Team::B => &self.team_a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_requires_target_and_margin() {
        assert_eq!(winner(15, 0), Some(Team::A));
        assert_eq!(winner(14, 0), None);
        assert_eq!(winner(15, 14), None);
        assert_eq!(winner(16, 14), Some(Team::A));
        assert_eq!(winner(13, 15), Some(Team::B));
    }

    #[test]
    fn hard_cap_ends_deadlock() {
        assert_eq!(winner(17, 17), None);
        assert_eq!(winner(18, 17), Some(Team::A));
        assert_eq!(winner(14, 18), Some(Team::B));
        assert_eq!(winner(17, 18), Some(Team::B));
    }

    #[test]
    fn cap_is_an_exact_score_checked_for_a_first() {
        assert_eq!(winner(18, 19), Some(Team::A));
        assert_eq!(winner(19, 18), Some(Team::B));
        assert_eq!(winner(18, 18), Some(Team::A));
        // Past the cap without sitting on it, the margin rule decides.
        assert_eq!(winner(20, 19), None);
        assert_eq!(winner(21, 19), Some(Team::A));
    }

    #[test]
    fn same_players_ignores_order() {
        let ids: Vec<PlayerId> = (0..4).map(|_| uuid::Uuid::new_v4()).collect();
        let mut reversed = ids.clone();
        reversed.reverse();
        assert!(same_players(&ids, &reversed));
        assert!(!same_players(&ids, &ids[..3]));
        assert!(!same_players(&[], &ids));
    }
}
