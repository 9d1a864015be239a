//! Session: the single state value every transition operates on.

use crate::models::game::{HistoryEntry, Location, MatchState, TEAM_SIZE};
use crate::models::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current layout version of [`Session`]. Older snapshots are upgraded on load.
pub const STATE_VERSION: u32 = 1;

/// Errors returned by session transitions.
///
/// An `Err` always means the transition was a no-op: the session is exactly
/// as it was before the call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionError {
    /// Player name is empty or whitespace only.
    EmptyName,
    /// No player with this id on the roster.
    PlayerNotFound(PlayerId),
    /// Team membership cannot change while a match is running.
    MatchInProgress,
    /// Scoring or ending requires an active match.
    NoActiveMatch,
    /// Not enough players available to seat the teams.
    NotEnoughPlayers { required: usize, available: usize },
    /// Target team already holds four players.
    TeamFull(Location),
    /// The player is not in the given source container.
    NotInLocation { player: PlayerId, location: Location },
    /// A queue reorder must be a permutation of the current queue.
    InvalidQueueOrder,
    /// Court value must be a finite, non-negative amount.
    InvalidCourtValue,
    /// Confirm was called with no shared state staged.
    NoPendingImport,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::EmptyName => write!(f, "Player name cannot be empty"),
            SessionError::PlayerNotFound(_) => write!(f, "Player not found"),
            SessionError::MatchInProgress => write!(f, "A match is in progress"),
            SessionError::NoActiveMatch => write!(f, "No match is in progress"),
            SessionError::NotEnoughPlayers {
                required,
                available,
            } => write!(f, "Need {} players (have {})", required, available),
            SessionError::TeamFull(location) => write!(f, "{} is already full", location),
            SessionError::NotInLocation { location, .. } => {
                write!(f, "Player is not in {}", location)
            }
            SessionError::InvalidQueueOrder => {
                write!(f, "New queue order must contain exactly the queued players")
            }
            SessionError::InvalidCourtValue => write!(f, "Court value must be zero or more"),
            SessionError::NoPendingImport => write!(f, "No shared state waiting for import"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Side-channel settings used to split the court fee. Shared with the state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub pix_key: String,
    pub court_value: f64,
}

/// Full session state: roster, queue, match and the history ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub version: u32,
    pub players: Vec<Player>,
    /// Waiting players, front = next to enter a team.
    pub queue: Vec<PlayerId>,
    #[serde(rename = "match")]
    pub match_state: MatchState,
    /// Concluded matches, oldest first. Append-only.
    pub history: Vec<HistoryEntry>,
    pub settings: Settings,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session: no players, idle match.
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            players: Vec::new(),
            queue: Vec::new(),
            match_state: MatchState::default(),
            history: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// Create a session from a roster. Present players are queued in roster order.
    pub fn with_players(players: Vec<Player>) -> Self {
        let queue = players
            .iter()
            .filter(|p| p.is_present)
            .map(|p| p.id)
            .collect();
        Self {
            players,
            queue,
            ..Self::new()
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Display name for an id; ids of deleted players resolve to `"Unknown"`.
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map(|p| p.name.as_str()).unwrap_or("Unknown")
    }

    /// Which container currently holds this id, if any.
    pub fn location_of(&self, id: PlayerId) -> Option<Location> {
        if self.match_state.team_a.contains(&id) {
            Some(Location::TeamA)
        } else if self.match_state.team_b.contains(&id) {
            Some(Location::TeamB)
        } else if self.queue.contains(&id) {
            Some(Location::Queue)
        } else {
            None
        }
    }

    pub fn container(&self, location: Location) -> &[PlayerId] {
        match location {
            Location::Queue => &self.queue,
            Location::TeamA => &self.match_state.team_a,
            Location::TeamB => &self.match_state.team_b,
        }
    }

    pub(crate) fn container_mut(&mut self, location: Location) -> &mut Vec<PlayerId> {
        match location {
            Location::Queue => &mut self.queue,
            Location::TeamA => &mut self.match_state.team_a,
            Location::TeamB => &mut self.match_state.team_b,
        }
    }

    /// Add a player (present, zero stats) to the roster and the back of the queue.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, SessionError> {
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let player = Player::new(name_trimmed);
        let id = player.id;
        self.players.push(player);
        self.queue.push(id);
        log::debug!("added player {} ({})", name_trimmed, id);
        Ok(id)
    }

    /// Rename a player in place.
    pub fn edit_player_name(
        &mut self,
        player_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let p = self
            .get_player_mut(player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))?;
        p.name = name_trimmed.to_string();
        Ok(())
    }

    /// Remove a player from the roster, the queue and both team slots.
    ///
    /// History keeps the id. Removing someone from a running match leaves a
    /// short team, so that match is stopped (idle, score 0-0) without a
    /// history entry.
    pub fn delete_player(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))?;
        self.players.remove(idx);
        self.queue.retain(|&id| id != player_id);
        self.match_state.team_a.retain(|&id| id != player_id);
        self.match_state.team_b.retain(|&id| id != player_id);
        if self.stop_incomplete_match() {
            log::info!("deleted player {} was on court, match stopped", player_id);
        }
        log::debug!("deleted player {}", player_id);
        Ok(())
    }

    /// Set an active match without two full teams idle with a zeroed score.
    /// Returns whether a match was stopped.
    fn stop_incomplete_match(&mut self) -> bool {
        let ms = &mut self.match_state;
        if !ms.active || ms.teams_full() {
            return false;
        }
        ms.active = false;
        ms.score_a = 0;
        ms.score_b = 0;
        true
    }

    /// Flip a player's presence.
    ///
    /// Arriving players join the back of the queue unless already queued or
    /// seated. Leaving players are taken out of the queue only; a seated
    /// player keeps the seat.
    pub fn toggle_presence(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let seated = self.match_state.is_seated(player_id);
        let p = self
            .get_player_mut(player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))?;
        p.is_present = !p.is_present;
        let is_present = p.is_present;

        if is_present {
            if !seated && !self.queue.contains(&player_id) {
                self.queue.push(player_id);
            }
        } else {
            self.queue.retain(|&id| id != player_id);
        }
        log::debug!("player {} present={}", player_id, is_present);
        Ok(())
    }

    pub fn set_pix_key(&mut self, key: impl Into<String>) {
        self.settings.pix_key = key.into();
    }

    pub fn set_court_value(&mut self, value: f64) -> Result<(), SessionError> {
        if !value.is_finite() || value < 0.0 {
            return Err(SessionError::InvalidCourtValue);
        }
        self.settings.court_value = value;
        Ok(())
    }

    /// Bring a loaded or imported session back in line with the container invariants.
    ///
    /// Drops ids that reference no player and duplicates across containers
    /// (team A wins over team B, teams win over the queue), moves team
    /// overflow to the queue front, deactivates a match whose teams are not
    /// full, and queues present players that sit nowhere. Leaves any state
    /// reachable through the transitions untouched.
    pub fn repair(&mut self) {
        let mut seen = HashSet::new();
        self.players.retain(|p| seen.insert(p.id));
        let known: HashSet<PlayerId> = self.players.iter().map(|p| p.id).collect();

        let mut placed = HashSet::new();
        let mut overflow = Vec::new();
        for location in [Location::TeamA, Location::TeamB, Location::Queue] {
            let list = self.container_mut(location);
            list.retain(|id| known.contains(id) && placed.insert(*id));
            if location != Location::Queue && list.len() > TEAM_SIZE {
                overflow.extend(list.drain(TEAM_SIZE..));
            }
        }
        if !overflow.is_empty() {
            log::warn!("repair: moved {} extra seated player(s) to the queue", overflow.len());
            overflow.append(&mut self.queue);
            self.queue = overflow;
        }

        if self.stop_incomplete_match() {
            log::warn!("repair: active match without two full teams, setting it idle");
        }

        let unplaced: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_present && !placed.contains(&p.id))
            .map(|p| p.id)
            .collect();
        if !unplaced.is_empty() {
            log::warn!("repair: queued {} present player(s) found nowhere", unplaced.len());
            self.queue.extend(unplaced);
        }
        self.version = STATE_VERSION;
    }
}
