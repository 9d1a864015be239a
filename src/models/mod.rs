//! Data structures for the court session: players, match, history, session state.

mod game;
mod player;
mod session;

pub use game::{
    same_players, winner, HistoryEntry, Location, MatchPhase, MatchState, Team, HARD_CAP,
    PLAYERS_PER_MATCH, STREAK_LIMIT, TARGET_SCORE, TEAM_SIZE, WIN_MARGIN,
};
pub use player::{Player, PlayerId, PlayerStats};
pub use session::{Session, SessionError, Settings, STATE_VERSION};
