//! Pickup court organizer: library with the session engine and its collaborators.
//!
//! The engine is [`models`] + [`logic`]: every transition takes `&mut Session`
//! and either applies completely or returns a [`SessionError`] leaving the
//! session untouched. [`snapshot`], [`store`], [`share`] and [`shorten`] are
//! the persistence, share-link and link-shortening collaborators;
//! [`service::SessionService`] ties one session to its store.

pub mod config;
pub mod logic;
pub mod models;
pub mod service;
pub mod share;
pub mod shorten;
pub mod snapshot;
pub mod store;

pub use logic::{
    court_fee_split, decrease_point, end_match, fill_teams_from_queue, fisher_yates,
    history_rows, leaderboard, move_player, present_player_ids, reorder_queue, reset_match,
    rotate_queue, score_point, shuffle_teams, shuffle_teams_with, start_match, total_matches,
    write_leaderboard_csv, FeeSplit, HistoryRow, LeaderboardRow,
};
pub use models::{
    same_players, winner, HistoryEntry, Location, MatchPhase, MatchState, Player, PlayerId,
    PlayerStats, Session, SessionError, Settings, Team, HARD_CAP, PLAYERS_PER_MATCH,
    STATE_VERSION, STREAK_LIMIT, TARGET_SCORE, TEAM_SIZE, WIN_MARGIN,
};
pub use service::SessionService;
pub use snapshot::{export_snapshot, import_state, SnapshotError};
