//! Session business logic: team allocation, match lifecycle, stats.

mod allocation;
mod match_play;
mod stats;

pub use allocation::{
    fill_teams_from_queue, fisher_yates, move_player, reorder_queue, rotate_queue, shuffle_teams,
    shuffle_teams_with,
};
pub use match_play::{decrease_point, end_match, reset_match, score_point, start_match};
pub use stats::{
    court_fee_split, history_rows, leaderboard, present_player_ids, total_matches,
    write_leaderboard_csv, FeeSplit, HistoryRow, LeaderboardRow,
};
