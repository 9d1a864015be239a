//! Read models over the session: leaderboard, named history, court-fee split.

use crate::models::{PlayerId, PlayerStats, Session, Team};
use serde::Serialize;
use std::io::Write;

/// One leaderboard row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// 1-based position.
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

/// Players ranked by wins (desc), tie-broken by games played (desc).
///
/// Equal players keep roster order.
pub fn leaderboard(session: &Session) -> Vec<LeaderboardRow> {
    let mut players: Vec<_> = session.players.iter().collect();
    players.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.games_played.cmp(&a.games_played))
    });
    players
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardRow {
            rank: i + 1,
            player_id: p.id,
            name: p.name.clone(),
            stats: p.stats(),
        })
        .collect()
}

/// Total concluded matches.
pub fn total_matches(session: &Session) -> usize {
    session.history.len()
}

/// A history entry with player names resolved (`"Unknown"` for deleted players).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    /// 1-based match number, oldest first.
    pub number: usize,
    pub winner: Team,
    pub final_score: String,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
}

/// History with names, most recent match first.
pub fn history_rows(session: &Session) -> Vec<HistoryRow> {
    let names = |ids: &[PlayerId]| -> Vec<String> {
        ids.iter()
            .map(|&id| session.player_name(id).to_string())
            .collect()
    };
    session
        .history
        .iter()
        .enumerate()
        .rev()
        .map(|(i, h)| HistoryRow {
            number: i + 1,
            winner: h.winner,
            final_score: h.final_score.clone(),
            team_a: names(&h.team_a),
            team_b: names(&h.team_b),
        })
        .collect()
}

/// Write the leaderboard as CSV: `rank,name,wins,games_played,present`.
pub fn write_leaderboard_csv<W: Write>(session: &Session, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["rank", "name", "wins", "games_played", "present"])?;
    for row in leaderboard(session) {
        wtr.write_record([
            row.rank.to_string(),
            row.name,
            row.stats.wins.to_string(),
            row.stats.games_played.to_string(),
            row.stats.is_present.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Result of splitting the court fee between selected players.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub per_person: f64,
    pub player_count: usize,
    /// Ready-to-paste message: pix key, amount each and the numbered player list.
    pub text: String,
}

/// Split `settings.court_value` evenly between the selected players (roster order).
///
/// `None` when nobody known is selected or there is nothing to split.
pub fn court_fee_split(session: &Session, selected: &[PlayerId]) -> Option<FeeSplit> {
    let value = session.settings.court_value;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let payers: Vec<_> = session
        .players
        .iter()
        .filter(|p| selected.contains(&p.id))
        .collect();
    if payers.is_empty() {
        return None;
    }

    let per_person = value / payers.len() as f64;
    let list = payers
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} - {}", i + 1, p.name))
        .collect::<Vec<_>>()
        .join("\n");
    let text = format!(
        "Final list\nPix {}\n{} each\n\n{}",
        session.settings.pix_key,
        format_amount(per_person),
        list
    );
    Some(FeeSplit {
        per_person,
        player_count: payers.len(),
        text,
    })
}

/// Ids of present players, the default fee-split selection.
pub fn present_player_ids(session: &Session) -> Vec<PlayerId> {
    session
        .players
        .iter()
        .filter(|p| p.is_present)
        .map(|p| p.id)
        .collect()
}

/// Currency-style amount with a decimal comma, e.g. `R$ 12,50`.
fn format_amount(value: f64) -> String {
    format!("R$ {:.2}", value).replace('.', ",")
}
