//! Match lifecycle: Idle -> Active (score tracking) -> Idle, one history entry per match.

use crate::logic::allocation::{fill_teams_from_queue, rotate_after_match};
use crate::models::{HistoryEntry, Session, SessionError, Team};

/// Start a match.
///
/// Two full teams start as they are; otherwise the teams are filled from the
/// queue first (needs 8 available). Scores start at 0-0.
pub fn start_match(session: &mut Session) -> Result<(), SessionError> {
    if session.match_state.active {
        return Err(SessionError::MatchInProgress);
    }
    if !session.match_state.teams_full() {
        fill_teams_from_queue(session)?;
    }
    let ms = &mut session.match_state;
    ms.active = true;
    ms.score_a = 0;
    ms.score_b = 0;
    log::debug!("match started");
    Ok(())
}

/// Add a point for `team`. No upper bound here: check [`crate::winner`] after scoring.
pub fn score_point(session: &mut Session, team: Team) -> Result<(), SessionError> {
    if !session.match_state.active {
        return Err(SessionError::NoActiveMatch);
    }
    *session.match_state.score_mut(team) += 1;
    Ok(())
}

/// Take a point away from `team` (manual correction). Never goes below 0.
pub fn decrease_point(session: &mut Session, team: Team) -> Result<(), SessionError> {
    if !session.match_state.active {
        return Err(SessionError::NoActiveMatch);
    }
    let score = session.match_state.score_mut(team);
    *score = score.saturating_sub(1);
    Ok(())
}

/// Conclude the match with `winner`.
///
/// 1. Winners get a win and a game played, losers a game played.
/// 2. Append a history entry with the final score and both teams.
/// 3. Apply the post-match rotation (win-streak ceiling) and clear the teams.
/// 4. Go idle with scores at 0-0.
pub fn end_match(session: &mut Session, winner: Team) -> Result<(), SessionError> {
    if !session.match_state.active {
        return Err(SessionError::NoActiveMatch);
    }

    let team_a = session.match_state.team_a.clone();
    let team_b = session.match_state.team_b.clone();
    let (winner_ids, loser_ids) = match winner {
        Team::A => (team_a.clone(), team_b.clone()),
        Team::B => (team_b.clone(), team_a.clone()),
    };

    for p in session.players.iter_mut() {
        if winner_ids.contains(&p.id) {
            p.record_win();
        } else if loser_ids.contains(&p.id) {
            p.record_loss();
        }
    }

    let final_score = session.match_state.score_line();
    log::debug!("match ended: team {} won {}", winner, final_score);
    session.history.push(HistoryEntry {
        winner,
        final_score,
        team_a,
        team_b,
    });

    rotate_after_match(session, winner_ids, loser_ids);

    let ms = &mut session.match_state;
    ms.active = false;
    ms.score_a = 0;
    ms.score_b = 0;
    Ok(())
}

/// Abandon the running match: go idle and zero the score, keeping the teams seated.
///
/// Records nothing in history and changes no player stats.
pub fn reset_match(session: &mut Session) -> Result<(), SessionError> {
    if !session.match_state.active {
        return Err(SessionError::NoActiveMatch);
    }
    let ms = &mut session.match_state;
    ms.active = false;
    ms.score_a = 0;
    ms.score_b = 0;
    log::debug!("match reset");
    Ok(())
}
