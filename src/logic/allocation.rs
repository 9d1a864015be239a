//! Queue and team slots: filling, shuffling, rotation and manual rearrangement.

use crate::models::{
    same_players, Location, PlayerId, Session, SessionError, PLAYERS_PER_MATCH, STREAK_LIMIT,
    TEAM_SIZE,
};
use rand::Rng;
use std::collections::HashSet;

/// Seat the front 8 of the queue: first 4 as team A, next 4 as team B.
///
/// Needs 8 queued. Players already seated (from a partial manual setup) go
/// back to the queue front first, so they are seated again ahead of everyone
/// waiting.
pub fn fill_teams_from_queue(session: &mut Session) -> Result<(), SessionError> {
    if session.match_state.active {
        return Err(SessionError::MatchInProgress);
    }
    if session.queue.len() < PLAYERS_PER_MATCH {
        return Err(SessionError::NotEnoughPlayers {
            required: PLAYERS_PER_MATCH,
            available: session.queue.len(),
        });
    }

    let ms = &mut session.match_state;
    let mut pool = std::mem::take(&mut ms.team_a);
    pool.append(&mut ms.team_b);
    pool.append(&mut session.queue);

    session.queue = pool.split_off(PLAYERS_PER_MATCH);
    ms.team_b = pool.split_off(TEAM_SIZE);
    ms.team_a = pool;
    log::debug!("filled teams, {} left in queue", session.queue.len());
    Ok(())
}

/// Shuffle the seated players (topped up from the queue to 8) into two new teams.
///
/// Uses a thread-local RNG; see [`shuffle_teams_with`] to supply one.
pub fn shuffle_teams(session: &mut Session) -> Result<(), SessionError> {
    shuffle_teams_with(session, &mut rand::thread_rng())
}

/// Shuffle with a caller-supplied random source.
///
/// 1. Pool team A and team B.
/// 2. Pull from the queue front until the pool has 8 (or the queue runs out).
/// 3. Permute the pool uniformly.
/// 4. First 4 to team A, next 4 to team B, anything beyond 8 back to the queue front.
///
/// Resets the win streak: new team compositions start fresh.
pub fn shuffle_teams_with<R: Rng + ?Sized>(
    session: &mut Session,
    rng: &mut R,
) -> Result<(), SessionError> {
    if session.match_state.active {
        return Err(SessionError::MatchInProgress);
    }

    let ms = &mut session.match_state;
    let mut pool = std::mem::take(&mut ms.team_a);
    pool.append(&mut ms.team_b);
    if pool.len() < PLAYERS_PER_MATCH {
        let needed = (PLAYERS_PER_MATCH - pool.len()).min(session.queue.len());
        pool.extend(session.queue.drain(..needed));
    }

    fisher_yates(&mut pool, rng);

    let mut overflow = if pool.len() > PLAYERS_PER_MATCH {
        pool.split_off(PLAYERS_PER_MATCH)
    } else {
        Vec::new()
    };
    ms.team_b = if pool.len() > TEAM_SIZE {
        pool.split_off(TEAM_SIZE)
    } else {
        Vec::new()
    };
    ms.team_a = pool;

    if !overflow.is_empty() {
        overflow.append(&mut session.queue);
        session.queue = overflow;
    }

    ms.streak_count = 0;
    ms.streak_holder.clear();
    log::debug!(
        "shuffled teams ({} + {} seated)",
        ms.team_a.len(),
        ms.team_b.len()
    );
    Ok(())
}

/// Uniform in-place permutation: for i from the last index down to 1, swap
/// element i with a uniformly chosen element at index <= i.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Manual rotation: team A stays, the next 4 in the queue replace team B,
/// and the old team B goes to the back of the queue.
///
/// With both teams empty this is [`fill_teams_from_queue`].
pub fn rotate_queue(session: &mut Session) -> Result<(), SessionError> {
    if session.match_state.active {
        return Err(SessionError::MatchInProgress);
    }
    if session.match_state.teams_empty() {
        return fill_teams_from_queue(session);
    }
    if session.queue.is_empty() {
        return Err(SessionError::NotEnoughPlayers {
            required: 1,
            available: 0,
        });
    }

    let take = TEAM_SIZE.min(session.queue.len());
    let challengers: Vec<PlayerId> = session.queue.drain(..take).collect();
    let previous_b = std::mem::replace(&mut session.match_state.team_b, challengers);
    session.queue.extend(previous_b);
    log::debug!("rotated queue, {} waiting", session.queue.len());
    Ok(())
}

/// Move one player between queue and team slots (drag-style manual setup).
///
/// Team slots never exceed four. Moving within the same container sends the
/// player to its end.
pub fn move_player(
    session: &mut Session,
    source: Location,
    target: Location,
    player_id: PlayerId,
) -> Result<(), SessionError> {
    if session.match_state.active {
        return Err(SessionError::MatchInProgress);
    }
    if session.player(player_id).is_none() {
        return Err(SessionError::PlayerNotFound(player_id));
    }
    if !session.container(source).contains(&player_id) {
        return Err(SessionError::NotInLocation {
            player: player_id,
            location: source,
        });
    }
    if source != target
        && target != Location::Queue
        && session.container(target).len() >= TEAM_SIZE
    {
        return Err(SessionError::TeamFull(target));
    }

    session.container_mut(source).retain(|&id| id != player_id);
    let list = session.container_mut(target);
    if !list.contains(&player_id) {
        list.push(player_id);
    }
    log::debug!("moved player {} from {} to {}", player_id, source, target);
    Ok(())
}

/// Replace the queue order. `new_order` must be a permutation of the current queue.
pub fn reorder_queue(session: &mut Session, new_order: Vec<PlayerId>) -> Result<(), SessionError> {
    if new_order.len() != session.queue.len() {
        return Err(SessionError::InvalidQueueOrder);
    }
    let current: HashSet<_> = session.queue.iter().copied().collect();
    let mut seen = HashSet::new();
    let is_permutation = new_order
        .iter()
        .all(|id| current.contains(id) && seen.insert(*id));
    if !is_permutation {
        return Err(SessionError::InvalidQueueOrder);
    }
    session.queue = new_order;
    Ok(())
}

/// Post-match rotation with the win-streak ceiling. Clears both team slots.
///
/// The same 4 winners as the streak holder extend the streak; any other
/// winners start a new one. Once the streak reaches `STREAK_LIMIT` both teams
/// go to the back of the queue (losers first) and the streak is cleared.
/// Otherwise the winners go to the queue front to be seated again and the
/// losers to the back.
pub(crate) fn rotate_after_match(
    session: &mut Session,
    winner_ids: Vec<PlayerId>,
    loser_ids: Vec<PlayerId>,
) {
    let ms = &mut session.match_state;
    let same_team =
        !ms.streak_holder.is_empty() && same_players(&winner_ids, &ms.streak_holder);
    let streak = if same_team { ms.streak_count + 1 } else { 1 };

    let waiting = std::mem::take(&mut session.queue);
    if streak >= STREAK_LIMIT {
        log::debug!("streak limit reached, rotating both teams out");
        session.queue = waiting;
        session.queue.extend(loser_ids);
        session.queue.extend(winner_ids);
        ms.streak_count = 0;
        ms.streak_holder.clear();
    } else {
        let mut queue = winner_ids.clone();
        queue.extend(waiting);
        queue.extend(loser_ids);
        session.queue = queue;
        ms.streak_count = streak;
        ms.streak_holder = winner_ids;
    }
    ms.team_a.clear();
    ms.team_b.clear();
}
