//! Integration tests for the match lifecycle and the post-match win-streak rotation.

use court_rotation_web::{
    decrease_point, end_match, fill_teams_from_queue, move_player, reset_match, score_point,
    start_match, winner, Location, MatchPhase, Player, PlayerId, Session, SessionError, Team,
};
use pretty_assertions::assert_eq;

fn session_with_players(n: usize) -> Session {
    let players: Vec<Player> = (0..n).map(|i| Player::new(format!("P{i}"))).collect();
    Session::with_players(players)
}

fn ids(s: &Session) -> Vec<PlayerId> {
    s.players.iter().map(|p| p.id).collect()
}

fn play_to(s: &mut Session, team: Team, points: u32) {
    for _ in 0..points {
        score_point(s, team).unwrap();
    }
}

#[test]
fn start_needs_eight_players() {
    let mut s = session_with_players(7);
    let before = s.clone();
    assert!(matches!(
        start_match(&mut s),
        Err(SessionError::NotEnoughPlayers { .. })
    ));
    assert_eq!(s, before);
    assert_eq!(s.match_state.phase(), MatchPhase::Idle);
}

#[test]
fn start_counts_only_queued_players() {
    let mut s = session_with_players(8);
    let p = ids(&s);
    move_player(&mut s, Location::Queue, Location::TeamA, p[0]).unwrap();
    let before = s.clone();

    assert_eq!(
        start_match(&mut s),
        Err(SessionError::NotEnoughPlayers {
            required: 8,
            available: 7
        })
    );
    assert_eq!(s, before);
    assert_eq!(s.match_state.phase(), MatchPhase::Idle);
}

#[test]
fn start_fills_teams_from_queue() {
    let mut s = session_with_players(10);
    let p = ids(&s);
    start_match(&mut s).unwrap();

    assert_eq!(s.match_state.phase(), MatchPhase::Active);
    assert_eq!(s.match_state.team_a, p[0..4].to_vec());
    assert_eq!(s.match_state.team_b, p[4..8].to_vec());
    assert_eq!(s.queue, p[8..].to_vec());
    assert_eq!((s.match_state.score_a, s.match_state.score_b), (0, 0));
}

#[test]
fn start_keeps_manually_set_teams() {
    let mut s = session_with_players(9);
    let p = ids(&s);
    for &id in p[1..5].iter() {
        move_player(&mut s, Location::Queue, Location::TeamA, id).unwrap();
    }
    for &id in p[5..9].iter() {
        move_player(&mut s, Location::Queue, Location::TeamB, id).unwrap();
    }
    start_match(&mut s).unwrap();

    assert_eq!(s.match_state.team_a, p[1..5].to_vec());
    assert_eq!(s.match_state.team_b, p[5..9].to_vec());
    assert_eq!(s.queue, vec![p[0]]);
}

#[test]
fn start_twice_is_refused() {
    let mut s = session_with_players(8);
    start_match(&mut s).unwrap();
    score_point(&mut s, Team::A).unwrap();
    let before = s.clone();
    assert_eq!(start_match(&mut s), Err(SessionError::MatchInProgress));
    assert_eq!(s, before);
}

#[test]
fn scoring_requires_active_match() {
    let mut s = session_with_players(8);
    fill_teams_from_queue(&mut s).unwrap();
    let before = s.clone();
    assert_eq!(score_point(&mut s, Team::A), Err(SessionError::NoActiveMatch));
    assert_eq!(decrease_point(&mut s, Team::B), Err(SessionError::NoActiveMatch));
    assert_eq!(end_match(&mut s, Team::A), Err(SessionError::NoActiveMatch));
    assert_eq!(reset_match(&mut s), Err(SessionError::NoActiveMatch));
    assert_eq!(s, before);
}

#[test]
fn decrease_never_goes_below_zero() {
    let mut s = session_with_players(8);
    start_match(&mut s).unwrap();
    decrease_point(&mut s, Team::A).unwrap();
    assert_eq!(s.match_state.score_a, 0);

    play_to(&mut s, Team::B, 3);
    decrease_point(&mut s, Team::B).unwrap();
    assert_eq!(s.match_state.score_line(), "0-2");
}

#[test]
fn first_win_starts_streak_and_requeues_winners_first() {
    let mut s = session_with_players(10);
    let p = ids(&s);
    start_match(&mut s).unwrap();
    play_to(&mut s, Team::A, 15);
    play_to(&mut s, Team::B, 10);
    assert_eq!(s.match_state.winner(), Some(Team::A));

    end_match(&mut s, Team::A).unwrap();

    let ms = &s.match_state;
    assert_eq!(ms.phase(), MatchPhase::Idle);
    assert!(ms.teams_empty());
    assert_eq!((ms.score_a, ms.score_b), (0, 0));
    assert_eq!(ms.streak_count, 1);
    assert_eq!(ms.streak_holder, p[0..4].to_vec());

    let mut expected = p[0..4].to_vec();
    expected.extend(&p[8..10]);
    expected.extend(&p[4..8]);
    assert_eq!(s.queue, expected);

    assert_eq!(s.history.len(), 1);
    let h = &s.history[0];
    assert_eq!(h.winner, Team::A);
    assert_eq!(h.final_score, "15-10");
    assert_eq!(h.team_a, p[0..4].to_vec());
    assert_eq!(h.team_b, p[4..8].to_vec());

    for id in &p[0..4] {
        let pl = s.player(*id).unwrap();
        assert_eq!((pl.wins, pl.games_played, pl.losses()), (1, 1, 0));
    }
    for id in &p[4..8] {
        let pl = s.player(*id).unwrap();
        assert_eq!((pl.wins, pl.games_played, pl.losses()), (0, 1, 1));
    }
    for id in &p[8..10] {
        assert_eq!(s.player(*id).unwrap().games_played, 0);
    }
}

#[test]
fn second_straight_win_rotates_both_teams_out() {
    let mut s = session_with_players(12);
    let p = ids(&s);

    // Match 1: A = p0..p3 beats B = p4..p7.
    start_match(&mut s).unwrap();
    end_match(&mut s, Team::A).unwrap();
    // Winners were requeued first, so the next fill seats them as team A again
    // against p8..p11.
    start_match(&mut s).unwrap();
    assert_eq!(s.match_state.team_a, p[0..4].to_vec());
    assert_eq!(s.match_state.team_b, p[8..12].to_vec());
    end_match(&mut s, Team::A).unwrap();

    let ms = &s.match_state;
    assert_eq!(ms.streak_count, 0);
    assert!(ms.streak_holder.is_empty());
    let mut expected = p[4..8].to_vec();
    expected.extend(&p[8..12]);
    expected.extend(&p[0..4]);
    assert_eq!(s.queue, expected);

    for id in &p[0..4] {
        assert_eq!(s.player(*id).unwrap().wins, 2);
    }
    assert_eq!(s.history.len(), 2);
}

#[test]
fn streak_follows_players_not_seats() {
    let mut s = session_with_players(8);
    let p = ids(&s);
    s.match_state.streak_count = 1;
    s.match_state.streak_holder = p[0..4].iter().rev().copied().collect();

    // The holders now sit in team B.
    for &id in p[4..8].iter() {
        move_player(&mut s, Location::Queue, Location::TeamA, id).unwrap();
    }
    for &id in p[0..4].iter() {
        move_player(&mut s, Location::Queue, Location::TeamB, id).unwrap();
    }
    start_match(&mut s).unwrap();
    end_match(&mut s, Team::B).unwrap();

    assert_eq!(s.match_state.streak_count, 0);
    assert!(s.match_state.streak_holder.is_empty());
    let mut expected = p[4..8].to_vec();
    expected.extend(&p[0..4]);
    assert_eq!(s.queue, expected);
}

#[test]
fn different_winners_restart_the_streak() {
    let mut s = session_with_players(8);
    let p = ids(&s);
    s.match_state.streak_count = 1;
    s.match_state.streak_holder = p[4..8].to_vec();

    start_match(&mut s).unwrap();
    end_match(&mut s, Team::A).unwrap();

    assert_eq!(s.match_state.streak_count, 1);
    assert_eq!(s.match_state.streak_holder, p[0..4].to_vec());
    let mut expected = p[0..4].to_vec();
    expected.extend(&p[4..8]);
    assert_eq!(s.queue, expected);
}

#[test]
fn reset_match_keeps_teams_and_records_nothing() {
    let mut s = session_with_players(9);
    start_match(&mut s).unwrap();
    let teams = (s.match_state.team_a.clone(), s.match_state.team_b.clone());
    play_to(&mut s, Team::A, 4);

    reset_match(&mut s).unwrap();

    assert_eq!(s.match_state.phase(), MatchPhase::Idle);
    assert_eq!(s.match_state.score_line(), "0-0");
    assert_eq!((s.match_state.team_a.clone(), s.match_state.team_b.clone()), teams);
    assert!(s.history.is_empty());
    assert!(s.players.iter().all(|p| p.games_played == 0));

    // Teams are full, so the next start reuses them.
    start_match(&mut s).unwrap();
    assert_eq!((s.match_state.team_a.clone(), s.match_state.team_b.clone()), teams);
}

#[test]
fn deuce_and_hard_cap_scenarios() {
    let mut s = session_with_players(8);
    start_match(&mut s).unwrap();
    play_to(&mut s, Team::A, 14);
    play_to(&mut s, Team::B, 14);
    score_point(&mut s, Team::A).unwrap();
    assert_eq!(s.match_state.winner(), None);
    play_to(&mut s, Team::B, 2);
    assert_eq!(s.match_state.score_line(), "15-16");
    assert_eq!(s.match_state.winner(), None);
    score_point(&mut s, Team::B).unwrap();
    assert_eq!(s.match_state.winner(), Some(Team::B));

    assert_eq!(winner(17, 17), None);
    assert_eq!(winner(18, 17), Some(Team::A));
    assert_eq!(winner(16, 18), Some(Team::B));
    assert_eq!(winner(15, 13), Some(Team::A));
    assert_eq!(winner(15, 14), None);
}

#[test]
fn end_match_trusts_the_operator() {
    let mut s = session_with_players(8);
    start_match(&mut s).unwrap();
    play_to(&mut s, Team::A, 3);
    end_match(&mut s, Team::B).unwrap();
    assert_eq!(s.history[0].winner, Team::B);
    assert_eq!(s.history[0].final_score, "3-0");
}
