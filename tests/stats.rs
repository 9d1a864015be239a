//! Integration tests for the read models: leaderboard, history rows, CSV, court fee.

use court_rotation_web::{
    court_fee_split, end_match, history_rows, leaderboard, present_player_ids, start_match,
    total_matches, write_leaderboard_csv, Player, PlayerId, Session, Team,
};
use pretty_assertions::assert_eq;

fn session_with_players(n: usize) -> Session {
    let players: Vec<Player> = (0..n).map(|i| Player::new(format!("P{i}"))).collect();
    Session::with_players(players)
}

fn ids(s: &Session) -> Vec<PlayerId> {
    s.players.iter().map(|p| p.id).collect()
}

/// Two matches over 12 players: p0..p3 beat p4..p7, then p0..p3 beat p8..p11.
fn two_matches() -> Session {
    let mut s = session_with_players(12);
    start_match(&mut s).unwrap();
    end_match(&mut s, Team::A).unwrap();
    start_match(&mut s).unwrap();
    end_match(&mut s, Team::A).unwrap();
    s
}

#[test]
fn leaderboard_orders_by_wins_then_games() {
    let s = two_matches();
    let p = ids(&s);
    let board = leaderboard(&s);

    assert_eq!(board.len(), 12);
    let top: Vec<_> = board[0..4].iter().map(|r| r.player_id).collect();
    assert_eq!(top, p[0..4].to_vec());
    assert!(board[0..4].iter().all(|r| r.stats.wins == 2));
    // Everyone else has no wins and one game; roster order is kept.
    let rest: Vec<_> = board[4..].iter().map(|r| r.player_id).collect();
    assert_eq!(rest, p[4..].to_vec());
    assert_eq!(
        board.iter().map(|r| r.rank).collect::<Vec<_>>(),
        (1..=12).collect::<Vec<_>>()
    );
    assert_eq!(board[5].stats.losses, 1);
}

#[test]
fn games_played_breaks_ties() {
    let mut s = session_with_players(3);
    s.players[0].games_played = 1;
    s.players[2].games_played = 3;
    let names: Vec<_> = leaderboard(&s).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["P2", "P0", "P1"]);
}

#[test]
fn history_rows_are_newest_first_with_names() {
    let mut s = two_matches();
    let gone = s.history[0].team_b[0];
    s.delete_player(gone).unwrap();

    assert_eq!(total_matches(&s), 2);
    let rows = history_rows(&s);
    assert_eq!(rows[0].number, 2);
    assert_eq!(rows[1].number, 1);
    assert_eq!(rows[1].winner, Team::A);
    assert_eq!(rows[1].team_a, vec!["P0", "P1", "P2", "P3"]);
    assert_eq!(rows[1].team_b, vec!["Unknown", "P5", "P6", "P7"]);
    assert_eq!(rows[0].team_b, vec!["P8", "P9", "P10", "P11"]);
}

#[test]
fn leaderboard_csv_has_header_and_rows() {
    let s = two_matches();
    let mut out = Vec::new();
    write_leaderboard_csv(&s, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines.len(), 13);
    assert_eq!(lines[0], "rank,name,wins,games_played,present");
    assert_eq!(lines[1], "1,P0,2,2,true");
    assert_eq!(lines[12], "12,P11,0,1,true");
}

#[test]
fn court_fee_split_text() {
    let mut s = session_with_players(4);
    s.set_pix_key("pix@court.example");
    s.set_court_value(100.0).unwrap();
    let absent = s.players[3].id;
    s.toggle_presence(absent).unwrap();

    let selected = present_player_ids(&s);
    assert_eq!(selected.len(), 3);
    let split = court_fee_split(&s, &selected).unwrap();

    assert_eq!(split.player_count, 3);
    assert!((split.per_person - 33.333).abs() < 0.001);
    assert_eq!(
        split.text,
        "Final list\nPix pix@court.example\nR$ 33,33 each\n\n1 - P0\n2 - P1\n3 - P2"
    );
}

#[test]
fn court_fee_split_lists_in_roster_order() {
    let mut s = session_with_players(3);
    s.set_court_value(50.0).unwrap();
    let p = ids(&s);
    let split = court_fee_split(&s, &[p[2], p[0]]).unwrap();
    assert_eq!(split.per_person, 25.0);
    assert!(split.text.ends_with("R$ 25,00 each\n\n1 - P0\n2 - P2"));
}

#[test]
fn court_fee_split_needs_value_and_players() {
    let mut s = session_with_players(2);
    let all = ids(&s);
    assert_eq!(court_fee_split(&s, &all), None);

    s.set_court_value(40.0).unwrap();
    assert_eq!(court_fee_split(&s, &[]), None);
    assert_eq!(court_fee_split(&s, &[uuid::Uuid::new_v4()]), None);
}
