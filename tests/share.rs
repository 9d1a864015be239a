//! Integration tests for share tokens, share links and confirmed import.

use court_rotation_web::share::{
    decode_token, encode_token, parse_link, share_link, PendingImport,
};
use court_rotation_web::{end_match, start_match, Player, Session, Team};
use pretty_assertions::assert_eq;

fn played_session() -> Session {
    let players: Vec<Player> = (0..10).map(|i| Player::new(format!("P{i}"))).collect();
    let mut s = Session::with_players(players);
    s.set_pix_key("pix@court.example");
    s.set_court_value(80.0).unwrap();
    start_match(&mut s).unwrap();
    end_match(&mut s, Team::A).unwrap();
    s
}

#[test]
fn token_round_trips() {
    let s = played_session();
    let token = encode_token(&s).unwrap();
    assert_eq!(decode_token(&token), Some(s));
}

#[test]
fn token_is_url_safe() {
    let token = encode_token(&played_session()).unwrap();
    assert!(!token.is_empty());
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn link_round_trips_through_fragment() {
    let s = played_session();
    let link = share_link("https://court.example/", &s).unwrap();
    assert!(link.starts_with("https://court.example/#state="));
    assert_eq!(parse_link(&link), Some(s.clone()));

    // A bare fragment works as well.
    let fragment = &link[link.find('#').unwrap()..];
    assert_eq!(parse_link(fragment), Some(s));
}

#[test]
fn bad_tokens_decode_to_none() {
    assert_eq!(decode_token(""), None);
    assert_eq!(decode_token("!!not base64!!"), None);
    assert_eq!(decode_token("AAAA"), None);
    // Valid base64 declaring an absurd decompressed size.
    assert_eq!(decode_token("_____wAAAAA"), None);
    // Valid compression of something that is not a session.
    let foreign = {
        use base64::Engine as _;
        let bytes = lz4_flex::compress_prepend_size(b"[\"hello\"]");
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    };
    assert_eq!(decode_token(&foreign), None);

    assert_eq!(parse_link("https://court.example/"), None);
    assert_eq!(parse_link("https://court.example/#state="), None);
}

#[test]
fn staging_leaves_local_session_alone_until_confirmed() {
    let shared = played_session();
    let token = encode_token(&shared).unwrap();

    let mut local = Session::new();
    local.add_player("Local").unwrap();
    let before = local.clone();

    let pending = PendingImport::from_token(&token).unwrap();
    assert_eq!(pending.preview(), &shared);
    assert_eq!(local, before);

    // Dropping the staged import cancels it.
    drop(pending);
    assert_eq!(local, before);

    PendingImport::from_token(&token)
        .unwrap()
        .confirm(&mut local);
    assert_eq!(local, shared);
}

#[test]
fn undecodable_link_stages_nothing() {
    assert!(PendingImport::from_link("https://court.example/#state=zzzz").is_none());
    assert!(PendingImport::from_token("").is_none());
}
