//! Snapshot export/import and the load-time upgrade of older layouts.
//!
//! Version 0 is the unversioned single-store layout, where history, streak
//! and the streak team lived inside `match` and the fee settings at the top
//! level. [`upgrade`] rewrites it into the current layout and supplies zero
//! values for any field a snapshot is missing, so the transitions never see
//! partial state.

use crate::models::{Session, STATE_VERSION};
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot is not a JSON object")]
    NotAnObject,
}

/// Serialize the full session.
pub fn export_snapshot(session: &Session) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(session)?)
}

/// Parse, upgrade and repair a snapshot into a session.
pub fn import_state(json: &str) -> Result<Session, SnapshotError> {
    let value: Value = serde_json::from_str(json)?;
    session_from_value(value)
}

/// Upgrade and repair an already-parsed snapshot.
pub fn session_from_value(value: Value) -> Result<Session, SnapshotError> {
    let value = upgrade(value)?;
    let mut session: Session = serde_json::from_value(value)?;
    session.repair();
    Ok(session)
}

/// Bring a snapshot of any known version to the current layout.
pub fn upgrade(mut value: Value) -> Result<Value, SnapshotError> {
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    if version == 0 {
        value = migrate_v0_to_v1(value)?;
        log::info!("Migrated snapshot from version 0 to {}", STATE_VERSION);
    } else if version > STATE_VERSION {
        log::warn!(
            "Loading snapshot from future version {} (current: {})",
            version,
            STATE_VERSION
        );
    }

    let obj = value.as_object_mut().ok_or(SnapshotError::NotAnObject)?;
    fill_missing_fields(obj);
    Ok(value)
}

fn migrate_v0_to_v1(mut value: Value) -> Result<Value, SnapshotError> {
    let obj = value.as_object_mut().ok_or(SnapshotError::NotAnObject)?;

    let mut match_obj = match obj.remove("match") {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };

    let mut history = match match_obj.remove("history") {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };
    for entry in history.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(score) = entry.remove("score") {
            entry.insert("finalScore".into(), score);
        }
    }

    if let Some(streak) = match_obj.remove("streak") {
        match_obj.insert("streakCount".into(), streak);
    }
    if let Some(ids) = match_obj.remove("streakTeamIds") {
        match_obj.insert("streakHolder".into(), ids);
    }

    let mut settings = Map::new();
    if let Some(key) = obj.remove("pixKey") {
        settings.insert("pixKey".into(), key);
    }
    if let Some(court_value) = obj.remove("courtValue") {
        settings.insert("courtValue".into(), court_value);
    }

    obj.insert("match".into(), Value::Object(match_obj));
    obj.insert("history".into(), Value::Array(history));
    obj.insert("settings".into(), Value::Object(settings));
    obj.insert("version".into(), json!(STATE_VERSION));
    Ok(value)
}

/// Insert `default` when `key` is absent or null.
fn default_field(obj: &mut Map<String, Value>, key: &str, default: Value) {
    if obj.get(key).map_or(true, Value::is_null) {
        obj.insert(key.to_string(), default);
    }
}

fn fill_missing_fields(obj: &mut Map<String, Value>) {
    default_field(obj, "version", json!(STATE_VERSION));
    default_field(obj, "players", json!([]));
    default_field(obj, "queue", json!([]));
    default_field(obj, "match", json!({}));
    default_field(obj, "history", json!([]));
    default_field(obj, "settings", json!({}));

    if let Some(players) = obj.get_mut("players").and_then(Value::as_array_mut) {
        for p in players.iter_mut().filter_map(Value::as_object_mut) {
            default_field(p, "isPresent", json!(true));
            default_field(p, "wins", json!(0));
            default_field(p, "gamesPlayed", json!(0));
        }
    }

    if let Some(m) = obj.get_mut("match").and_then(Value::as_object_mut) {
        default_field(m, "active", json!(false));
        default_field(m, "teamA", json!([]));
        default_field(m, "teamB", json!([]));
        default_field(m, "scoreA", json!(0));
        default_field(m, "scoreB", json!(0));
        default_field(m, "streakCount", json!(0));
        default_field(m, "streakHolder", json!([]));
    }

    if let Some(history) = obj.get_mut("history").and_then(Value::as_array_mut) {
        for h in history.iter_mut().filter_map(Value::as_object_mut) {
            default_field(h, "finalScore", json!(""));
            default_field(h, "teamA", json!([]));
            default_field(h, "teamB", json!([]));
        }
    }

    if let Some(s) = obj.get_mut("settings").and_then(Value::as_object_mut) {
        default_field(s, "pixKey", json!(""));
        default_field(s, "courtValue", json!(0.0));
    }
}
