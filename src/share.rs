//! Share links: the session as a compact URL-safe token, and confirmed import.
//!
//! Token = base64url(no padding) of LZ4 (size-prepended) of the JSON snapshot.
//! Decoding never fails loudly: a bad or foreign token means "nothing to import".

use crate::models::Session;
use crate::snapshot::{export_snapshot, import_state, SnapshotError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// Fragment key carrying the token in a share link.
pub const STATE_PARAM: &str = "state=";

/// Largest decompressed snapshot a token may declare.
const MAX_SNAPSHOT_BYTES: usize = 4 * 1024 * 1024;

/// Encode the session into a share token.
pub fn encode_token(session: &Session) -> Result<String, SnapshotError> {
    let json = export_snapshot(session)?;
    let compressed = compress_prepend_size(json.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decode a share token. `None` for anything that is not a valid token.
pub fn decode_token(token: &str) -> Option<Session> {
    let bytes = match URL_SAFE_NO_PAD.decode(token.trim()) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("share token is not base64: {}", e);
            return None;
        }
    };
    let declared = bytes
        .get(..4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize);
    if declared.map_or(true, |size| size > MAX_SNAPSHOT_BYTES) {
        log::warn!("share token has a missing or oversized length prefix");
        return None;
    }
    let json = match decompress_size_prepended(&bytes) {
        Ok(j) => j,
        Err(e) => {
            log::warn!("share token did not decompress: {}", e);
            return None;
        }
    };
    let json = match String::from_utf8(json) {
        Ok(s) => s,
        Err(_) => {
            log::warn!("share token is not UTF-8");
            return None;
        }
    };
    match import_state(&json) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("share token is not a session snapshot: {}", e);
            None
        }
    }
}

/// Full share link: `{base_url}/#state={token}`.
pub fn share_link(base_url: &str, session: &Session) -> Result<String, SnapshotError> {
    let token = encode_token(session)?;
    Ok(format!(
        "{}/#{}{}",
        base_url.trim_end_matches('/'),
        STATE_PARAM,
        token
    ))
}

/// Extract and decode the state from a link, hash fragment or bare `state=` string.
pub fn parse_link(link: &str) -> Option<Session> {
    let (_, rest) = link.split_once(STATE_PARAM)?;
    let token = rest.split('&').next().unwrap_or_default();
    if token.is_empty() {
        return None;
    }
    decode_token(token)
}

/// A decoded snapshot waiting for the operator to confirm the overwrite.
///
/// Staging never touches the local session. Dropping it cancels the import.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingImport {
    incoming: Session,
}

impl PendingImport {
    /// Stage a token for import; `None` if it does not decode.
    pub fn from_token(token: &str) -> Option<Self> {
        decode_token(token).map(|incoming| Self { incoming })
    }

    /// Stage from a link or hash fragment.
    pub fn from_link(link: &str) -> Option<Self> {
        parse_link(link).map(|incoming| Self { incoming })
    }

    /// The state that would replace the local one.
    pub fn preview(&self) -> &Session {
        &self.incoming
    }

    /// Overwrite `session` with the staged state (players, queue, match, history, settings).
    pub fn confirm(self, session: &mut Session) {
        log::info!(
            "imported shared state: {} players, {} matches",
            self.incoming.players.len(),
            self.incoming.history.len()
        );
        *session = self.incoming;
    }
}
