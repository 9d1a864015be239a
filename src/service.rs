//! SessionService: the single owner of a session, its store and its random source.
//!
//! Transitions run to completion on the in-memory session first; the snapshot
//! is written afterwards and a failed write never undoes them.

use crate::logic::shuffle_teams_with;
use crate::models::{Session, SessionError};
use crate::share::{self, PendingImport, STATE_PARAM};
use crate::store::{load_session, persist_session, KeyValueStore, StoreError};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct SessionService<S> {
    session: Session,
    store: S,
    key: String,
    rng: StdRng,
    pending_import: Option<PendingImport>,
}

impl<S: KeyValueStore> SessionService<S> {
    /// Load the session stored under `key` (fresh if missing).
    pub fn open(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let session = load_session(&store, &key);
        Self {
            session,
            store,
            key,
            rng: StdRng::from_entropy(),
            pending_import: None,
        }
    }

    /// Make shuffles reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a transition, then persist if it changed anything.
    pub fn apply<T, F>(&mut self, op: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<T, SessionError>,
    {
        let out = op(&mut self.session)?;
        self.persist();
        Ok(out)
    }

    /// Shuffle teams with the service's random source.
    pub fn shuffle_teams(&mut self) -> Result<(), SessionError> {
        shuffle_teams_with(&mut self.session, &mut self.rng)?;
        self.persist();
        Ok(())
    }

    /// Share link for the current state; `None` (logged) if encoding fails.
    pub fn share_link(&self, base_url: &str) -> Option<String> {
        match share::share_link(base_url, &self.session) {
            Ok(link) => Some(link),
            Err(e) => {
                log::warn!("could not build share link: {}", e);
                None
            }
        }
    }

    /// Stage shared state (a link, hash fragment or bare token) for import.
    ///
    /// Returns the preview; the local session is untouched until
    /// [`confirm_import`](Self::confirm_import).
    pub fn stage_import(&mut self, link_or_token: &str) -> Option<&Session> {
        let pending = if link_or_token.contains(STATE_PARAM) {
            PendingImport::from_link(link_or_token)
        } else {
            PendingImport::from_token(link_or_token)
        };
        self.pending_import = pending;
        self.pending_import.as_ref().map(PendingImport::preview)
    }

    pub fn pending_import(&self) -> Option<&Session> {
        self.pending_import.as_ref().map(PendingImport::preview)
    }

    /// Overwrite the local session with the staged state.
    pub fn confirm_import(&mut self) -> Result<(), SessionError> {
        let pending = self
            .pending_import
            .take()
            .ok_or(SessionError::NoPendingImport)?;
        pending.confirm(&mut self.session);
        self.persist();
        Ok(())
    }

    /// Discard the staged state. Returns whether anything was staged.
    pub fn cancel_import(&mut self) -> bool {
        self.pending_import.take().is_some()
    }

    /// Delete the saved snapshot. The in-memory session stays as it is.
    pub fn delete_saved(&mut self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }

    fn persist(&mut self) {
        persist_session(&mut self.store, &self.key, &self.session);
    }
}
