use log::*;
use sf_common::helpers::token_prefix;

use crate::{
    data_types::Identity,
    traits::{SessionError, SessionStore},
};

/// The key under which the signed-in identity is persisted.
pub const IDENTITY_KEY: &str = "auth";

/// Holds the signed-in identity and keeps the persisted copy in step with it.
///
/// Tokens are used as they are until the customer signs in again. The holder never checks expiry; any request may
/// still be rejected by the server.
pub struct SessionHolder<S> {
    store: S,
    identity: Option<Identity>,
}

impl<S: SessionStore> SessionHolder<S> {
    pub fn new(store: S) -> Self {
        Self { store, identity: None }
    }

    /// Loads the persisted identity, if any.
    ///
    /// A record that cannot be read or parsed is removed and treated as "no session". This never fails.
    pub fn restore(&mut self) -> Option<&Identity> {
        self.identity = match self.store.read(IDENTITY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) if identity.has_credential() => {
                    info!("🔑️ Restored session for {} ({})", identity.email, token_prefix(identity.token()));
                    Some(identity)
                },
                Ok(_) => {
                    warn!("🔑️ The stored session has no access token. Discarding it.");
                    self.discard_persisted();
                    None
                },
                Err(e) => {
                    warn!("🔑️ The stored session is corrupt and will be discarded. {e}");
                    self.discard_persisted();
                    None
                },
            },
            Ok(None) => {
                debug!("🔑️ No stored session");
                None
            },
            Err(e) => {
                warn!("🔑️ Could not read the stored session. Continuing without one. {e}");
                self.discard_persisted();
                None
            },
        };
        self.identity.as_ref()
    }

    /// Sets the current identity and persists it.
    ///
    /// The in-memory identity is set even if persisting fails, in which case the error is returned so that the caller
    /// can warn that the session will not survive a restart.
    pub fn set(&mut self, identity: Identity) -> Result<(), SessionError> {
        info!("🔑️ Signed in as {} ({})", identity.email, token_prefix(identity.token()));
        let serialized = serde_json::to_string(&identity);
        self.identity = Some(identity);
        self.store.write(IDENTITY_KEY, &serialized?)
    }

    /// Forgets the current identity, both in memory and in the store.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if let Some(identity) = self.identity.take() {
            info!("🔑️ Signed out {}", identity.email);
        }
        self.store.remove(IDENTITY_KEY)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The bearer token of the current identity, if there is one and it is not blank.
    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().filter(|i| i.has_credential()).map(|i| i.token())
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.store.remove(IDENTITY_KEY) {
            warn!("🔑️ Could not remove the stored session. {e}");
        }
    }
}
