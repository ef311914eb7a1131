use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not access the session store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not serialize the session: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A tiny key-value store for client state that must survive a restart, such as the signed-in identity.
///
/// Values are opaque strings to the store. Callers are responsible for handling values they cannot parse.
pub trait SessionStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn write(&self, key: &str, value: &str) -> Result<(), SessionError>;
    /// Removes the key. Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// A [`SessionStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}
