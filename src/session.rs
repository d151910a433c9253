//! Process-wide session state: the bearer credential and the signed-in user.
//!
//! Written once at login, read by every outgoing request, cleared on
//! logout. Clients receive a `Session` at construction instead of looking
//! the token up globally, so tests can hand them an in-memory session.

use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::api::types::User;
use crate::storage::LocalStorage;

const TOKEN_KEY: &str = "accessToken";
const USER_KEY: &str = "user";

#[derive(Debug, Default)]
struct SessionState {
  token: Option<String>,
  user: Option<User>,
}

#[derive(Clone, Default)]
pub struct Session {
  state: Arc<RwLock<SessionState>>,
  storage: Option<Arc<LocalStorage>>,
}

impl Session {
  #[cfg(test)]
  /// Session that lives only as long as the process.
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Session backed by local storage; restores a previously stored token.
  pub fn persistent(storage: LocalStorage) -> Self {
    let token = storage.get_item(TOKEN_KEY).unwrap_or_else(|e| {
      warn!("Failed to restore session token: {}", e);
      None
    });
    let user = storage
      .get_item(USER_KEY)
      .ok()
      .flatten()
      .and_then(|raw| serde_json::from_str(&raw).ok());

    Self {
      state: Arc::new(RwLock::new(SessionState { token, user })),
      storage: Some(Arc::new(storage)),
    }
  }

  pub fn token(&self) -> Option<String> {
    self.state.read().ok().and_then(|s| s.token.clone())
  }

  pub fn user(&self) -> Option<User> {
    self.state.read().ok().and_then(|s| s.user.clone())
  }

  pub fn is_signed_in(&self) -> bool {
    self.state.read().map(|s| s.token.is_some()).unwrap_or(false)
  }

  pub fn sign_in(&self, token: String, user: User) {
    if let Some(storage) = &self.storage {
      if let Err(e) = storage.set_item(TOKEN_KEY, &token) {
        warn!("Failed to persist session token: {}", e);
      }
      match serde_json::to_string(&user) {
        Ok(raw) => {
          if let Err(e) = storage.set_item(USER_KEY, &raw) {
            warn!("Failed to persist session user: {}", e);
          }
        }
        Err(e) => warn!("Failed to serialize session user: {}", e),
      }
    }

    if let Ok(mut state) = self.state.write() {
      state.token = Some(token);
      state.user = Some(user);
    }
  }

  pub fn sign_out(&self) {
    if let Some(storage) = &self.storage {
      for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove_item(key) {
          warn!("Failed to clear {}: {}", key, e);
        }
      }
    }

    if let Ok(mut state) = self.state.write() {
      state.token = None;
      state.user = None;
    }
  }
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("signed_in", &self.is_signed_in())
      .field("persistent", &self.storage.is_some())
      .finish()
  }
}
