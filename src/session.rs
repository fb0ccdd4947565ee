//! Login gate in front of the dashboard.
//!
//! [`CredentialStore`] maps user names to passwords. It ships with the two
//! built-in accounts and can instead be loaded from a JSON file:
//! ```json
//! {
//!   "admin": "admin123",
//!   "analyst": "veh2024"
//! }
//! ```
//! [`Session`] holds the logged-in flag.

use crate::error::AuthError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{info, warn};

pub struct CredentialStore {
    entries: HashMap<String, String>,
}

impl CredentialStore {
    /// Loads the store from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials file '{path}'"))?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("credentials file '{path}' is not a JSON object of strings"))?;
        Ok(Self { entries })
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.entries.get(username).is_some_and(|p| p == password)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        let entries = [("admin", "admin123"), ("analyst", "veh2024")]
            .into_iter()
            .map(|(u, p)| (u.to_string(), p.to_string()))
            .collect();
        Self { entries }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    user: Option<String>,
}

impl Session {
    pub fn login(
        &mut self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if store.verify(username, password) {
            info!(user = username, "Logged in");
            self.user = Some(username.to_string());
            Ok(())
        } else {
            warn!(user = username, "Login rejected");
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user = %user, "Logged out");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the current user, or [`AuthError::NotLoggedIn`].
    pub fn require_login(&self) -> Result<&str, AuthError> {
        self.user.as_deref().ok_or(AuthError::NotLoggedIn)
    }
}
