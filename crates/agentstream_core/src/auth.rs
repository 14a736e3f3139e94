//! crates/agentstream_core/src/auth.rs
//!
//! Profile and credential management on top of `Storage`.

use crate::domain::{initials, AuthStatus, LoginMethod, Profile};
use crate::identity::decode_identity_token;
use crate::ports::{PortError, PortResult};
use crate::storage::{generate_id, Storage};
use chrono::Utc;
use tracing::info;

/// Holds the API credential and the current profile for one running session.
pub struct AuthManager {
    storage: Storage,
    api_key: Option<String>,
    current_profile: Option<Profile>,
}

impl AuthManager {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            api_key: None,
            current_profile: None,
        }
    }

    /// Restores the stored credential and current profile.
    pub fn initialize(&mut self) -> AuthStatus {
        self.api_key = self.storage.api_key();
        self.current_profile = self.storage.current_profile();

        AuthStatus {
            is_authenticated: self.api_key.is_some(),
            has_profile: self.current_profile.is_some(),
        }
    }

    /// Logs in with a bare API key, creating a new manual profile.
    pub fn login_with_credential(&mut self, api_key: &str) -> PortResult<Profile> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(PortError::Validation("API key is required".to_string()));
        }

        let profile = self.create_profile(
            api_key,
            "User".to_string(),
            None,
            Some("U".to_string()),
            LoginMethod::Manual,
        );
        info!(profile_id = %profile.id, "Logged in with API key");
        Ok(profile)
    }

    /// Logs in with a third-party identity token. The token only supplies the
    /// display name, email and avatar; an API key is still required.
    pub fn login_with_external_identity(
        &mut self,
        identity_token: &str,
        api_key: Option<&str>,
    ) -> PortResult<Profile> {
        let claims = decode_identity_token(identity_token)?;

        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PortError::Auth("API key is required".to_string()))?;

        let name = claims
            .name
            .clone()
            .or_else(|| claims.email.clone())
            .unwrap_or_else(|| "User".to_string());
        let avatar = claims
            .picture
            .clone()
            .unwrap_or_else(|| initials(claims.name.as_deref()));

        let profile = self.create_profile(
            api_key,
            name,
            claims.email.clone(),
            Some(avatar),
            LoginMethod::Google,
        );
        info!(
            profile_id = %profile.id,
            email = claims.email.as_deref().unwrap_or("<missing>"),
            "Logged in with identity token"
        );
        Ok(profile)
    }

    /// Makes `profile_id` current. Returns `false` if no such profile is stored.
    pub fn switch_profile(&mut self, profile_id: &str) -> bool {
        let Some(profile) = self
            .storage
            .profiles()
            .into_iter()
            .find(|p| p.id == profile_id)
        else {
            return false;
        };

        self.storage.set_current_profile(&profile.id);
        self.current_profile = Some(profile);
        true
    }

    /// Forgets the credential and the current profile. Stored profiles and
    /// their data are kept.
    pub fn logout(&mut self) {
        self.api_key = None;
        self.current_profile = None;
        self.storage.clear_api_key();
        self.storage.clear_current_profile();
        info!("Logged out");
    }

    /// Deletes a profile and its data, returning the profiles that remain.
    pub fn delete_profile(&mut self, profile_id: &str) -> Vec<Profile> {
        let remaining = self.storage.delete_profile(profile_id);

        if self
            .current_profile
            .as_ref()
            .is_some_and(|p| p.id == profile_id)
        {
            self.current_profile = None;
        }
        if remaining.is_empty() {
            self.api_key = None;
        }

        remaining
    }

    pub fn current_profile(&self) -> Option<&Profile> {
        self.current_profile.as_ref()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.storage.profiles()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn create_profile(
        &mut self,
        api_key: &str,
        name: String,
        email: Option<String>,
        avatar: Option<String>,
        login_method: LoginMethod,
    ) -> Profile {
        self.api_key = Some(api_key.to_string());
        self.storage.set_api_key(api_key);

        let profile = self.storage.add_profile(Profile {
            id: generate_id(),
            name,
            email,
            avatar,
            login_method,
            created_at: Utc::now(),
        });
        self.storage.set_current_profile(&profile.id);
        self.current_profile = Some(profile.clone());
        profile
    }
}
