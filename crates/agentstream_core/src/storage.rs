//! crates/agentstream_core/src/storage.rs
//!
//! A typed facade over the `KeyValueStore` port. Everything the application
//! persists goes through here as JSON under one of the fixed `StorageKey`s.
//!
//! Profile-scoped collections are single entries mapping a profile id to that
//! profile's data; the profile id is always passed in explicitly.

use crate::domain::{FeedPreference, Profile, Workflow};
use crate::ports::{CredentialProvider, KeyValueStore, PortError, PortResult};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Maximum number of executions kept per profile.
pub const HISTORY_LIMIT: usize = 100;

/// The fixed set of keys the application stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    ApiKey,
    Profiles,
    CurrentProfile,
    SavedWorkflows,
    FeedPreference,
    WorkflowHistory,
    WelcomeShown,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::ApiKey => "agentstream_api_key",
            StorageKey::Profiles => "agentstream_profiles",
            StorageKey::CurrentProfile => "agentstream_current_profile",
            StorageKey::SavedWorkflows => "agentstream_saved_workflows",
            StorageKey::FeedPreference => "agentstream_feed_preference",
            StorageKey::WorkflowHistory => "agentstream_workflow_history",
            StorageKey::WelcomeShown => "agentstream_welcome_shown",
        }
    }
}

/// Generates a collision-resistant opaque identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

type Scoped<T> = HashMap<String, T>;

//=========================================================================================
// In-memory adapter
//=========================================================================================

/// A `KeyValueStore` that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

//=========================================================================================
// Storage facade
//=========================================================================================

/// Typed access to the application's persisted state.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A storage facade over a fresh `MemoryStore`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // --- Generic operations ---

    /// Serializes and stores `value`. Failures are logged and reported as `false`.
    pub fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> bool {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Failed to serialize value for storage");
                return false;
            }
        };

        match self.store.set(key.as_str(), text) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Failed to write to storage");
                false
            }
        }
    }

    /// Loads and deserializes a value. Missing and corrupt entries both read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let text = match self.store.get(key.as_str()) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Failed to read from storage");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Ignoring corrupt storage entry");
                None
            }
        }
    }

    pub fn remove(&self, key: StorageKey) -> bool {
        match self.store.remove(key.as_str()) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Failed to remove from storage");
                false
            }
        }
    }

    // --- Credential ---

    pub fn api_key(&self) -> Option<String> {
        self.get(StorageKey::ApiKey)
    }

    pub fn set_api_key(&self, api_key: &str) -> bool {
        self.set(StorageKey::ApiKey, api_key)
    }

    pub fn clear_api_key(&self) -> bool {
        self.remove(StorageKey::ApiKey)
    }

    // --- Profiles ---

    pub fn profiles(&self) -> Vec<Profile> {
        self.get(StorageKey::Profiles).unwrap_or_default()
    }

    pub fn add_profile(&self, profile: Profile) -> Profile {
        let mut profiles = self.profiles();
        profiles.push(profile.clone());
        self.set(StorageKey::Profiles, &profiles);
        profile
    }

    pub fn current_profile_id(&self) -> Option<String> {
        self.get(StorageKey::CurrentProfile)
    }

    pub fn set_current_profile(&self, profile_id: &str) -> bool {
        self.set(StorageKey::CurrentProfile, profile_id)
    }

    pub fn clear_current_profile(&self) -> bool {
        self.remove(StorageKey::CurrentProfile)
    }

    /// The stored current profile, if its id still resolves.
    pub fn current_profile(&self) -> Option<Profile> {
        let profile_id = self.current_profile_id()?;
        self.profiles().into_iter().find(|p| p.id == profile_id)
    }

    /// Removes a profile and everything scoped to it. Returns the remaining profiles.
    pub fn delete_profile(&self, profile_id: &str) -> Vec<Profile> {
        let remaining: Vec<Profile> = self
            .profiles()
            .into_iter()
            .filter(|p| p.id != profile_id)
            .collect();
        self.set(StorageKey::Profiles, &remaining);

        self.clear_profile_data(profile_id);

        if self.current_profile_id().as_deref() == Some(profile_id) {
            self.clear_current_profile();
        }

        if remaining.is_empty() {
            self.clear_api_key();
        }

        info!(profile_id, remaining = remaining.len(), "Deleted profile");
        remaining
    }

    /// Purges the saved workflows, history and feed preference of one profile.
    pub fn clear_profile_data(&self, profile_id: &str) {
        let mut saved = self.scoped::<Vec<Workflow>>(StorageKey::SavedWorkflows);
        let mut history = self.scoped::<Vec<Workflow>>(StorageKey::WorkflowHistory);
        let mut preferences = self.scoped::<FeedPreference>(StorageKey::FeedPreference);

        saved.remove(profile_id);
        history.remove(profile_id);
        preferences.remove(profile_id);

        self.set(StorageKey::SavedWorkflows, &saved);
        self.set(StorageKey::WorkflowHistory, &history);
        self.set(StorageKey::FeedPreference, &preferences);
    }

    // --- Saved workflows ---

    pub fn saved_workflows(&self, profile_id: &str) -> Vec<Workflow> {
        self.scoped::<Vec<Workflow>>(StorageKey::SavedWorkflows)
            .remove(profile_id)
            .unwrap_or_default()
    }

    /// Saves a copy of `workflow` stamped with `saved_at`. Saving an id that is
    /// already saved leaves the stored copy untouched.
    pub fn save_workflow(&self, profile_id: &str, workflow: &Workflow) -> Workflow {
        let mut saved = self.scoped::<Vec<Workflow>>(StorageKey::SavedWorkflows);
        let entries = saved.entry(profile_id.to_string()).or_default();

        let mut stamped = workflow.clone();
        stamped.saved_at = Some(Utc::now());

        if !entries.iter().any(|w| w.id == stamped.id) {
            entries.push(stamped.clone());
            self.set(StorageKey::SavedWorkflows, &saved);
        }

        stamped
    }

    pub fn unsave_workflow(&self, profile_id: &str, workflow_id: &str) {
        let mut saved = self.scoped::<Vec<Workflow>>(StorageKey::SavedWorkflows);
        if let Some(entries) = saved.get_mut(profile_id) {
            entries.retain(|w| w.id != workflow_id);
            self.set(StorageKey::SavedWorkflows, &saved);
        }
    }

    pub fn is_workflow_saved(&self, profile_id: &str, workflow_id: &str) -> bool {
        self.saved_workflows(profile_id)
            .iter()
            .any(|w| w.id == workflow_id)
    }

    // --- History ---

    /// Records an execution at the front of the profile's history, evicting
    /// the oldest entries past `HISTORY_LIMIT`.
    pub fn add_to_history(&self, profile_id: &str, workflow: &Workflow) {
        let mut history = self.scoped::<Vec<Workflow>>(StorageKey::WorkflowHistory);
        let entries = history.entry(profile_id.to_string()).or_default();

        let mut executed = workflow.clone();
        executed.executed_at = Some(Utc::now());
        entries.insert(0, executed);
        entries.truncate(HISTORY_LIMIT);

        self.set(StorageKey::WorkflowHistory, &history);
    }

    pub fn history(&self, profile_id: &str) -> Vec<Workflow> {
        self.scoped::<Vec<Workflow>>(StorageKey::WorkflowHistory)
            .remove(profile_id)
            .unwrap_or_default()
    }

    // --- Feed preference ---

    pub fn feed_preference(&self, profile_id: &str) -> FeedPreference {
        self.scoped::<FeedPreference>(StorageKey::FeedPreference)
            .remove(profile_id)
            .unwrap_or_default()
    }

    pub fn set_feed_preference(&self, profile_id: &str, preference: FeedPreference) -> bool {
        let mut preferences = self.scoped::<FeedPreference>(StorageKey::FeedPreference);
        preferences.insert(profile_id.to_string(), preference);
        self.set(StorageKey::FeedPreference, &preferences)
    }

    // --- Welcome flag ---

    pub fn has_seen_welcome(&self) -> bool {
        self.get(StorageKey::WelcomeShown).unwrap_or(false)
    }

    pub fn mark_welcome_seen(&self) -> bool {
        self.set(StorageKey::WelcomeShown, &true)
    }

    fn scoped<T: DeserializeOwned>(&self, key: StorageKey) -> Scoped<T> {
        self.get(key).unwrap_or_default()
    }
}

impl CredentialProvider for Storage {
    fn api_key(&self) -> Option<String> {
        Storage::api_key(self)
    }
}
