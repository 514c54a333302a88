use crate::error::StorageError;
use crate::looper::{LoopState, Preferences, LOOP_STATE_KEY, PREFERENCES_KEY};
use crate::messaging::{decode, BackgroundRequest, ContentRequest, ContextHandle, Outcome, TabRegistry};
use crate::storage::{SharedStorage, StorageMap};
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Why the worker was (re)installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update { previous_version: String },
}

/// A tab navigation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabUpdate {
    pub tab_id: u32,
    /// `loading` or `complete`.
    pub status: String,
    pub url: Option<String>,
}

impl TabUpdate {
    pub fn complete(tab_id: u32, url: &str) -> Self {
        Self {
            tab_id,
            status: "complete".to_string(),
            url: Some(url.to_string()),
        }
    }
}

/// Where an automatic state push ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    /// Stored state is disabled or incomplete; nothing to restore.
    Skipped,
    NoStoredState,
    /// The tab did not answer or refused.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Wait after a page finished loading before pushing state to it.
    pub delay: Duration,
    /// Substring identifying player tabs.
    pub host: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            host: "open.spotify.com".to_string(),
        }
    }
}

/// Long-lived worker: seeds storage, answers storage messages and re-syncs
/// freshly loaded player tabs 🛰️
#[derive(Clone)]
pub struct BackgroundWorker {
    storage: SharedStorage,
    tabs: TabRegistry,
    settings: SyncSettings,
}

impl BackgroundWorker {
    pub fn new(storage: SharedStorage, tabs: TabRegistry, settings: SyncSettings) -> Self {
        tracing::info!("background worker started");
        Self {
            storage,
            tabs,
            settings,
        }
    }

    pub fn on_installed(&self, reason: InstallReason) {
        match reason {
            InstallReason::Install => {
                tracing::info!("first install");
                if let Err(e) = self.initialize_storage() {
                    tracing::warn!("storage init failed: {}", e);
                }
            }
            InstallReason::Update { previous_version } => {
                tracing::info!("updated from {}", previous_version);
                if let Err(e) = self.migrate(&previous_version) {
                    tracing::warn!("update handling failed: {}", e);
                }
            }
        }
    }

    pub fn on_startup(&self) {
        tracing::info!("browser startup");
    }

    /// Seed defaults for keys with no value yet. Returns how many were written.
    pub fn initialize_storage(&self) -> Result<usize, StorageError> {
        let existing = self.storage.get(&[LOOP_STATE_KEY, PREFERENCES_KEY])?;
        let defaults = [
            (LOOP_STATE_KEY, serde_json::to_value(LoopState::default())?),
            (PREFERENCES_KEY, serde_json::to_value(Preferences::default())?),
        ];

        let to_set: StorageMap = defaults
            .into_iter()
            .filter(|(key, _)| existing.get(*key).map_or(true, Value::is_null))
            .map(|(key, value)| (key.to_string(), value))
            .collect();

        let written = to_set.len();
        if written > 0 {
            tracing::info!("default settings written: {:?}", to_set.keys().collect::<Vec<_>>());
            self.storage.set(to_set)?;
        }
        Ok(written)
    }

    /// Settings carry over as they are; only read back for the log.
    fn migrate(&self, previous_version: &str) -> Result<(), StorageError> {
        let current = self.storage.get_all()?;
        tracing::debug!("settings after update from {}: {:?}", previous_version, current);
        Ok(())
    }

    // --- Storage messages ---

    pub fn handle_message(&self, payload: Value) -> Value {
        tracing::debug!("background <- {}", payload);
        let outcome = match decode::<BackgroundRequest>(payload) {
            Ok(request) => self.handle_request(request),
            Err(outcome) => outcome,
        };
        outcome.into_value()
    }

    pub fn handle_request(&self, request: BackgroundRequest) -> Outcome {
        let result = match request {
            BackgroundRequest::GetStorage { key } => self.get_storage(key.as_deref()),
            BackgroundRequest::SetStorage { key, data } => {
                let mut items = StorageMap::new();
                items.insert(key.clone(), data);
                self.storage.set(items).map(|_| {
                    tracing::debug!("stored {}", key);
                    None
                })
            }
            BackgroundRequest::ClearStorage { key } => {
                self.storage.remove(key.as_deref()).map(|_| {
                    match key {
                        Some(key) => tracing::debug!("cleared {}", key),
                        None => tracing::debug!("cleared all storage"),
                    }
                    None
                })
            }
        };

        match result {
            Ok(data) => Outcome::with_data(data),
            Err(e) => {
                tracing::warn!("storage request failed: {}", e);
                Outcome::failed(e.to_string())
            }
        }
    }

    fn get_storage(&self, key: Option<&str>) -> Result<Option<Value>, StorageError> {
        match key {
            Some(key) => Ok(self.storage.get(&[key])?.remove(key)),
            None => Ok(Some(Value::Object(self.storage.get_all()?))),
        }
    }

    /// Serve storage messages on a task of their own.
    pub fn listen(&self) -> ContextHandle {
        let (handle, mut inbox) = ContextHandle::channel();
        let worker = self.clone();
        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let reply = worker.handle_message(envelope.payload.clone());
                envelope.respond(reply);
            }
        });
        handle
    }

    // --- Tab sync ---

    /// Schedule a state push into a player tab that just finished loading.
    pub fn on_tab_updated(&self, update: &TabUpdate) -> Option<JoinHandle<SyncOutcome>> {
        let is_player = update
            .url
            .as_deref()
            .is_some_and(|url| url.contains(&self.settings.host));
        if update.status != "complete" || !is_player {
            return None;
        }

        tracing::info!("player tab {} loaded", update.tab_id);
        let worker = self.clone();
        let tab_id = update.tab_id;
        Some(tokio::spawn(async move {
            tokio::time::sleep(worker.settings.delay).await;
            worker.sync_state_to_content(tab_id).await
        }))
    }

    /// Push the stored loop into a tab, but only a loop worth restoring.
    pub async fn sync_state_to_content(&self, tab_id: u32) -> SyncOutcome {
        tracing::info!("syncing loop state to tab {}", tab_id);
        let state = match LoopState::load(self.storage.as_ref()) {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!("no stored loop state");
                return SyncOutcome::NoStoredState;
            }
            Err(e) => {
                tracing::warn!("stored loop state unreadable: {}", e);
                return SyncOutcome::NoStoredState;
            }
        };

        if !state.enabled || !state.has_both() {
            tracing::info!("stored loop disabled or incomplete, sync skipped");
            return SyncOutcome::Skipped;
        }

        let request = ContentRequest::InitState {
            state: state.sync_state(),
        };
        let accepted = self
            .tabs
            .ask(tab_id, &request)
            .await
            .and_then(|reply| reply.get("success").and_then(Value::as_bool))
            .unwrap_or(false);

        if accepted {
            tracing::info!("loop restored in tab {}", tab_id);
            SyncOutcome::Synced
        } else {
            tracing::warn!("state sync to tab {} failed", tab_id);
            SyncOutcome::Failed
        }
    }
}
