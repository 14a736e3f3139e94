//! crates/agentstream_core/src/feed.rs
//!
//! A feed session: initial load, load-more pagination and rate-limited
//! refresh, all driven by the profile's stored feed preference.

use crate::domain::{FeedPreference, Workflow};
use crate::ports::{PortResult, TextGenerationService};
use crate::storage::Storage;
use crate::workflows::{GenerationProgress, WorkflowManager};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Sizes and timings of a feed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub initial_feed_size: usize,
    pub batch_size: usize,
    pub max_workflows: usize,
    pub refresh_cooldown: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_feed_size: 3,
            batch_size: 3,
            max_workflows: 30,
            refresh_cooldown: Duration::from_millis(3000),
        }
    }
}

/// Accepts at most one refresh per `interval`. Not persisted.
#[derive(Debug, Clone)]
pub struct RefreshCooldown {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl RefreshCooldown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Accepts the request and re-arms the timer, unless the previous accepted
    /// request was less than `interval` before `now`.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }
}

/// Owns the `WorkflowManager` it drives, so the feed cap always comes from
/// `FeedConfig::max_workflows`.
pub struct FeedSession {
    manager: WorkflowManager,
    storage: Storage,
    config: FeedConfig,
    cooldown: RefreshCooldown,
}

impl FeedSession {
    pub fn new(
        storage: Storage,
        generator: Arc<dyn TextGenerationService>,
        config: FeedConfig,
    ) -> Self {
        Self {
            manager: WorkflowManager::new(storage.clone(), generator, config.max_workflows),
            storage,
            cooldown: RefreshCooldown::new(config.refresh_cooldown),
            config,
        }
    }

    pub fn manager(&self) -> &WorkflowManager {
        &self.manager
    }

    fn preference(&self, profile_id: Option<&str>) -> FeedPreference {
        profile_id
            .map(|id| self.storage.feed_preference(id))
            .unwrap_or_default()
    }

    /// Clears the feed and generates the initial batch.
    pub async fn load_initial(
        &mut self,
        profile_id: Option<&str>,
        on_progress: Option<GenerationProgress<'_>>,
    ) -> PortResult<Vec<Workflow>> {
        self.manager.reset_feed();
        let preference = self.preference(profile_id);
        info!(?preference, "Loading initial feed");

        self.manager
            .generate_workflows(
                profile_id,
                self.config.initial_feed_size,
                preference.is_personalized(),
                on_progress,
            )
            .await
    }

    /// Generates the next batch, or returns `None` when the feed cannot grow.
    pub async fn load_more(
        &mut self,
        profile_id: Option<&str>,
        on_progress: Option<GenerationProgress<'_>>,
    ) -> PortResult<Option<Vec<Workflow>>> {
        if !self.manager.can_load_more() {
            return Ok(None);
        }

        let preference = self.preference(profile_id);
        let batch = self
            .manager
            .generate_workflows(
                profile_id,
                self.config.batch_size,
                preference.is_personalized(),
                on_progress,
            )
            .await?;
        Ok(Some(batch))
    }

    /// Reloads the feed from scratch. Returns `None` while cooling down.
    pub async fn refresh(
        &mut self,
        profile_id: Option<&str>,
        on_progress: Option<GenerationProgress<'_>>,
    ) -> PortResult<Option<Vec<Workflow>>> {
        if !self.cooldown.try_acquire() {
            info!("Refresh rejected during cooldown");
            return Ok(None);
        }
        self.load_initial(profile_id, on_progress).await.map(Some)
    }
}
