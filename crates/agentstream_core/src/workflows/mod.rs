//! crates/agentstream_core/src/workflows/mod.rs
//!
//! The workflow manager: generates feed batches from the text-generation
//! port, executes workflows by streaming, and tracks the feed session state.

mod parser;
mod progress;
mod prompts;
mod ranking;

pub use parser::{fallback_workflows, parse_workflows, try_parse_workflows};
pub use progress::count_step_markers;
pub use prompts::{
    build_execution_prompt, build_personalized_prompt, build_stock_prompt,
    DESIGNER_SYSTEM_INSTRUCTION, EXECUTOR_SYSTEM_INSTRUCTION,
};
pub use ranking::{extract_categories, extract_tools};

use crate::domain::{ExecutionProgress, ExecutionResult, ExecutionStatus, Workflow};
use crate::ports::{GenerationRequest, PortError, PortResult, TextGenerationService};
use crate::storage::{generate_id, Storage};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Callback receiving coarse generation progress in `[0.0, 1.0]`.
pub type GenerationProgress<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// Callback receiving one report per streamed execution fragment.
pub type ExecutionProgressFn<'a> = &'a (dyn Fn(&ExecutionProgress) + Send + Sync);

//=========================================================================================
// Feed State
//=========================================================================================

#[derive(Debug)]
struct FeedState {
    workflows: Vec<Workflow>,
    has_more: bool,
    generating: bool,
    executing: Option<String>,
}

/// Resets part of the feed state when dropped, so flags never outlive the
/// call that set them, whether it returned, failed or was cancelled.
struct ResetOnDrop<'a> {
    state: &'a Mutex<FeedState>,
    reset: fn(&mut FeedState),
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        (self.reset)(&mut state);
    }
}

//=========================================================================================
// The Workflow Manager
//=========================================================================================

pub struct WorkflowManager {
    storage: Storage,
    generator: Arc<dyn TextGenerationService>,
    max_workflows: usize,
    state: Mutex<FeedState>,
}

impl WorkflowManager {
    pub fn new(
        storage: Storage,
        generator: Arc<dyn TextGenerationService>,
        max_workflows: usize,
    ) -> Self {
        Self {
            storage,
            generator,
            max_workflows,
            state: Mutex::new(FeedState {
                workflows: Vec::new(),
                has_more: true,
                generating: false,
                executing: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generates a batch of `count` workflows and appends it to the feed.
    ///
    /// Returns only the new batch. Network, API and format failures fall back
    /// to the built-in workflows; authentication and validation errors are
    /// returned to the caller.
    pub async fn generate_workflows(
        &self,
        profile_id: Option<&str>,
        count: usize,
        personalized: bool,
        on_progress: Option<GenerationProgress<'_>>,
    ) -> PortResult<Vec<Workflow>> {
        let _generating = self.begin_generating();
        let report = |fraction: f32| {
            if let Some(on_progress) = on_progress {
                on_progress(fraction);
            }
        };
        report(0.0);

        let saved = profile_id
            .map(|id| self.storage.saved_workflows(id))
            .unwrap_or_default();

        let prompt = if personalized && !saved.is_empty() {
            let categories = extract_categories(&saved);
            let tools = extract_tools(&saved);
            build_personalized_prompt(count, &categories, &tools, &saved)
        } else {
            build_stock_prompt(count)
        };
        info!(count, personalized, saved = saved.len(), "Generating workflows");

        let request =
            GenerationRequest::new(prompt).with_system_instruction(DESIGNER_SYSTEM_INSTRUCTION);
        report(0.2);

        let drafts = match self.generator.generate(&request).await {
            Ok(response) => {
                report(0.6);
                parse_workflows(&response)
            }
            Err(e) if e.is_recoverable_generation_failure() => {
                warn!(error = %e, "Workflow generation failed; using fallback set");
                fallback_workflows()
            }
            Err(e) => return Err(e),
        };
        report(0.8);

        let generated_at = Utc::now();
        let batch: Vec<Workflow> = drafts
            .into_iter()
            .map(|draft| Workflow::from_draft(draft, generate_id(), generated_at))
            .collect();
        report(1.0);

        let total = {
            let mut state = self.state();
            state.workflows.extend(batch.iter().cloned());
            state.workflows.len()
        };
        info!(generated = batch.len(), total, "Workflow generation complete");

        Ok(batch)
    }

    /// Runs `workflow` through a streaming generation, reporting progress per
    /// fragment and recording the execution in the profile's history.
    ///
    /// Errors are returned unchanged. Cancelling `cancel` drops the in-flight
    /// stream and returns `PortError::Cancelled` without touching history.
    pub async fn execute_workflow(
        &self,
        profile_id: Option<&str>,
        workflow: &Workflow,
        on_progress: Option<ExecutionProgressFn<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> PortResult<ExecutionResult> {
        self.state().executing = Some(workflow.id.clone());
        let _executing = ResetOnDrop {
            state: &self.state,
            reset: |state| state.executing = None,
        };
        info!(workflow_id = %workflow.id, title = %workflow.title, "Executing workflow");

        let request = GenerationRequest::new(build_execution_prompt(workflow))
            .with_system_instruction(EXECUTOR_SYSTEM_INSTRUCTION);
        let total_steps = workflow.steps.len();

        let mut on_chunk = |_fragment: &str, full: &str| {
            if let Some(on_progress) = on_progress {
                on_progress(&ExecutionProgress {
                    current_step: count_step_markers(full),
                    total_steps,
                    content: full.to_string(),
                    status: ExecutionStatus::Running,
                });
            }
        };
        let streaming = self.generator.generate_streaming(&request, &mut on_chunk);

        let results = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(workflow_id = %workflow.id, "Workflow execution cancelled");
                    return Err(PortError::Cancelled);
                }
                results = streaming => results?,
            },
            None => streaming.await?,
        };

        if let Some(profile_id) = profile_id {
            self.storage.add_to_history(profile_id, workflow);
        }
        info!(workflow_id = %workflow.id, chars = results.len(), "Workflow execution complete");

        Ok(ExecutionResult {
            workflow: workflow.clone(),
            results,
            completed_at: Utc::now(),
            status: ExecutionStatus::Completed,
        })
    }

    /// Whether another batch may be requested right now.
    pub fn can_load_more(&self) -> bool {
        let state = self.state();
        state.has_more && !state.generating && state.workflows.len() < self.max_workflows
    }

    pub fn reset_feed(&self) {
        let mut state = self.state();
        state.workflows.clear();
        state.has_more = true;
    }

    pub fn current_workflows(&self) -> Vec<Workflow> {
        self.state().workflows.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.state().generating
    }

    pub fn executing_workflow_id(&self) -> Option<String> {
        self.state().executing.clone()
    }

    pub fn max_workflows(&self) -> usize {
        self.max_workflows
    }

    fn begin_generating(&self) -> ResetOnDrop<'_> {
        let mut state = self.state();
        if state.generating {
            warn!("Workflow generation requested while another is in flight");
        }
        state.generating = true;

        ResetOnDrop {
            state: &self.state,
            reset: |state| state.generating = false,
        }
    }
}
