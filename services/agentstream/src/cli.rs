//! services/agentstream/src/cli.rs
//!
//! Command-line surface of the `agentstream` binary. Parses commands with
//! `clap` and wires the core services together; no business logic lives here.

use crate::adapters::{GeminiClient, JsonFileStore};
use crate::config::Config;
use crate::error::AppError;
use agentstream_core::{
    AuthManager, ExecutionProgress, FeedPreference, FeedSession, PortError, Profile, Storage,
    TextGenerationService, Workflow, WorkflowManager,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "agentstream",
    about = "Discover and run AI agent workflows",
    long_about = "Generate a feed of AI agent workflows with Gemini, save the ones you like and run them step by step"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a Gemini API key, creating a new profile
    Login {
        #[arg(long)]
        api_key: String,
    },
    /// Log in with a Google identity token plus a Gemini API key
    LoginGoogle {
        #[arg(long)]
        token: String,
        #[arg(long)]
        api_key: String,
    },
    /// Show whether a credential and a current profile are stored
    Status,
    /// List all stored profiles
    Profiles,
    /// Make another stored profile current
    Switch { profile_id: String },
    /// Forget the credential and the current profile
    Logout,
    /// Delete a profile together with its saved workflows and history
    DeleteProfile { profile_id: String },
    /// Choose how the feed is generated for the current profile
    Preference {
        #[arg(value_enum)]
        mode: PreferenceArg,
    },
    /// Generate a feed of workflows
    Feed {
        /// Size of the first batch
        #[arg(long)]
        count: Option<usize>,
        /// Number of extra batches to load after the first one
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Save the workflow at this 1-based feed position
        #[arg(long)]
        save: Option<usize>,
    },
    /// List the current profile's saved workflows
    Saved,
    /// Remove a workflow from the saved list
    Unsave { workflow_id: String },
    /// Run a saved workflow, streaming its output (Ctrl-C cancels)
    Execute { workflow_id: String },
    /// List recently executed workflows, newest first
    History,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PreferenceArg {
    Stock,
    Personalized,
}

impl From<PreferenceArg> for FeedPreference {
    fn from(value: PreferenceArg) -> Self {
        match value {
            PreferenceArg::Stock => FeedPreference::Stock,
            PreferenceArg::Personalized => FeedPreference::Personalized,
        }
    }
}

/// The services one invocation works with.
struct Context {
    config: Config,
    storage: Storage,
    auth: AuthManager,
}

impl Context {
    fn open(config: Config) -> Result<Self, AppError> {
        let store = JsonFileStore::open(&config.data_path)?;
        let storage = Storage::new(Arc::new(store));
        let mut auth = AuthManager::new(storage.clone());
        let status = auth.initialize();
        info!(
            authenticated = status.is_authenticated,
            has_profile = status.has_profile,
            "Session restored"
        );

        Ok(Self {
            config,
            storage,
            auth,
        })
    }

    fn current_profile(&self) -> Result<Profile, AppError> {
        if !self.auth.is_authenticated() {
            return Err(
                PortError::Auth("Not logged in; run `agentstream login` first".to_string()).into(),
            );
        }
        self.auth
            .current_profile()
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound("No current profile; run `agentstream switch`".to_string())
                    .into()
            })
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerationService>, AppError> {
        let client = GeminiClient::new(
            self.config.gemini_api_base.clone(),
            self.config.gemini_model.clone(),
            self.config.http_timeout,
            Arc::new(self.storage.clone()),
        )?;
        Ok(Arc::new(client))
    }
}

/// Executes one parsed command against the store at `config.data_path`.
pub async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    let mut ctx = Context::open(config)?;
    if !ctx.storage.has_seen_welcome() {
        eprintln!("Welcome to AgentStream! Log in with `agentstream login --api-key <KEY>` to get started.");
        ctx.storage.mark_welcome_seen();
    }

    match cli.command {
        Command::Login { api_key } => {
            let profile = ctx.auth.login_with_credential(&api_key)?;
            println!("Logged in as {} ({})", profile.name, profile.id);
        }
        Command::LoginGoogle { token, api_key } => {
            let profile = ctx
                .auth
                .login_with_external_identity(&token, Some(&api_key))?;
            println!(
                "Logged in as {} <{}> ({})",
                profile.name,
                profile.email.as_deref().unwrap_or("no email"),
                profile.id
            );
        }
        Command::Status => {
            println!("Authenticated: {}", ctx.auth.is_authenticated());
            match ctx.auth.current_profile() {
                Some(profile) => {
                    let preference = ctx.storage.feed_preference(&profile.id);
                    println!("Profile: {} ({})", profile.name, profile.id);
                    println!("Feed: {preference:?}");
                }
                None => println!("Profile: none"),
            }
        }
        Command::Profiles => {
            let current = ctx.auth.current_profile().map(|p| p.id.clone());
            for profile in ctx.auth.profiles() {
                let marker = if current.as_deref() == Some(profile.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {}  [{:?}]  {}",
                    profile.id,
                    profile.name,
                    profile.login_method,
                    profile.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Switch { profile_id } => {
            if !ctx.auth.switch_profile(&profile_id) {
                return Err(PortError::NotFound(format!("profile {profile_id}")).into());
            }
            println!("Switched to {profile_id}");
        }
        Command::Logout => {
            ctx.auth.logout();
            println!("Logged out");
        }
        Command::DeleteProfile { profile_id } => {
            let remaining = ctx.auth.delete_profile(&profile_id);
            println!("Deleted {profile_id}; {} profile(s) remain", remaining.len());
        }
        Command::Preference { mode } => {
            let profile = ctx.current_profile()?;
            let preference = FeedPreference::from(mode);
            if !ctx.storage.set_feed_preference(&profile.id, preference) {
                return Err(
                    PortError::Storage("failed to store the feed preference".to_string()).into(),
                );
            }
            println!("Feed preference set to {preference:?}");
        }
        Command::Feed { count, more, save } => feed(&ctx, count, more, save).await?,
        Command::Saved => {
            let profile = ctx.current_profile()?;
            print_workflows(&ctx.storage.saved_workflows(&profile.id));
        }
        Command::Unsave { workflow_id } => {
            let profile = ctx.current_profile()?;
            if !ctx.storage.is_workflow_saved(&profile.id, &workflow_id) {
                return Err(PortError::NotFound(format!("saved workflow {workflow_id}")).into());
            }
            ctx.storage.unsave_workflow(&profile.id, &workflow_id);
            println!("Removed {workflow_id} from saved workflows");
        }
        Command::Execute { workflow_id } => execute(&ctx, &workflow_id).await?,
        Command::History => {
            let profile = ctx.current_profile()?;
            for workflow in ctx.storage.history(&profile.id) {
                let when = workflow
                    .executed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{when}  {}  {}", workflow.id, workflow.title);
            }
        }
    }

    Ok(())
}

async fn feed(
    ctx: &Context,
    count: Option<usize>,
    more: usize,
    save: Option<usize>,
) -> Result<(), AppError> {
    let profile = ctx.current_profile()?;
    let mut feed_config = ctx.config.feed;
    if let Some(count) = count {
        feed_config.initial_feed_size = count;
    }

    let mut session = FeedSession::new(ctx.storage.clone(), ctx.generator()?, feed_config);
    let on_progress = |fraction: f32| eprint!("\rGenerating... {:>3.0}%", fraction * 100.0);

    session.load_initial(Some(&profile.id), Some(&on_progress)).await?;
    for _ in 0..more {
        if session
            .load_more(Some(&profile.id), Some(&on_progress))
            .await?
            .is_none()
        {
            warn!(
                max = session.manager().max_workflows(),
                "Feed is full; not loading more"
            );
            break;
        }
    }
    eprintln!();

    let workflows = session.manager().current_workflows();
    print_workflows(&workflows);

    if let Some(position) = save {
        let workflow = position
            .checked_sub(1)
            .and_then(|i| workflows.get(i))
            .ok_or_else(|| {
                PortError::Validation(format!(
                    "--save must be between 1 and {}",
                    workflows.len()
                ))
            })?;
        let saved = ctx.storage.save_workflow(&profile.id, workflow);
        println!("Saved \"{}\" as {}", saved.title, saved.id);
    }

    Ok(())
}

async fn execute(ctx: &Context, workflow_id: &str) -> Result<(), AppError> {
    let profile = ctx.current_profile()?;
    let workflow = ctx
        .storage
        .saved_workflows(&profile.id)
        .into_iter()
        .find(|w| w.id == workflow_id)
        .ok_or_else(|| PortError::NotFound(format!("saved workflow {workflow_id}")))?;

    let manager = WorkflowManager::new(
        ctx.storage.clone(),
        ctx.generator()?,
        ctx.config.feed.max_workflows,
    );
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let printed = AtomicUsize::new(0);
    let on_progress = |progress: &ExecutionProgress| {
        let start = printed.swap(progress.content.len(), Ordering::Relaxed);
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(progress.content[start..].as_bytes());
        let _ = stdout.flush();
    };

    println!("Running \"{}\" ({} steps)\n", workflow.title, workflow.steps.len());
    let outcome = manager
        .execute_workflow(Some(&profile.id), &workflow, Some(&on_progress), Some(&cancel))
        .await;
    ctrl_c.abort();

    match outcome {
        Ok(result) => {
            println!(
                "\n\nCompleted at {}",
                result.completed_at.format("%Y-%m-%d %H:%M:%S")
            );
            Ok(())
        }
        Err(PortError::Cancelled) => {
            println!("\n\nCancelled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_workflows(workflows: &[Workflow]) {
    if workflows.is_empty() {
        println!("No workflows.");
        return;
    }
    for (i, workflow) in workflows.iter().enumerate() {
        println!(
            "{:>2}. {}  [{} | {} | {}]",
            i + 1,
            workflow.title,
            workflow.category,
            workflow.difficulty,
            workflow.estimated_time
        );
        println!("    id: {}", workflow.id);
        println!("    {}", workflow.description);
        println!("    tools: {}", workflow.tools.join(", "));
    }
}
