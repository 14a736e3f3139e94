pub mod auth;
pub mod domain;
pub mod feed;
pub mod identity;
pub mod ports;
pub mod storage;
pub mod workflows;

pub use auth::AuthManager;
pub use domain::{
    AuthStatus, Category, CategoryRank, Difficulty, ExecutionProgress, ExecutionResult,
    ExecutionStatus, FeedPreference, LoginMethod, Profile, Workflow, WorkflowDraft,
};
pub use feed::{FeedConfig, FeedSession, RefreshCooldown};
pub use ports::{
    CredentialProvider, GenerationRequest, KeyValueStore, PortError, PortResult,
    TextGenerationService, TextStream,
};
pub use storage::{MemoryStore, Storage, StorageKey};
pub use workflows::WorkflowManager;
