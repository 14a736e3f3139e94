//! crates/agentstream_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These are what the key-value store persists (as JSON) and what the
//! workflow manager hands back to its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Profiles
//=========================================================================================

/// How a profile was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Google,
    Manual,
}

/// A named local identity bound to the shared API credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Either an image URL or the initials shown in its place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub login_method: LoginMethod,
    pub created_at: DateTime<Utc>,
}

/// The result of `AuthManager::initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub has_profile: bool,
}

/// Claims read out of a third-party identity token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Builds the short avatar text used when no picture is available.
pub fn initials(name: Option<&str>) -> String {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return "U".to_string();
    };

    let parts: Vec<&str> = name
        .split(|c: char| c == '@' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() >= 2 {
        parts[..2]
            .iter()
            .filter_map(|p| p.chars().next())
            .collect::<String>()
            .to_uppercase()
    } else {
        name.chars().take(2).collect::<String>().to_uppercase()
    }
}

//=========================================================================================
// Workflows
//=========================================================================================

/// The fixed set of workflow categories offered to the generator.
///
/// Generated text is free-form, so anything outside the set is kept verbatim
/// in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    DataAnalysis,
    WebScraping,
    Automation,
    Research,
    ContentCreation,
    CodeGeneration,
    DocumentProcessing,
    ApiIntegration,
    MachineLearning,
    TaskManagement,
    Communication,
    FileOperations,
    DatabaseOperations,
    SecurityPrivacy,
    CreativeTools,
    Other(String),
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::DataAnalysis,
        Category::WebScraping,
        Category::Automation,
        Category::Research,
        Category::ContentCreation,
        Category::CodeGeneration,
        Category::DocumentProcessing,
        Category::ApiIntegration,
        Category::MachineLearning,
        Category::TaskManagement,
        Category::Communication,
        Category::FileOperations,
        Category::DatabaseOperations,
        Category::SecurityPrivacy,
        Category::CreativeTools,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::DataAnalysis => "Data Analysis",
            Category::WebScraping => "Web Scraping",
            Category::Automation => "Automation",
            Category::Research => "Research",
            Category::ContentCreation => "Content Creation",
            Category::CodeGeneration => "Code Generation",
            Category::DocumentProcessing => "Document Processing",
            Category::ApiIntegration => "API Integration",
            Category::MachineLearning => "Machine Learning",
            Category::TaskManagement => "Task Management",
            Category::Communication => "Communication",
            Category::FileOperations => "File Operations",
            Category::DatabaseOperations => "Database Operations",
            Category::SecurityPrivacy => "Security & Privacy",
            Category::CreativeTools => "Creative Tools",
            Category::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == value)
            .cloned()
            .unwrap_or(Category::Other(value))
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl From<Difficulty> for &'static str {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

/// A workflow as it comes out of the generator, before it is given an
/// identity in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tools: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A workflow shown in the feed, saved by a profile, or recorded in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tools: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    pub fn from_draft(draft: WorkflowDraft, id: String, generated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            tools: draft.tools,
            steps: draft.steps,
            estimated_time: draft.estimated_time,
            difficulty: draft.difficulty,
            generated_at,
            saved_at: None,
            executed_at: None,
        }
    }
}

/// Which prompt strategy the feed uses for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPreference {
    #[default]
    Stock,
    Personalized,
}

impl FeedPreference {
    pub fn is_personalized(self) -> bool {
        self == FeedPreference::Personalized
    }
}

/// A category and how many saved workflows belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRank {
    pub name: String,
    pub count: usize,
}

//=========================================================================================
// Execution
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
}

/// A progress report emitted for every streamed fragment of an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub current_step: usize,
    pub total_steps: usize,
    pub content: String,
    pub status: ExecutionStatus,
}

/// The final outcome of a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub workflow: Workflow,
    pub results: String,
    pub completed_at: DateTime<Utc>,
    pub status: ExecutionStatus,
}
