//! crates/agentstream_core/src/workflows/parser.rs
//!
//! Turns generator output into workflow drafts.

use crate::domain::{Category, Difficulty, WorkflowDraft};
use crate::ports::{PortError, PortResult};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

const REQUIRED_FIELDS: [&str; 5] = ["title", "description", "category", "tools", "steps"];

fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"))
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"```(?:json)?\n?").expect("fence pattern is valid"))
}

/// Parses a generation response, falling back to the built-in workflows when
/// nothing usable can be extracted.
pub fn parse_workflows(response: &str) -> Vec<WorkflowDraft> {
    match try_parse_workflows(response) {
        Ok(drafts) => drafts,
        Err(e) => {
            warn!(error = %e, "Failed to parse workflows; using fallback set");
            fallback_workflows()
        }
    }
}

/// Strict variant of `parse_workflows`: every failure is reported.
///
/// Elements that parse but lack a required field are dropped, not errors.
pub fn try_parse_workflows(response: &str) -> PortResult<Vec<WorkflowDraft>> {
    let mut text = response.trim().to_string();

    if text.starts_with("```") {
        text = fence_pattern().replace_all(&text, "").into_owned();
    }

    let json = array_pattern()
        .find(&text)
        .map(|m| m.as_str())
        .unwrap_or(text.as_str());

    let value: Value =
        serde_json::from_str(json).map_err(|e| PortError::Format(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(PortError::Format("response is not an array".to_string()));
    };

    Ok(items.iter().filter_map(draft_from_value).collect())
}

fn draft_from_value(value: &Value) -> Option<WorkflowDraft> {
    let object = value.as_object()?;
    let present = REQUIRED_FIELDS.iter().all(|field| match object.get(*field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    });
    if !present {
        return None;
    }

    Some(WorkflowDraft {
        title: object.get("title")?.as_str()?.to_string(),
        description: object.get("description")?.as_str()?.to_string(),
        category: Category::from(object.get("category")?.as_str()?),
        tools: string_list(object.get("tools")?)?,
        steps: string_list(object.get("steps")?)?,
        estimated_time: object
            .get("estimatedTime")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        difficulty: object
            .get("difficulty")
            .and_then(Value::as_str)
            .map(|d| Difficulty::from(d.to_string()))
            .unwrap_or_default(),
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// The fixed workflows shown whenever generation or parsing fails.
pub fn fallback_workflows() -> Vec<WorkflowDraft> {
    fn draft(
        title: &str,
        description: &str,
        category: Category,
        tools: &[&str],
        steps: &[&str],
        estimated_time: &str,
        difficulty: Difficulty,
    ) -> WorkflowDraft {
        WorkflowDraft {
            title: title.to_string(),
            description: description.to_string(),
            category,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            estimated_time: estimated_time.to_string(),
            difficulty,
        }
    }

    vec![
        draft(
            "Smart Email Digest Creator",
            "Analyzes your email patterns and creates intelligent summaries of important messages. Groups by topic and priority.",
            Category::Automation,
            &["Python", "Email API", "NLP", "TextBlob"],
            &[
                "Connect to email inbox",
                "Analyze recent emails",
                "Categorize by topic and importance",
                "Generate summary digest",
                "Present formatted results",
            ],
            "1-2 minutes",
            Difficulty::Medium,
        ),
        draft(
            "Research Paper Summarizer",
            "Takes academic papers or articles and generates concise, structured summaries with key findings and methodology.",
            Category::Research,
            &["Python", "PDF Parser", "NLP", "Gemini API"],
            &[
                "Upload or fetch research paper",
                "Extract text and structure",
                "Identify key sections",
                "Generate intelligent summary",
                "Create citation reference",
            ],
            "2-3 minutes",
            Difficulty::Easy,
        ),
        draft(
            "Code Documentation Generator",
            "Analyzes your codebase and automatically generates comprehensive documentation with examples and usage guides.",
            Category::CodeGeneration,
            &["Python", "AST Parser", "Markdown", "Gemini API"],
            &[
                "Scan code files",
                "Parse functions and classes",
                "Generate descriptions",
                "Create usage examples",
                "Format as documentation",
            ],
            "3-5 minutes",
            Difficulty::Medium,
        ),
    ]
}
