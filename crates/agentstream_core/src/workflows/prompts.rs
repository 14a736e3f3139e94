//! crates/agentstream_core/src/workflows/prompts.rs
//!
//! Prompt templates sent to the text-generation endpoint.

use crate::domain::{Category, CategoryRank, Workflow};

pub const DESIGNER_SYSTEM_INSTRUCTION: &str = r#"You are an AI workflow designer for AgentStream.
Your job is to create diverse, creative, and practical AI agent workflows that leverage Gemini's capabilities.
Each workflow should be unique and actionable, combining various tools, libraries, and APIs.
Return workflows in valid JSON format only, no additional text."#;

pub const EXECUTOR_SYSTEM_INSTRUCTION: &str = r#"You are an AI agent executing workflows.
Provide clear, step-by-step execution with code examples, results, and explanations.
Be practical and actionable."#;

const STOCK_TEMPLATE: &str = r#"Generate {count} diverse AI agent workflows as JSON array. Each workflow should include:
- title: catchy, descriptive name
- description: clear explanation of what it does (2-3 sentences)
- category: one of [{categories}]
- tools: array of technologies/libraries used (e.g., Python, APIs, libraries)
- steps: array of 3-5 execution steps with clear descriptions
- estimatedTime: estimated execution time
- difficulty: easy, medium, or hard

Make workflows diverse across categories. Include workflows for:
- Web scraping and data extraction
- Document analysis and summarization
- Automation tasks
- Research and information gathering
- Creative content generation
- Code generation and debugging
- Data analysis and visualization
- API integrations
- File processing
- And other creative applications

Return ONLY valid JSON array, no markdown or extra text.
Example format:
[
  {
    "title": "Smart News Aggregator",
    "description": "Scrapes top tech news from multiple sources, analyzes sentiment, and creates a personalized digest. Uses NLP to categorize and rank articles by relevance.",
    "category": "Research",
    "tools": ["Python", "BeautifulSoup", "Newspaper3k", "TextBlob", "Google Search API"],
    "steps": [
      "Search for tech news from specified sources",
      "Extract article content and metadata",
      "Analyze sentiment and relevance",
      "Generate personalized digest",
      "Format and present results"
    ],
    "estimatedTime": "2-3 minutes",
    "difficulty": "medium"
  }
]"#;

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_stock_prompt(count: usize) -> String {
    STOCK_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{categories}", &category_list())
}

/// Builds the prompt biased towards the top 3 categories and top 5 tools.
pub fn build_personalized_prompt(
    count: usize,
    categories: &[CategoryRank],
    tools: &[String],
    saved: &[Workflow],
) -> String {
    let top_categories = categories
        .iter()
        .take(3)
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let top_tools = tools
        .iter()
        .take(5)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let saved_titles = saved
        .iter()
        .map(|w| format!("\"{}\"", w.title))
        .collect::<Vec<_>>()
        .join(", ");

    // Saved titles come from model output; each value is interpolated once,
    // so braces inside them are never read as placeholders.
    format!(
        r#"Generate {count} personalized AI agent workflows based on user preferences.

User's favorite categories: {top_categories}
Commonly used tools: {top_tools}
Previously saved workflows (do NOT repeat these or produce near-duplicates): {saved_titles}

Generate workflows that:
1. Focus primarily on these categories but include some variety
2. Leverage these tools where appropriate
3. Introduce new related tools and techniques
4. Are similar in spirit but NOT identical to past workflows
5. Gradually increase in complexity and capability

Return workflows as JSON array with same structure:
- title: catchy, descriptive name
- description: clear explanation (2-3 sentences)
- category: one of [{categories}]
- tools: array of technologies/libraries
- steps: array of 3-5 execution steps
- estimatedTime: estimated time
- difficulty: easy, medium, or hard

Make 60% of workflows align with user preferences, 40% explore new areas.
Return ONLY valid JSON array, no markdown or extra text."#,
        categories = category_list(),
    )
}

pub fn build_execution_prompt(workflow: &Workflow) -> String {
    let steps = workflow
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Execute this workflow step by step:

Title: {title}
Description: {description}
Tools: {tools}

Steps:
{steps}

For each step:
1. Explain what you're doing
2. Show the process or code
3. Present the results

Be practical and show actual implementation details."#,
        title = workflow.title,
        description = workflow.description,
        tools = workflow.tools.join(", "),
    )
}
