use agentstream_core::{
    Category, Difficulty, GenerationRequest, PortResult, TextGenerationService, TextStream,
    Workflow,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Mutex;
use std::time::Duration;

pub const THREE_WORKFLOWS: &str = r#"[
  {"title": "Inbox Zero Bot", "description": "Sorts mail.", "category": "Automation", "tools": ["Python", "Email API"], "steps": ["Fetch", "Sort", "Archive"], "estimatedTime": "2 minutes", "difficulty": "easy"},
  {"title": "Price Watcher", "description": "Tracks prices.", "category": "Web Scraping", "tools": ["Python", "Requests"], "steps": ["Scrape", "Compare"], "estimatedTime": "1 minute", "difficulty": "medium"},
  {"title": "Paper Digest", "description": "Summarizes papers.", "category": "Research", "tools": ["NLP"], "steps": ["Read", "Summarize"], "estimatedTime": "3 minutes", "difficulty": "hard"}
]"#;

/// A scripted `TextGenerationService` that records every request it sees.
pub struct StubGenerator {
    response: PortResult<String>,
    fragments: Vec<PortResult<String>>,
    hang_after_fragments: bool,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

#[allow(dead_code)]
impl StubGenerator {
    pub fn replying(response: PortResult<String>) -> Self {
        Self {
            response,
            fragments: Vec::new(),
            hang_after_fragments: false,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn streaming(fragments: Vec<PortResult<String>>) -> Self {
        Self {
            fragments,
            ..Self::replying(Ok(String::new()))
        }
    }

    /// Streams `fragments` and then never finishes.
    pub fn stalling(fragments: Vec<PortResult<String>>) -> Self {
        Self {
            hang_after_fragments: true,
            ..Self::streaming(fragments)
        }
    }

    /// Answers one-shot requests with `response` after waiting `delay`.
    pub fn delayed(response: PortResult<String>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(response)
        }
    }

    pub fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerationService for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }

    async fn stream_content(&self, request: &GenerationRequest) -> PortResult<TextStream> {
        self.requests.lock().unwrap().push(request.clone());
        let fragments = stream::iter(self.fragments.clone());
        if self.hang_after_fragments {
            Ok(fragments.chain(stream::pending()).boxed())
        } else {
            Ok(fragments.boxed())
        }
    }
}

#[allow(dead_code)]
pub fn workflow(id: &str, category: &str, tools: &[&str]) -> Workflow {
    Workflow {
        id: id.to_string(),
        title: format!("Saved {id}"),
        description: "A saved workflow.".to_string(),
        category: Category::from(category),
        tools: tools.iter().map(|t| t.to_string()).collect(),
        steps: vec![
            "Gather input".to_string(),
            "Process".to_string(),
            "Report".to_string(),
        ],
        estimated_time: "2 minutes".to_string(),
        difficulty: Difficulty::Medium,
        generated_at: Utc::now(),
        saved_at: None,
        executed_at: None,
    }
}
