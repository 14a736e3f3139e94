mod common;

use agentstream_core::workflows::DESIGNER_SYSTEM_INSTRUCTION;
use agentstream_core::{
    AuthManager, ExecutionProgress, ExecutionStatus, FeedConfig, FeedPreference, FeedSession,
    GenerationRequest, PortError, Storage, TextGenerationService, WorkflowManager,
};
use common::{workflow, StubGenerator, THREE_WORKFLOWS};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn setup(generator: StubGenerator) -> (Storage, Arc<StubGenerator>, WorkflowManager) {
    let storage = Storage::in_memory();
    let generator = Arc::new(generator);
    let manager = WorkflowManager::new(storage.clone(), generator.clone(), 30);
    (storage, generator, manager)
}

#[tokio::test]
async fn fresh_login_then_stock_feed() {
    let (storage, generator, manager) =
        setup(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));
    let mut auth = AuthManager::new(storage.clone());

    let profile = auth.login_with_credential("AIza-test").unwrap();
    let batch = manager
        .generate_workflows(Some(&profile.id), 3, false, None)
        .await
        .unwrap();

    let feed = manager.current_workflows();
    assert_eq!(batch.len(), 3);
    assert_eq!(feed, batch);
    let ids: HashSet<&str> = feed.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(feed.iter().all(|w| !w.id.is_empty()));
    assert_eq!(feed[0].title, "Inbox Zero Bot");
    assert!(manager.can_load_more());
    assert!(!manager.is_generating());

    let requests = generator.requests.lock().unwrap();
    assert_eq!(
        requests[0].system_instruction.as_deref(),
        Some(DESIGNER_SYSTEM_INSTRUCTION)
    );
    assert!(requests[0].prompt.starts_with("Generate 3 diverse"));
}

#[tokio::test]
async fn batches_accumulate_but_only_new_batch_is_returned() {
    let (_, _, manager) = setup(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));

    let first = manager.generate_workflows(None, 3, false, None).await.unwrap();
    let second = manager.generate_workflows(None, 3, false, None).await.unwrap();

    assert_eq!(second.len(), 3);
    assert_ne!(first[0].id, second[0].id);
    assert_eq!(manager.current_workflows().len(), 6);
}

#[tokio::test]
async fn network_failure_degrades_to_fallback_set() {
    let (_, _, manager) = setup(StubGenerator::replying(Err(PortError::Network(
        "connection refused".to_string(),
    ))));

    let batch = manager.generate_workflows(None, 3, false, None).await.unwrap();

    let titles: Vec<&str> = batch.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Smart Email Digest Creator",
            "Research Paper Summarizer",
            "Code Documentation Generator"
        ]
    );
    assert!(!manager.is_generating());
}

#[tokio::test]
async fn feed_cannot_grow_while_a_batch_is_generating() {
    let (_, _, manager) = setup(StubGenerator::delayed(
        Ok(THREE_WORKFLOWS.to_string()),
        Duration::from_millis(200),
    ));
    let manager = Arc::new(manager);
    assert!(manager.can_load_more());

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.generate_workflows(None, 3, false, None).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(manager.is_generating());
    assert!(!manager.can_load_more());

    task.await.unwrap().unwrap();
    assert!(!manager.is_generating());
    assert!(manager.can_load_more());
}

#[tokio::test]
async fn personalized_mode_uses_saved_workflow_signals() {
    let (storage, generator, manager) =
        setup(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));
    storage.save_workflow("p1", &workflow("1", "Research", &["NLP", "Python"]));
    storage.save_workflow("p1", &workflow("2", "Automation", &["Python"]));
    storage.save_workflow("p1", &workflow("3", "Research", &["Pandas"]));

    manager
        .generate_workflows(Some("p1"), 3, true, None)
        .await
        .unwrap();

    let prompt = generator.last_prompt();
    assert!(prompt.contains("User's favorite categories: Research, Automation\n"));
    assert!(prompt.contains("Commonly used tools: Python, NLP, Pandas\n"));
    assert!(prompt.contains("\"Saved 1\""));
}

#[tokio::test]
async fn personalized_mode_without_saved_workflows_uses_stock_prompt() {
    let (_, generator, manager) = setup(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));

    manager
        .generate_workflows(Some("p1"), 3, true, None)
        .await
        .unwrap();

    assert!(generator.last_prompt().starts_with("Generate 3 diverse"));
}

#[tokio::test]
async fn execution_reports_progress_and_records_history() {
    let (storage, _, manager) = setup(StubGenerator::streaming(vec![
        Ok("Step 1: Gather input\n".to_string()),
        Ok("Done gathering.\nStep 2: Process\n".to_string()),
        Ok("Step 3: Report\nAll good.".to_string()),
    ]));
    let wf = workflow("w1", "Research", &["Python"]);
    let reports: Mutex<Vec<ExecutionProgress>> = Mutex::new(Vec::new());
    let record = |p: &ExecutionProgress| reports.lock().unwrap().push(p.clone());

    let result = manager
        .execute_workflow(Some("p1"), &wf, Some(&record), None)
        .await
        .unwrap();

    let reports = reports.into_inner().unwrap();
    let steps: Vec<usize> = reports.iter().map(|r| r.current_step).collect();
    assert_eq!(steps, vec![1, 2, 3]);
    assert!(reports.iter().all(|r| r.total_steps == 3));
    assert!(reports.iter().all(|r| r.status == ExecutionStatus::Running));
    assert_eq!(reports[2].content, result.results);

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.results.ends_with("All good."));
    assert_eq!(result.workflow.id, "w1");

    let history = storage.history("p1");
    assert_eq!(history.len(), 1);
    assert!(history[0].executed_at.is_some());
    assert_eq!(manager.executing_workflow_id(), None);
}

#[tokio::test]
async fn execution_errors_propagate_without_history() {
    let (storage, _, manager) = setup(StubGenerator::streaming(vec![
        Ok("Step 1: start".to_string()),
        Err(PortError::Network("stream reset".to_string())),
    ]));
    let wf = workflow("w1", "Research", &["Python"]);

    let result = manager.execute_workflow(Some("p1"), &wf, None, None).await;

    assert_eq!(result, Err(PortError::Network("stream reset".to_string())));
    assert!(storage.history("p1").is_empty());
}

#[tokio::test]
async fn cancelling_execution_aborts_the_stream() {
    let (storage, _, manager) = setup(StubGenerator::stalling(vec![Ok(
        "Step 1: start".to_string()
    )]));
    let manager = Arc::new(manager);
    let wf = workflow("w1", "Research", &["Python"]);
    let token = CancellationToken::new();

    let task = {
        let manager = manager.clone();
        let token = token.clone();
        tokio::spawn(async move {
            manager
                .execute_workflow(Some("p1"), &wf, None, Some(&token))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.executing_workflow_id().as_deref(), Some("w1"));
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("cancelled execution should finish promptly")
        .unwrap();
    assert_eq!(result, Err(PortError::Cancelled));
    assert!(storage.history("p1").is_empty());
    assert_eq!(manager.executing_workflow_id(), None);
}

#[tokio::test]
async fn streaming_callback_sees_fragments_in_order() {
    let generator = StubGenerator::streaming(vec![
        Ok("Hel".to_string()),
        Ok("lo".to_string()),
        Ok(", world".to_string()),
    ]);
    let mut seen = Vec::new();

    let full = generator
        .generate_streaming(&GenerationRequest::new("hi"), &mut |fragment, so_far| {
            seen.push((fragment.to_string(), so_far.to_string()));
        })
        .await
        .unwrap();

    assert_eq!(full, "Hello, world");
    assert_eq!(
        seen,
        vec![
            ("Hel".to_string(), "Hel".to_string()),
            ("lo".to_string(), "Hello".to_string()),
            (", world".to_string(), "Hello, world".to_string()),
        ]
    );
}

#[tokio::test]
async fn feed_session_paginates_up_to_the_maximum() {
    let storage = Storage::in_memory();
    let generator = Arc::new(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));
    let config = FeedConfig {
        max_workflows: 6,
        ..FeedConfig::default()
    };
    let mut session = FeedSession::new(storage, generator, config);
    assert_eq!(session.manager().max_workflows(), 6);

    assert_eq!(session.load_initial(None, None).await.unwrap().len(), 3);
    assert!(session.load_more(None, None).await.unwrap().is_some());
    assert_eq!(session.manager().current_workflows().len(), 6);
    assert!(session.load_more(None, None).await.unwrap().is_none());

    assert!(session.refresh(None, None).await.unwrap().is_some());
    assert_eq!(session.manager().current_workflows().len(), 3);
    assert!(session.refresh(None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn feed_session_follows_stored_preference() {
    let storage = Storage::in_memory();
    let generator = Arc::new(StubGenerator::replying(Ok(THREE_WORKFLOWS.to_string())));
    let mut session = FeedSession::new(storage.clone(), generator.clone(), FeedConfig::default());

    storage.save_workflow("p1", &workflow("1", "Research", &["NLP"]));
    storage.set_feed_preference("p1", FeedPreference::Personalized);

    session.load_initial(Some("p1"), None).await.unwrap();

    assert!(generator.last_prompt().contains("personalized AI agent workflows"));
}
