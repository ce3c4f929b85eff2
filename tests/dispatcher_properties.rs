//! Behavioural tests for the dispatcher.
//!
//! These drive the dispatcher directly, without the protocol layer, and
//! check the guarantees callers rely on: stable task identities, error
//! classification and snapshot consistency.

use std::path::Path;

use serde_json::{json, Value};

use mcp_learning_server::error::DispatchError;
use mcp_learning_server::mcp::dispatcher::{Dispatcher, DispatcherBuilder, Operation};
use mcp_learning_server::resources::{ResourceDescriptor, TASKS_URI};
use mcp_learning_server::tasks::TaskStore;
use mcp_learning_server::tools::builtin_tools;

fn dispatcher(notes_dir: &Path) -> Dispatcher {
    Dispatcher::builder()
        .register_builtin_tools()
        .and_then(|b| b.register_builtin_resources(notes_dir))
        .and_then(DispatcherBuilder::register_builtin_prompts)
        .unwrap()
        .build()
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

async fn call(dispatcher: &mut Dispatcher, name: &str, arguments: Value) -> Value {
    dispatcher
        .dispatch(Operation::CallTool {
            name: name.to_string(),
            arguments,
        })
        .await
        .unwrap()
}

// =============================================================================
// Task Tools
// =============================================================================

#[tokio::test]
async fn add_task_ids_are_unique_and_increasing() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher(temp.path());

    let mut ids = Vec::new();
    for title in ["a", "b", "c", "d"] {
        let result = call(&mut dispatcher, "add_task", json!({ "title": title })).await;
        let id: u64 = text(&result).rsplit(' ').next().unwrap().parse().unwrap();
        ids.push(id);
    }
    assert_eq!(ids, [1, 2, 3, 4]);

    let listed = call(&mut dispatcher, "list_tasks", json!({})).await;
    assert!(text(&listed).contains("⏳ [4] d"));
}

#[tokio::test]
async fn interleaved_add_and_list_never_lose_tasks() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher(temp.path());

    for n in 1..=20 {
        call(&mut dispatcher, "add_task", json!({ "title": format!("task {n}") })).await;
        let listed = call(&mut dispatcher, "list_tasks", Value::Null).await;
        let lines = text(&listed).lines().filter(|l| l.contains('[')).count();
        assert_eq!(lines, n);
    }
    assert_eq!(dispatcher.store().len(), 20);
}

#[tokio::test]
async fn complete_unknown_then_twice() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher(temp.path());

    let err = dispatcher
        .call_tool("complete_task", &json!({"task_id": 1}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::TaskNotFound { id: 1 }));

    let negative = call(&mut dispatcher, "complete_task", json!({"task_id": -1})).await;
    assert_eq!(negative["isError"], true);
    assert_eq!(text(&negative), "Task with ID -1 not found.");

    call(&mut dispatcher, "add_task", json!({"title": "once"})).await;
    let first = call(&mut dispatcher, "complete_task", json!({"task_id": 1})).await;
    let second = call(&mut dispatcher, "complete_task", json!({"task_id": 1})).await;

    assert!(first.get("isError").is_none());
    assert!(second.get("isError").is_none());
    assert!(dispatcher.store().get(1).unwrap().completed);
}

// =============================================================================
// Calculator
// =============================================================================

#[tokio::test]
async fn calculate_results_and_domain_errors() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher(temp.path());

    let sum = call(
        &mut dispatcher,
        "calculate",
        json!({"operation": "add", "a": 2, "b": 3}),
    )
    .await;
    assert_eq!(text(&sum), "2 + 3 = 5");

    let divide = call(
        &mut dispatcher,
        "calculate",
        json!({"operation": "divide", "a": 10, "b": 0}),
    )
    .await;
    assert_eq!(divide["isError"], true);

    let err = dispatcher
        .call_tool("calculate", &json!({"operation": "modulo", "a": 1, "b": 2}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidArguments { .. }));
}

// =============================================================================
// Resources
// =============================================================================

#[tokio::test]
async fn task_snapshot_matches_store_size() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = Dispatcher::builder()
        .task_store(TaskStore::with_sample_tasks())
        .register_builtin_tools()
        .and_then(|b| b.register_builtin_resources(temp.path()))
        .unwrap()
        .build();

    call(&mut dispatcher, "add_task", json!({"title": "fourth"})).await;

    let read = dispatcher.read_resource(TASKS_URI).await.unwrap();
    let snapshot: Value = serde_json::from_str(&read.contents[0].text).unwrap();
    assert_eq!(snapshot.as_array().unwrap().len(), dispatcher.store().len());
    assert_eq!(snapshot[3]["id"], 4);
}

// =============================================================================
// Registries
// =============================================================================

#[tokio::test]
async fn unregistered_names_are_reported() {
    let temp = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher(temp.path());

    let tool = dispatcher
        .dispatch(Operation::CallTool {
            name: "unknown".to_string(),
            arguments: Value::Null,
        })
        .await
        .unwrap_err();
    assert!(matches!(tool, DispatchError::UnknownTool { .. }));

    let prompt = dispatcher
        .dispatch(Operation::GetPrompt {
            name: "unknown".to_string(),
            arguments: Value::Null,
        })
        .await
        .unwrap_err();
    assert!(matches!(prompt, DispatchError::UnknownPrompt { .. }));

    let resource = dispatcher
        .dispatch(Operation::ReadResource {
            uri: "unknown://".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(resource, DispatchError::UnknownResource { .. }));
}

#[test]
fn duplicate_registrations_fail_at_build_time() {
    let tool = builtin_tools().remove(0);
    assert!(Dispatcher::builder()
        .register_builtin_tools()
        .and_then(|b| b.register_tool(tool))
        .is_err());

    assert!(Dispatcher::builder()
        .register_resource(ResourceDescriptor::task_database())
        .and_then(|b| b.register_resource(ResourceDescriptor::task_database()))
        .is_err());
}

#[test]
fn listings_keep_registration_order() {
    let temp = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(temp.path());

    let tools: Vec<String> = dispatcher.list_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(
        tools,
        ["add_task", "list_tasks", "complete_task", "get_weather", "calculate", "evaluate"]
    );

    let prompts: Vec<String> = dispatcher
        .list_prompts()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(prompts, ["task_summary", "learning_plan", "explain_concept"]);
}
