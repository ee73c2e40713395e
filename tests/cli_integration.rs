//! CLI integration tests for taskgraph
//!
//! These tests verify the complete workflow from initialization through
//! task and dependency management to the annotated graph.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the taskgraph binary
fn taskgraph_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("taskgraph"))
}

/// Create a temporary directory and initialize a taskgraph project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

fn add_task(dir: &TempDir, id: &str, hours: f64) {
    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", id, "--hours", &hours.to_string()])
        .assert()
        .success();
}

fn add_dep(dir: &TempDir, task: &str, depends_on: &str) {
    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", task, depends_on])
        .assert()
        .success();
}

/// A(1) -> B(2), C(3) -> D(1)
fn setup_diamond() -> TempDir {
    let dir = setup_project();
    add_task(&dir, "A", 1.0);
    add_task(&dir, "B", 2.0);
    add_task(&dir, "C", 3.0);
    add_task(&dir, "D", 1.0);
    add_dep(&dir, "B", "A");
    add_dep(&dir, "C", "A");
    add_dep(&dir, "D", "B");
    add_dep(&dir, "D", "C");
    dir
}

fn json_stdout(assert: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    serde_json::from_str(stdout.trim()).unwrap()
}

fn find_node<'a>(graph: &'a serde_json::Value, id: &str) -> &'a serde_json::Value {
    graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == id)
        .unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized taskgraph project"));

    assert!(dir.path().join(".taskgraph").is_dir());
    assert!(dir.path().join(".taskgraph/config.toml").is_file());
    assert!(dir.path().join(".taskgraph/.gitignore").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_commands_require_project() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a taskgraph project"));
}

// =============================================================================
// Task Tests
// =============================================================================

#[test]
fn test_task_add_and_list() {
    let dir = setup_project();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "design", "--hours", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task design"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "review"])
        .assert()
        .success();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("design"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_task_add_rejects_duplicate() {
    let dir = setup_project();
    add_task(&dir, "design", 4.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "design"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task already exists"));
}

#[test]
fn test_task_status_and_estimate() {
    let dir = setup_project();
    add_task(&dir, "design", 4.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "design", "in-progress"])
        .assert()
        .success();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "estimate", "design", "6"])
        .assert()
        .success();

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "list", "--format", "json"])
        .assert()
        .success();
    let tasks = json_stdout(&assert);

    assert_eq!(tasks[0]["status"], "in_progress");
    assert_eq!(tasks[0]["duration_hours"].as_f64(), Some(6.0));
}

#[test]
fn test_task_estimate_rejects_non_positive() {
    let dir = setup_project();
    add_task(&dir, "design", 4.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "estimate", "design", "0"])
        .assert()
        .failure();
}

#[test]
fn test_task_status_unknown_task() {
    let dir = setup_project();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "ghost", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found"));
}

// =============================================================================
// Dependency Tests
// =============================================================================

#[test]
fn test_dep_add_and_list() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "b", "a", "--type", "subtask"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b now depends on a"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("subtask"));
}

#[test]
fn test_dep_add_twice_is_noop() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);
    add_dep(&dir, "b", "a");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "b", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already depends on"));

    let content = fs::read_to_string(dir.path().join(".taskgraph/dependencies.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_dep_add_rejects_cycle() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);
    add_task(&dir, "c", 1.0);
    add_dep(&dir, "b", "a");
    add_dep(&dir, "c", "b");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "a", "c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("would create a cycle"));
}

#[test]
fn test_dep_add_rejects_self_dependency() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "a", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Self-dependency"));
}

#[test]
fn test_dep_add_rejects_unknown_task() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "a", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found: ghost"));
}

#[test]
fn test_dep_remove() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);
    add_dep(&dir, "b", "a");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "remove", "b", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no longer depends on"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["dep", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependencies."));
}

// =============================================================================
// Graph Tests
// =============================================================================

#[test]
fn test_graph_json_schedule() {
    let dir = setup_diamond();

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["graph", "--format", "json"])
        .assert()
        .success();
    let graph = json_stdout(&assert);

    assert_eq!(graph["project_end"].as_f64(), Some(5.0));
    assert_eq!(graph["critical_path"], serde_json::json!(["A", "C", "D"]));

    let expected = [
        ("A", 0.0, 0.0, 0, true),
        ("B", 1.0, 2.0, 1, false),
        ("C", 1.0, 1.0, 1, true),
        ("D", 4.0, 4.0, 2, true),
    ];
    for (id, es, ls, level, critical) in expected {
        let node = find_node(&graph, id);
        assert_eq!(node["earliest_start"].as_f64(), Some(es), "{}", id);
        assert_eq!(node["latest_start"].as_f64(), Some(ls), "{}", id);
        assert_eq!(node["level"].as_u64(), Some(level), "{}", id);
        assert_eq!(node["is_critical"].as_bool(), Some(critical), "{}", id);
    }

    let edges = graph["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 4);
    let a_to_b = edges
        .iter()
        .find(|e| e["from"] == "A" && e["to"] == "B")
        .unwrap();
    assert_eq!(a_to_b["is_critical"].as_bool(), Some(false));
    let a_to_c = edges
        .iter()
        .find(|e| e["from"] == "A" && e["to"] == "C")
        .unwrap();
    assert_eq!(a_to_c["is_critical"].as_bool(), Some(true));
}

#[test]
fn test_graph_text_output() {
    let dir = setup_diamond();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["graph", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical path: A -> C -> D"))
        .stdout(predicate::str::contains("Project end:   5h"));
}

#[test]
fn test_graph_uses_cache_file() {
    let dir = setup_diamond();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success();

    assert!(dir.path().join(".taskgraph/cache/graph.json").is_file());
}

#[test]
fn test_cache_clear() {
    let dir = setup_diamond();
    let cache_file = dir.path().join(".taskgraph/cache/graph.json");

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success();
    assert!(cache_file.is_file());

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph cache cleared"));
    assert!(!cache_file.exists());

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["cache", "clear", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cleared\":false"));
}

#[test]
fn test_graph_marks_blocking_edges() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);
    add_dep(&dir, "b", "a");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "b", "blocked"])
        .assert()
        .success();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("BLOCKING"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "a", "completed"])
        .assert()
        .success();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("BLOCKING").not());
}

#[test]
fn test_graph_empty_project() {
    let dir = setup_project();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks."));
}

#[test]
fn test_graph_with_cycle_in_store_degrades() {
    let dir = setup_project();
    add_task(&dir, "a", 1.0);
    add_task(&dir, "b", 1.0);

    // Edited by hand, bypassing validation
    fs::write(
        dir.path().join(".taskgraph/dependencies.jsonl"),
        "{\"task_id\":\"a\",\"depends_on_task_id\":\"b\"}\n{\"task_id\":\"b\",\"depends_on_task_id\":\"a\"}\n",
    )
    .unwrap();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("graph")
        .assert()
        .success()
        .stderr(predicate::str::contains("Dependency cycle detected"))
        .stdout(predicate::str::contains("BLOCKED BY"));

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["graph", "--format", "json"])
        .assert()
        .success();
    let value = json_stdout(&assert);
    assert_eq!(value["error"]["kind"], "cycle_detected");
    assert_eq!(value["error"]["cycle"].as_array().unwrap().len(), 2);
    assert_eq!(value["outline"]["nodes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_critical_command() {
    let dir = setup_diamond();

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["critical", "--format", "json"])
        .assert()
        .success();
    let value = json_stdout(&assert);

    assert_eq!(value["critical_path"], serde_json::json!(["A", "C", "D"]));
    assert_eq!(value["project_end"].as_f64(), Some(5.0));
}

#[test]
fn test_project_epsilon_from_config() {
    let dir = setup_diamond();
    fs::write(
        dir.path().join(".taskgraph/config.toml"),
        "[schedule]\ncritical_epsilon = 1.5\n",
    )
    .unwrap();

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["critical", "--format", "json"])
        .assert()
        .success();
    let value = json_stdout(&assert);

    assert_eq!(value["critical_path"], serde_json::json!(["A", "B", "C", "D"]));
}

// =============================================================================
// Annotate Tests
// =============================================================================

const DIAMOND_DOC: &str = r#"{
  "tasks": [
    {"id": "A", "estimated_hours": 1},
    {"id": "B", "estimated_hours": 2},
    {"id": "C", "estimated_hours": 3},
    {"id": "D", "estimated_hours": 1, "status": "blocked"}
  ],
  "dependencies": [
    {"task_id": "B", "depends_on_task_id": "A"},
    {"task_id": "C", "depends_on_task_id": "A"},
    {"task_id": "D", "depends_on_task_id": "B"},
    {"task_id": "D", "depends_on_task_id": "C"},
    {"task_id": "D", "depends_on_task_id": "ghost"}
  ]
}"#;

#[test]
fn test_annotate_from_stdin() {
    let dir = TempDir::new().unwrap();

    let assert = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["annotate", "-", "--format", "json"])
        .write_stdin(DIAMOND_DOC)
        .assert()
        .success();
    let graph = json_stdout(&assert);

    assert_eq!(graph["project_end"].as_f64(), Some(5.0));
    assert_eq!(graph["critical_path"], serde_json::json!(["A", "C", "D"]));
    assert_eq!(graph["edges"].as_array().unwrap().len(), 4);
    assert!(graph["edges"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["to"] == "D")
        .all(|e| e["is_blocking"].as_bool() == Some(true)));
}

#[test]
fn test_annotate_from_file_with_epsilon() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    fs::write(&path, DIAMOND_DOC).unwrap();

    let assert = taskgraph_cmd()
        .args(["annotate", path.to_str().unwrap(), "--epsilon", "1.5", "--format", "json"])
        .assert()
        .success();
    let graph = json_stdout(&assert);

    assert_eq!(graph["critical_path"], serde_json::json!(["A", "B", "C", "D"]));
}

#[test]
fn test_annotate_rejects_negative_epsilon() {
    taskgraph_cmd()
        .args(["annotate", "-", "--epsilon=-1"])
        .write_stdin(DIAMOND_DOC)
        .assert()
        .failure()
        .stderr(predicate::str::contains("critical_epsilon"));
}

#[test]
fn test_annotate_cycle_warns() {
    let doc = r#"{
      "tasks": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
      "dependencies": [
        {"task_id": "b", "depends_on_task_id": "a"},
        {"task_id": "c", "depends_on_task_id": "b"},
        {"task_id": "a", "depends_on_task_id": "c"}
      ]
    }"#;

    taskgraph_cmd()
        .args(["annotate", "-"])
        .write_stdin(doc)
        .assert()
        .success()
        .stderr(predicate::str::contains("Dependency cycle detected"));
}

#[test]
fn test_annotate_drops_edges_with_blank_ids() {
    let doc = r#"{
      "tasks": [{"id": "a", "estimated_hours": 2}, {"id": "b"}],
      "dependencies": [
        {"task_id": "b", "depends_on_task_id": "a"},
        {"task_id": "b", "depends_on_task_id": ""}
      ]
    }"#;

    let assert = taskgraph_cmd()
        .args(["annotate", "-", "--format", "json"])
        .write_stdin(doc)
        .assert()
        .success();
    let graph = json_stdout(&assert);

    assert_eq!(graph["edges"].as_array().unwrap().len(), 1);
    assert_eq!(graph["project_end"].as_f64(), Some(3.0));
}

#[test]
fn test_annotate_invalid_json() {
    taskgraph_cmd()
        .args(["annotate", "-"])
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse graph document"));
}
